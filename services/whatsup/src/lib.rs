//! whatsup - HTTP endpoint uptime checks
//!
//! Probes configured endpoints, compares each status with the last
//! persisted one, and notifies webhook channels only when it changed.

pub mod config;
pub mod detector;
pub mod dispatcher;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod io;
pub mod notifier;
pub mod prober;
pub mod store;
pub mod webhook;

pub use config::{load_config, Config};
pub use engine::{Engine, RunSummary};
pub use error::{Result, WhatsupError};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::StateConfig;
use crate::dispatcher::Dispatcher;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::store::{FileStateStore, MemoryStateStore, StateStore};

/// Build an engine with the HTTP client, state store and channels the
/// configuration describes
pub fn build_engine(config: &Config) -> Result<Engine> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(
        config.run.probe_timeout(),
        config.run.webhook_timeout(),
    )?);

    let store: Arc<dyn StateStore> = match &config.state {
        StateConfig::File { path, .. } => {
            let store = FileStateStore::new(path);
            tracing::info!("Persisting endpoint status to {:?}", store.path());
            Arc::new(store)
        }
        StateConfig::Memory { .. } => {
            tracing::warn!("Using in-memory state; status will not survive a restart");
            Arc::new(MemoryStateStore::new())
        }
    };

    let dispatcher = Dispatcher::new(&config.notification, Arc::clone(&http));
    tracing::debug!(
        "Engine built: {} endpoints, {} of {} channels active",
        config.endpoints.len(),
        dispatcher.active_channels(),
        config.notification.len()
    );

    Ok(Engine::new(store, http, dispatcher)
        .with_namespace(config.state.namespace())
        .with_max_concurrency(config.run.max_concurrency))
}

/// Check every configured endpoint once
pub async fn run_once(config: &Config) -> Result<RunSummary> {
    let engine = build_engine(config)?;
    let summary = engine.run_once(&config.endpoints).await;
    log_summary(&summary);
    Ok(summary)
}

/// Check every configured endpoint every `interval` until `cancel` fires.
///
/// A run in progress is allowed to finish; cancellation takes effect
/// between runs.
pub async fn run_scheduled<F>(
    config: &Config,
    interval: Duration,
    cancel: CancellationToken,
    mut on_summary: F,
) -> Result<()>
where
    F: FnMut(&RunSummary),
{
    let engine = build_engine(config)?;
    tracing::info!("Checking {} endpoints every {:?}", config.endpoints.len(), interval);

    loop {
        let summary = engine.run_once(&config.endpoints).await;
        log_summary(&summary);
        on_summary(&summary);

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.cancelled() => {
                tracing::debug!("Schedule cancelled");
                break;
            }
        }
    }

    Ok(())
}

fn log_summary(summary: &RunSummary) {
    tracing::info!("Run complete: {}", summary);
    let failed_notifications = summary.failed_notifications();
    if failed_notifications > 0 {
        tracing::warn!("{} notifications could not be delivered", failed_notifications);
    }
}
