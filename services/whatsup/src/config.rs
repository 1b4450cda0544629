//! Configuration types for the whatsup service

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointSpec;
use crate::prober::StatusObservation;
use crate::store::DEFAULT_NAMESPACE;
use crate::WhatsupError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
    #[serde(default)]
    pub notification: Vec<NotificationChannel>,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// An outbound notification channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    #[serde(rename = "type")]
    pub kind: String,
    pub message_down: String,
    pub message_up: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub webhook: Option<String>,
}

impl NotificationChannel {
    /// The webhook target, if one is configured. Channels without one are inert.
    pub fn webhook(&self) -> Option<&str> {
        self.webhook
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }

    /// `message_up` for a 200, `message_down` for anything else
    pub fn message_for(&self, observation: &StatusObservation) -> &str {
        if observation.is_up() {
            &self.message_up
        } else {
            &self.message_down
        }
    }
}

/// Where the last known status of each endpoint is kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateConfig {
    File {
        #[serde(default = "default_state_path")]
        path: PathBuf,
        #[serde(default = "default_namespace")]
        namespace: String,
    },
    Memory {
        #[serde(default = "default_namespace")]
        namespace: String,
    },
}

impl StateConfig {
    pub fn namespace(&self) -> &str {
        match self {
            StateConfig::File { namespace, .. } | StateConfig::Memory { namespace } => namespace,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        StateConfig::File {
            path: default_state_path(),
            namespace: default_namespace(),
        }
    }
}

/// Per-run limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_seconds: u64,
}

impl RunConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_seconds)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            probe_timeout_seconds: default_probe_timeout(),
            webhook_timeout_seconds: default_webhook_timeout(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from("whatsup-state.json")
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_max_concurrency() -> usize {
    1
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_webhook_timeout() -> u64 {
    10
}

impl Config {
    /// Reject configurations the pipeline cannot run with.
    ///
    /// Endpoint URLs are only checked for presence here; malformed URLs
    /// are reported per endpoint at run time.
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(index) = self.endpoints.iter().position(|e| e.url.trim().is_empty()) {
            return Err(WhatsupError::Config(format!(
                "endpoints[{}]: url must not be empty",
                index
            )));
        }
        if let Some(index) = self.notification.iter().position(|n| n.kind.trim().is_empty()) {
            return Err(WhatsupError::Config(format!(
                "notification[{}]: type must not be empty",
                index
            )));
        }
        if self.run.max_concurrency == 0 {
            return Err(WhatsupError::Config(
                "run.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.run.probe_timeout_seconds == 0 || self.run.webhook_timeout_seconds == 0 {
            return Err(WhatsupError::Config(
                "run timeouts must be at least 1 second".to_string(),
            ));
        }
        if self.state.namespace().trim_matches('/').is_empty() {
            return Err(WhatsupError::Config(
                "state.namespace must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate configuration from a JSON or YAML file.
///
/// Files ending in `.yaml` or `.yml` are parsed as YAML, anything else as JSON.
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        WhatsupError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let config: Config = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    config.validate()?;
    Ok(config)
}
