//! Engine: runs the check-diff-notify pipeline over all endpoints

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::detector::ChangeDetector;
use crate::dispatcher::Dispatcher;
use crate::endpoint::{EndpointSpec, ResolvedTarget};
use crate::io::HttpClient;
use crate::notifier::NotificationRecord;
use crate::prober::{StatusObservation, StatusProber};
use crate::store::{state_key, StateStore, DEFAULT_NAMESPACE};

/// What happened to one endpoint during a run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EndpointStatus {
    Unchanged {
        observation: StatusObservation,
    },
    Changed {
        observation: StatusObservation,
        notifications: Vec<NotificationRecord>,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointOutcome {
    /// The endpoint URL as configured
    pub endpoint: String,
    #[serde(flatten)]
    pub status: EndpointStatus,
}

/// Result of one run over all endpoints
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Endpoints that produced an observation
    pub checked: usize,
    pub changed: usize,
    pub failed: usize,
    /// One entry per configured endpoint, in configuration order
    pub outcomes: Vec<EndpointOutcome>,
}

impl RunSummary {
    fn from_outcomes(outcomes: Vec<EndpointOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in &outcomes {
            match outcome.status {
                EndpointStatus::Unchanged { .. } => summary.checked += 1,
                EndpointStatus::Changed { .. } => {
                    summary.checked += 1;
                    summary.changed += 1;
                }
                EndpointStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary.outcomes = outcomes;
        summary
    }

    /// Notification attempts that did not go through
    pub fn failed_notifications(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                EndpointStatus::Changed { notifications, .. } => Some(notifications),
                _ => None,
            })
            .flatten()
            .filter(|n| !n.success)
            .count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} checked, {} changed, {} failed",
            self.checked, self.changed, self.failed
        )
    }
}

/// An endpoint that resolved, ready to be checked
struct Check<'a> {
    index: usize,
    spec: &'a EndpointSpec,
    target: ResolvedTarget,
    key: String,
}

/// The engine wires resolver, prober, detector and dispatcher together
pub struct Engine {
    prober: StatusProber,
    detector: ChangeDetector,
    dispatcher: Dispatcher,
    namespace: String,
    max_concurrency: usize,
}

impl Engine {
    pub fn new(store: Arc<dyn StateStore>, http: Arc<dyn HttpClient>, dispatcher: Dispatcher) -> Self {
        Self {
            prober: StatusProber::new(http),
            detector: ChangeDetector::new(store),
            dispatcher,
            namespace: DEFAULT_NAMESPACE.to_string(),
            max_concurrency: 1,
        }
    }

    /// Namespace prefixed to every state key
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Maximum number of endpoints checked at the same time
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Check every endpoint once.
    ///
    /// Failures are recorded against the endpoint that caused them and
    /// never stop the run. Endpoints sharing a state key are checked one
    /// after another, in configuration order.
    pub async fn run_once(&self, endpoints: &[EndpointSpec]) -> RunSummary {
        tracing::debug!(
            "Starting run over {} endpoints (concurrency {})",
            endpoints.len(),
            self.max_concurrency
        );

        let mut outcomes: Vec<Option<EndpointOutcome>> = vec![None; endpoints.len()];
        let mut groups: Vec<Vec<Check<'_>>> = Vec::new();
        let mut group_by_key: HashMap<String, usize> = HashMap::new();

        for (index, spec) in endpoints.iter().enumerate() {
            match spec.resolve() {
                Ok(target) => {
                    let key = state_key(&self.namespace, &target.host_key());
                    let check = Check {
                        index,
                        spec,
                        target,
                        key: key.clone(),
                    };
                    match group_by_key.get(&key) {
                        Some(&group) => {
                            tracing::debug!(
                                "'{}' shares state key {} with an earlier endpoint",
                                spec.url,
                                key
                            );
                            groups[group].push(check);
                        }
                        None => {
                            group_by_key.insert(key, groups.len());
                            groups.push(vec![check]);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping endpoint '{}': {}", spec.url, e);
                    outcomes[index] = Some(EndpointOutcome {
                        endpoint: spec.url.clone(),
                        status: EndpointStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        let checked: Vec<Vec<(usize, EndpointOutcome)>> = stream::iter(groups)
            .map(|group| async move {
                let mut results = Vec::with_capacity(group.len());
                for check in group {
                    let outcome = EndpointOutcome {
                        endpoint: check.spec.url.clone(),
                        status: self.check(&check.target, &check.key).await,
                    };
                    results.push((check.index, outcome));
                }
                results
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        for (index, outcome) in checked.into_iter().flatten() {
            outcomes[index] = Some(outcome);
        }

        let summary = RunSummary::from_outcomes(outcomes.into_iter().flatten().collect());
        tracing::debug!("Run finished: {}", summary);
        summary
    }

    /// Probe one target, record a change and notify if there was one
    async fn check(&self, target: &ResolvedTarget, key: &str) -> EndpointStatus {
        let observation = match self.prober.probe(target).await {
            Ok(observation) => observation,
            Err(e) => {
                tracing::warn!("Probe of '{}' failed: {}", target, e);
                return EndpointStatus::Failed {
                    error: e.to_string(),
                };
            }
        };

        match self.detector.report_if_changed(key, &observation).await {
            Ok(true) => {
                tracing::info!(
                    "Status of '{}' changed to {} ({})",
                    target,
                    observation.state_value(),
                    observation.reason
                );
                let notifications = self.dispatcher.dispatch(target.as_str(), &observation).await;
                EndpointStatus::Changed {
                    observation,
                    notifications,
                }
            }
            Ok(false) => EndpointStatus::Unchanged { observation },
            Err(e) => {
                tracing::warn!("Change detection for '{}' failed: {}", target, e);
                EndpointStatus::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
