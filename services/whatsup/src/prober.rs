//! HTTP status probing

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::endpoint::ResolvedTarget;
use crate::io::HttpClient;
use crate::WhatsupError;

/// Stored in place of a status code when no HTTP response was received.
///
/// Not numeric, so it can never equal a stringified status code.
pub const NO_STATUS: &str = "None";

/// Reason recorded when the target could not be connected to
pub const CONNECTION_ERROR: &str = "ConnectionError";

/// Reason recorded when the probe exceeded its timeout
pub const TIMEOUT: &str = "Timeout";

/// The status of one endpoint as seen by one probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusObservation {
    pub target: String,
    pub status_code: Option<u16>,
    pub reason: String,
}

impl StatusObservation {
    pub fn new(target: impl Into<String>, status_code: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            status_code,
            reason: reason.into(),
        }
    }

    /// Only a plain 200 counts as up
    pub fn is_up(&self) -> bool {
        self.status_code == Some(200)
    }

    /// The value persisted for this observation
    pub fn state_value(&self) -> String {
        status_value(self.status_code)
    }
}

impl fmt::Display for StatusObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.target,
            self.state_value(),
            self.reason
        )
    }
}

/// Stringify a status code, mapping "no response" to [`NO_STATUS`]
pub fn status_value(status_code: Option<u16>) -> String {
    match status_code {
        Some(code) => code.to_string(),
        None => NO_STATUS.to_string(),
    }
}

/// Issues a single GET per target and normalizes the outcome
pub struct StatusProber {
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for StatusProber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusProber").finish_non_exhaustive()
    }
}

impl StatusProber {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    /// Probe the target once.
    ///
    /// Connection failures and timeouts are observations with no status
    /// code, not errors. Any other client failure is returned as an error.
    pub async fn probe(&self, target: &ResolvedTarget) -> crate::Result<StatusObservation> {
        tracing::debug!("Probing {}", target);

        let observation = match self.http.get(target.as_str(), target.cookies()).await {
            Ok(response) => {
                StatusObservation::new(target.as_str(), Some(response.status), response.reason)
            }
            Err(WhatsupError::Connection(e)) => {
                tracing::debug!("Probe of {} could not connect: {}", target, e);
                StatusObservation::new(target.as_str(), None, CONNECTION_ERROR)
            }
            Err(WhatsupError::Timeout(e)) => {
                tracing::debug!("Probe of {} timed out: {}", target, e);
                StatusObservation::new(target.as_str(), None, TIMEOUT)
            }
            Err(e) => return Err(e),
        };

        tracing::debug!("{}", observation);
        Ok(observation)
    }
}
