//! Change detection against the persisted status

use std::sync::Arc;

use crate::prober::StatusObservation;
use crate::store::StateStore;

/// Compares fresh observations with the stored status and records changes
pub struct ChangeDetector {
    store: Arc<dyn StateStore>,
}

impl std::fmt::Debug for ChangeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDetector").finish_non_exhaustive()
    }
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Returns true, after persisting the new value, when the observed
    /// status differs from the stored one. Nothing is written otherwise.
    ///
    /// A store failure is returned as an error rather than treated as
    /// either outcome.
    pub async fn report_if_changed(
        &self,
        key: &str,
        observation: &StatusObservation,
    ) -> crate::Result<bool> {
        let previous = self.store.get(key).await?;
        let current = observation.state_value();

        if previous.as_deref() == Some(current.as_str()) {
            tracing::debug!("{}: status {} unchanged", key, current);
            return Ok(false);
        }

        self.store.put(key, &current).await?;
        tracing::debug!(
            "{}: status changed {} -> {}",
            key,
            previous.as_deref().unwrap_or("<unset>"),
            current
        );
        Ok(true)
    }
}
