use crate::core::instances::DenseInstance;
use crate::models::ScoringModel;
use crate::scoring::error::ScoringError;
use crate::scoring::mapping::SchemaMapping;
use tracing::warn;

/// Once-per-stream decision on whether the model may be refined with each
/// scored instance, and the per-row update itself.
///
/// Eligibility requires a supervised, updateable model whose target
/// attribute maps to a live input field, scored row-at-a-time from a fixed
/// model. Anything else disables update for the remainder of the stream
/// with a one-time diagnostic.
pub struct IncrementalUpdater {
    enabled: bool,
}

impl IncrementalUpdater {
    pub fn disabled() -> IncrementalUpdater {
        IncrementalUpdater { enabled: false }
    }

    pub fn decide(
        model: &dyn ScoringModel,
        mapping: &SchemaMapping,
        requested: bool,
        batch_mode: bool,
        field_sourced: bool,
    ) -> IncrementalUpdater {
        if !requested || batch_mode || field_sourced || !model.is_supervised() {
            return IncrementalUpdater::disabled();
        }
        if !model.is_updateable() {
            warn!("model cannot be updated incrementally, update disabled for this stream");
            return IncrementalUpdater::disabled();
        }
        let mapped = model
            .schema()
            .target_index()
            .is_some_and(|t| mapping.entry(t).is_mapped());
        if !mapped {
            warn!(
                "target attribute has no matching input field, incremental update disabled for this stream"
            );
            return IncrementalUpdater::disabled();
        }
        IncrementalUpdater { enabled: true }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Refines the model with a scored instance whose target slot is
    /// present. An update failure is fatal to the run; no retry, no
    /// rollback.
    pub fn after_score(
        &self,
        model: &mut dyn ScoringModel,
        instance: &DenseInstance,
    ) -> Result<(), ScoringError> {
        if !self.enabled || instance.is_target_missing() {
            return Ok(());
        }
        model.update(instance).map_err(ScoringError::UpdateFailed)
    }
}
