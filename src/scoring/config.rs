use serde::{Deserialize, Serialize};

/// Scoring behavior knobs supplied by the host pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScoringConfig {
    /// Emit a probability column per class/cluster instead of a single
    /// predicted value.
    pub output_probabilities: bool,
    /// Refine an updateable model with each scored row.
    pub update_incremental_model: bool,
    /// Batch size for batch-capable models; may reference environment
    /// variables (`${VAR}`). Unset or unparsable values fall back to the
    /// model's preferred size, then to the default.
    pub batch_size: Option<String>,
    /// Keep field-sourced models in an in-memory cache for the run.
    pub cache_loaded_models: bool,
}
