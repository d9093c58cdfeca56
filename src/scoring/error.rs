use crate::models::ModelError;
use thiserror::Error;

/// Failures surfaced while scoring a stream.
///
/// Mapping anomalies and per-field conversion problems are not errors (they
/// become missing values); only model invocation, model resolution, update
/// and emission failures reach this type.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("unable to make prediction for row {row}")]
    RowPrediction {
        row: u64,
        #[source]
        source: ModelError,
    },

    #[error("unable to make predictions for batch of rows {first_row}..={last_row}")]
    BatchPrediction {
        first_row: u64,
        last_row: u64,
        #[source]
        source: ModelError,
    },

    #[error("failed to update incremental model")]
    UpdateFailed(#[source] ModelError),

    #[error("unable to locate model path field `{0}` in the incoming row structure")]
    ModelFieldMissing(String),

    #[error("model path field `{0}` must be a text field")]
    ModelFieldNotText(String),

    #[error("row specifies no model path and no default model is configured")]
    NoModelPath,

    #[error("problem loading model from `{path}`")]
    ModelLoad {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no model available for scoring")]
    NoModel,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
