pub mod batch;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod instance_builder;
pub mod mapping;
pub mod output;
pub mod updater;

pub use batch::{BatchAccumulator, DEFAULT_BATCH_SIZE};
pub use config::ScoringConfig;
pub use dispatch::{Prediction, PredictionDispatcher};
pub use error::ScoringError;
pub use instance_builder::InstanceBuilder;
pub use mapping::{MapEntry, SchemaMapping};
pub use updater::IncrementalUpdater;
