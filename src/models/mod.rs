mod model;
mod source;

pub use model::{ModelError, ScoringModel};
pub use source::{ModelProvider, ModelSlot, ModelSource};
