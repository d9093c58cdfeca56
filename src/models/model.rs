use crate::core::instances::DenseInstance;
use crate::core::model_schema::ModelSchema;
use crate::utils::math::max_index;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("model cannot produce batch predictions")]
    NotBatchCapable,

    #[error("model cannot be updated incrementally")]
    NotUpdateable,
}

/// Capability surface of a pre-trained model (classifier or clusterer).
///
/// The model is consumed as an opaque artifact: this crate never inspects
/// trained parameters, it only asks for distributions over the target
/// domain (supervised) or over clusters (unsupervised). Regression models
/// return a single-element distribution holding the predicted value.
pub trait ScoringModel {
    /// The attribute structure the model was trained with.
    fn schema(&self) -> &Arc<ModelSchema>;

    fn is_supervised(&self) -> bool;

    fn is_updateable(&self) -> bool {
        false
    }

    /// Whether the model offers a more efficient multi-instance prediction
    /// path than looping per-instance calls.
    fn is_batch_capable(&self) -> bool {
        false
    }

    /// The batch size the model itself prefers, if it states one.
    fn preferred_batch_size(&self) -> Option<usize> {
        None
    }

    /// Number of clusters, for unsupervised models.
    fn num_clusters(&self) -> Option<usize> {
        None
    }

    /// Probability distribution over target labels or clusters. A
    /// single-element result carries a regression value.
    fn distribution_for(&self, instance: &DenseInstance) -> Result<Vec<f64>, ModelError>;

    /// Single prediction: the regression value, or the index of the most
    /// probable label/cluster (`NaN` when the model could not decide).
    fn classify(&self, instance: &DenseInstance) -> Result<f64, ModelError> {
        let dist = self.distribution_for(instance)?;
        if dist.len() == 1 {
            return Ok(dist[0]);
        }
        let max = max_index(&dist);
        if dist.get(max).copied().unwrap_or(0.0) > 0.0 {
            Ok(max as f64)
        } else {
            Ok(f64::NAN)
        }
    }

    /// Batch prediction, one distribution per instance, in input order.
    fn distribution_for_batch(
        &self,
        _instances: &[DenseInstance],
    ) -> Result<Vec<Vec<f64>>, ModelError> {
        Err(ModelError::NotBatchCapable)
    }

    /// Refine the model with one labeled instance.
    fn update(&mut self, _instance: &DenseInstance) -> Result<(), ModelError> {
        Err(ModelError::NotUpdateable)
    }
}
