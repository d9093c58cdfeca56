use crate::core::attributes::Attribute;
use crate::core::instances::DenseInstance;
use crate::core::model_schema::ModelSchema;
use crate::models::{ModelError, ScoringModel};
use crate::testing::dummies::iris_schema;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Supervised classifier that answers every instance with the same fixed
/// distribution. Deterministic, so row-at-a-time and batch scoring agree.
pub struct FixedDistributionClassifier {
    schema: Arc<ModelSchema>,
    distribution: Vec<f64>,
    batch_capable: bool,
    preferred_batch_size: Option<usize>,
}

impl FixedDistributionClassifier {
    pub fn new(schema: Arc<ModelSchema>, distribution: Vec<f64>) -> FixedDistributionClassifier {
        FixedDistributionClassifier {
            schema,
            distribution,
            batch_capable: false,
            preferred_batch_size: None,
        }
    }

    pub fn batch_capable(mut self) -> FixedDistributionClassifier {
        self.batch_capable = true;
        self
    }

    pub fn with_preferred_batch_size(mut self, size: usize) -> FixedDistributionClassifier {
        self.preferred_batch_size = Some(size);
        self
    }
}

impl ScoringModel for FixedDistributionClassifier {
    fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    fn is_supervised(&self) -> bool {
        true
    }

    fn is_batch_capable(&self) -> bool {
        self.batch_capable
    }

    fn preferred_batch_size(&self) -> Option<usize> {
        self.preferred_batch_size
    }

    fn distribution_for(&self, _instance: &DenseInstance) -> Result<Vec<f64>, ModelError> {
        Ok(self.distribution.clone())
    }

    fn distribution_for_batch(
        &self,
        instances: &[DenseInstance],
    ) -> Result<Vec<Vec<f64>>, ModelError> {
        if !self.batch_capable {
            return Err(ModelError::NotBatchCapable);
        }
        Ok(instances.iter().map(|_| self.distribution.clone()).collect())
    }
}

/// Classifier whose distribution is all zeros: it can never decide.
pub fn undecided_classifier() -> FixedDistributionClassifier {
    FixedDistributionClassifier::new(iris_schema(), vec![0.0, 0.0, 0.0])
}

/// Classifier that votes for the iris label named by the first input slot
/// (0, 1 or 2), or abstains when that slot is missing. Deterministic per
/// instance, so batch and row-at-a-time scoring agree.
pub struct SlotVoteClassifier {
    schema: Arc<ModelSchema>,
    batch_capable: bool,
}

impl SlotVoteClassifier {
    pub fn new() -> SlotVoteClassifier {
        SlotVoteClassifier {
            schema: iris_schema(),
            batch_capable: false,
        }
    }

    pub fn batch_capable(mut self) -> SlotVoteClassifier {
        self.batch_capable = true;
        self
    }

    fn vote(&self, instance: &DenseInstance) -> Vec<f64> {
        let mut dist = vec![0.0; 3];
        if let Some(v) = instance.value_at(0) {
            if !v.is_nan() {
                dist[(v as usize).min(2)] = 1.0;
            }
        }
        dist
    }
}

impl Default for SlotVoteClassifier {
    fn default() -> Self {
        SlotVoteClassifier::new()
    }
}

impl ScoringModel for SlotVoteClassifier {
    fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    fn is_supervised(&self) -> bool {
        true
    }

    fn is_batch_capable(&self) -> bool {
        self.batch_capable
    }

    fn distribution_for(&self, instance: &DenseInstance) -> Result<Vec<f64>, ModelError> {
        Ok(self.vote(instance))
    }

    fn distribution_for_batch(
        &self,
        instances: &[DenseInstance],
    ) -> Result<Vec<Vec<f64>>, ModelError> {
        if !self.batch_capable {
            return Err(ModelError::NotBatchCapable);
        }
        Ok(instances.iter().map(|i| self.vote(i)).collect())
    }
}

/// Supervised numeric-target model returning a fixed regression value.
pub struct RegressionStub {
    schema: Arc<ModelSchema>,
    value: f64,
}

impl RegressionStub {
    pub fn new(value: f64) -> RegressionStub {
        RegressionStub {
            schema: Arc::new(ModelSchema::new(
                "regression",
                vec![Attribute::numeric("x"), Attribute::numeric("target")],
                Some(1),
            )),
            value,
        }
    }
}

impl ScoringModel for RegressionStub {
    fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    fn is_supervised(&self) -> bool {
        true
    }

    fn distribution_for(&self, _instance: &DenseInstance) -> Result<Vec<f64>, ModelError> {
        Ok(vec![self.value])
    }
}

/// Clusterer that answers every instance with the same fixed distribution
/// over clusters.
pub struct FixedDistributionClusterer {
    schema: Arc<ModelSchema>,
    distribution: Vec<f64>,
}

impl FixedDistributionClusterer {
    pub fn new(distribution: Vec<f64>) -> FixedDistributionClusterer {
        FixedDistributionClusterer {
            schema: Arc::new(ModelSchema::new(
                "clusters",
                vec![Attribute::numeric("x"), Attribute::numeric("y")],
                None,
            )),
            distribution,
        }
    }
}

impl ScoringModel for FixedDistributionClusterer {
    fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    fn is_supervised(&self) -> bool {
        false
    }

    fn num_clusters(&self) -> Option<usize> {
        Some(self.distribution.len())
    }

    fn distribution_for(&self, _instance: &DenseInstance) -> Result<Vec<f64>, ModelError> {
        Ok(self.distribution.clone())
    }
}

/// Handle for observing update calls made against an
/// [`UpdateSpyClassifier`].
#[derive(Clone)]
pub struct UpdateSpyHandle {
    updates: Arc<AtomicUsize>,
}

impl UpdateSpyHandle {
    pub fn count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

/// Updateable supervised classifier that records every update call.
pub struct UpdateSpyClassifier {
    schema: Arc<ModelSchema>,
    updates: Arc<AtomicUsize>,
    fail_updates: bool,
}

impl UpdateSpyClassifier {
    pub fn new(schema: Arc<ModelSchema>) -> (UpdateSpyClassifier, UpdateSpyHandle) {
        let updates = Arc::new(AtomicUsize::new(0));
        let handle = UpdateSpyHandle {
            updates: Arc::clone(&updates),
        };
        (
            UpdateSpyClassifier {
                schema,
                updates,
                fail_updates: false,
            },
            handle,
        )
    }

    /// Makes every subsequent update call fail.
    pub fn failing_updates(mut self) -> UpdateSpyClassifier {
        self.fail_updates = true;
        self
    }
}

impl ScoringModel for UpdateSpyClassifier {
    fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    fn is_supervised(&self) -> bool {
        true
    }

    fn is_updateable(&self) -> bool {
        true
    }

    fn distribution_for(&self, _instance: &DenseInstance) -> Result<Vec<f64>, ModelError> {
        Ok(vec![1.0, 0.0, 0.0])
    }

    fn update(&mut self, _instance: &DenseInstance) -> Result<(), ModelError> {
        if self.fail_updates {
            return Err(ModelError::Invocation("update rejected".into()));
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Model whose every prediction call fails.
pub struct FailingModel {
    schema: Arc<ModelSchema>,
}

impl FailingModel {
    pub fn new() -> FailingModel {
        FailingModel {
            schema: iris_schema(),
        }
    }
}

impl Default for FailingModel {
    fn default() -> Self {
        FailingModel::new()
    }
}

impl ScoringModel for FailingModel {
    fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    fn is_supervised(&self) -> bool {
        true
    }

    fn distribution_for(&self, _instance: &DenseInstance) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::Invocation("model exploded".into()))
    }
}
