use crate::core::instances::DenseInstance;
use crate::models::{ModelError, ScoringModel};
use crate::utils::math::max_index;

/// One formatted output cell produced by scoring an instance.
///
/// `Unassigned` is the typed stand-in for the model being unable to commit
/// to any label or cluster (an all-zero distribution); downstream it
/// renders as a null cell rather than a magic string.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Regression value.
    Value(f64),
    /// Chosen nominal label.
    Label(String),
    /// Most probable cluster.
    Cluster(usize),
    /// One probability of a per-class/per-cluster distribution.
    Probability(f64),
    Unassigned,
}

/// Invokes the model and converts raw distributions into output cells.
pub struct PredictionDispatcher {
    output_probabilities: bool,
}

impl PredictionDispatcher {
    pub fn new(output_probabilities: bool) -> PredictionDispatcher {
        PredictionDispatcher {
            output_probabilities,
        }
    }

    /// Scores one instance. The returned cells are appended to the row in
    /// order.
    pub fn score(
        &self,
        model: &dyn ScoringModel,
        instance: &DenseInstance,
    ) -> Result<Vec<Prediction>, ModelError> {
        let distribution = model.distribution_for(instance)?;
        Ok(self.format(model, &distribution))
    }

    /// Scores a batch of instances in one model invocation. Results are in
    /// input order; a failure covers the whole batch.
    pub fn score_batch(
        &self,
        model: &dyn ScoringModel,
        instances: &[DenseInstance],
    ) -> Result<Vec<Vec<Prediction>>, ModelError> {
        let distributions = model.distribution_for_batch(instances)?;
        Ok(distributions
            .iter()
            .map(|d| self.format(model, d))
            .collect())
    }

    fn format(&self, model: &dyn ScoringModel, distribution: &[f64]) -> Vec<Prediction> {
        if distribution.len() > 1 && self.output_probabilities {
            return distribution
                .iter()
                .map(|&p| Prediction::Probability(p))
                .collect();
        }

        if distribution.is_empty() {
            return vec![Prediction::Unassigned];
        }

        if model.is_supervised() {
            match model.schema().target_attribute() {
                Some(target) if target.is_nominal() => {
                    let max = max_index(distribution);
                    if distribution[max] > 0.0 {
                        match target.value_at(max) {
                            Some(label) => vec![Prediction::Label(label.to_string())],
                            None => vec![Prediction::Unassigned],
                        }
                    } else {
                        vec![Prediction::Unassigned]
                    }
                }
                // numeric target: the distribution's only entry is the value
                _ => vec![Prediction::Value(distribution[0])],
            }
        } else {
            let max = max_index(distribution);
            if distribution[max] > 0.0 {
                vec![Prediction::Cluster(max)]
            } else {
                vec![Prediction::Unassigned]
            }
        }
    }
}
