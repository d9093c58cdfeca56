use crate::core::model_schema::ModelSchema;
use std::sync::Arc;

/// Missing-value encoding for instance slots.
pub const MISSING_VALUE: f64 = f64::NAN;

/// A fixed-length model-input vector built from one source row.
///
/// One slot per schema attribute: numeric attributes hold the value,
/// nominal attributes hold the index of the label in the training domain,
/// and free-text attributes hold a placeholder while the live string rides
/// in the `strings` side channel. `NaN` encodes missing.
pub struct DenseInstance {
    schema: Arc<ModelSchema>,
    values: Vec<f64>,
    strings: Vec<Option<String>>,
    weight: f64,
}

impl DenseInstance {
    pub fn new(schema: Arc<ModelSchema>, values: Vec<f64>, weight: f64) -> DenseInstance {
        let n = values.len();
        DenseInstance {
            schema,
            values,
            strings: vec![None; n],
            weight,
        }
    }

    pub fn with_strings(
        schema: Arc<ModelSchema>,
        values: Vec<f64>,
        strings: Vec<Option<String>>,
        weight: f64,
    ) -> DenseInstance {
        DenseInstance {
            schema,
            values,
            strings,
            weight,
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn num_attributes(&self) -> usize {
        self.values.len()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn is_missing_at(&self, index: usize) -> bool {
        self.values.get(index).is_none_or(|v| v.is_nan())
    }

    /// Live string for a free-text attribute, if one was captured.
    pub fn string_at(&self, index: usize) -> Option<&str> {
        self.strings.get(index).and_then(|s| s.as_deref())
    }

    pub fn target_value(&self) -> Option<f64> {
        self.schema
            .target_index()
            .and_then(|i| self.values.get(i).copied())
    }

    pub fn is_target_missing(&self) -> bool {
        match self.schema.target_index() {
            Some(i) => self.is_missing_at(i),
            None => true,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Tears the instance down into its backing buffers so a builder can
    /// reuse them for the next row.
    pub(crate) fn into_buffers(self) -> (Vec<f64>, Vec<Option<String>>) {
        (self.values, self.strings)
    }
}
