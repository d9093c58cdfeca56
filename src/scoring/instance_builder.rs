use crate::core::attributes::AttributeKind;
use crate::core::instances::{DenseInstance, MISSING_VALUE};
use crate::core::model_schema::ModelSchema;
use crate::core::row_schema::RowValue;
use crate::scoring::mapping::{MapEntry, SchemaMapping};
use std::sync::Arc;

/// Builds model-input vectors from raw rows using a precomputed mapping.
///
/// Row-at-a-time scoring recycles one scratch buffer through
/// [`build`](InstanceBuilder::build) / [`recycle`](InstanceBuilder::recycle);
/// batch members use [`build_fresh`](InstanceBuilder::build_fresh) because
/// all members of a batch must be live at the same time.
pub struct InstanceBuilder {
    schema: Arc<ModelSchema>,
    mapping: SchemaMapping,
    scratch: Option<(Vec<f64>, Vec<Option<String>>)>,
}

impl InstanceBuilder {
    pub fn new(schema: Arc<ModelSchema>, mapping: SchemaMapping) -> InstanceBuilder {
        InstanceBuilder {
            schema,
            mapping,
            scratch: None,
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn mapping(&self) -> &SchemaMapping {
        &self.mapping
    }

    /// Builds an instance for one row, reusing the recycled buffers when
    /// available.
    pub fn build(&mut self, row: &[RowValue]) -> DenseInstance {
        let n = self.schema.num_attributes();
        let (mut values, mut strings) = self
            .scratch
            .take()
            .unwrap_or_else(|| (vec![MISSING_VALUE; n], vec![None; n]));
        values.resize(n, MISSING_VALUE);
        strings.resize(n, None);

        self.fill(&mut values, &mut strings, row);
        DenseInstance::with_strings(Arc::clone(&self.schema), values, strings, 1.0)
    }

    /// Builds an instance backed by freshly allocated buffers.
    pub fn build_fresh(&self, row: &[RowValue]) -> DenseInstance {
        let n = self.schema.num_attributes();
        let mut values = vec![MISSING_VALUE; n];
        let mut strings = vec![None; n];
        self.fill(&mut values, &mut strings, row);
        DenseInstance::with_strings(Arc::clone(&self.schema), values, strings, 1.0)
    }

    /// Hands an instance's backing buffers back for reuse.
    pub fn recycle(&mut self, instance: DenseInstance) {
        self.scratch = Some(instance.into_buffers());
    }

    fn fill(&self, values: &mut [f64], strings: &mut [Option<String>], row: &[RowValue]) {
        for (i, attr) in self.schema.attributes.iter().enumerate() {
            strings[i] = None;

            let MapEntry::Field(src) = self.mapping.entry(i) else {
                values[i] = MISSING_VALUE;
                continue;
            };

            let Some(value) = row.get(src) else {
                values[i] = MISSING_VALUE;
                continue;
            };
            if value.is_missing() {
                values[i] = MISSING_VALUE;
                continue;
            }

            // A value that will not convert is silently missing, never a
            // row-level failure.
            values[i] = match &attr.kind {
                AttributeKind::Numeric => value.as_numeric().unwrap_or(MISSING_VALUE),
                AttributeKind::Nominal(domain) => value
                    .coerce_string()
                    .and_then(|s| domain.index_of(&s))
                    .map_or(MISSING_VALUE, |ix| ix as f64),
                AttributeKind::Text => match value.coerce_string() {
                    Some(s) => {
                        strings[i] = Some(s);
                        0.0
                    }
                    None => MISSING_VALUE,
                },
            };
        }
    }
}
