use crate::core::row_schema::{Field, FieldKind, RowSchema, RowValue};
use crate::models::ScoringModel;
use crate::scoring::dispatch::Prediction;

/// Output row structure: the input fields plus the appended prediction
/// columns.
///
/// Supervised models append either `{target}_predicted` (label or
/// regression value) or one `{target}:{label}_predicted_prob` column per
/// domain label. Clusterers append `cluster#_predicted` or one
/// `cluster_{i}_predicted_prob` column per cluster.
pub fn output_schema(
    input: &RowSchema,
    model: &dyn ScoringModel,
    output_probabilities: bool,
) -> RowSchema {
    let mut fields = input.fields.clone();

    if model.is_supervised() {
        match model.schema().target_attribute() {
            Some(target) if target.is_nominal() && output_probabilities && target.num_values() > 1 =>
            {
                for label in target.domain().map(|d| d.values()).unwrap_or_default() {
                    fields.push(Field::new(
                        format!("{}:{}_predicted_prob", target.name(), label),
                        FieldKind::Numeric,
                    ));
                }
            }
            Some(target) if target.is_nominal() => {
                fields.push(Field::new(
                    format!("{}_predicted", target.name()),
                    FieldKind::Text,
                ));
            }
            Some(target) => {
                fields.push(Field::new(
                    format!("{}_predicted", target.name()),
                    FieldKind::Numeric,
                ));
            }
            None => fields.push(Field::new("predicted", FieldKind::Numeric)),
        }
    } else {
        let clusters = model.num_clusters().unwrap_or(0);
        if output_probabilities && clusters > 1 {
            for i in 0..clusters {
                fields.push(Field::new(
                    format!("cluster_{i}_predicted_prob"),
                    FieldKind::Numeric,
                ));
            }
        } else {
            fields.push(Field::new("cluster#_predicted", FieldKind::Numeric));
        }
    }

    RowSchema::new(fields)
}

/// Renders one prediction cell as a row value. `Unassigned` widens the
/// column to optional instead of planting a sentinel string.
pub fn prediction_to_value(prediction: &Prediction) -> RowValue {
    match prediction {
        Prediction::Value(v) => RowValue::Numeric(*v),
        Prediction::Label(l) => RowValue::Text(l.clone()),
        Prediction::Cluster(c) => RowValue::Numeric(*c as f64),
        Prediction::Probability(p) => RowValue::Numeric(*p),
        Prediction::Unassigned => RowValue::Null,
    }
}

/// Copies the input row and appends the prediction cells.
pub fn append_predictions(mut row: Vec<RowValue>, predictions: &[Prediction]) -> Vec<RowValue> {
    row.extend(predictions.iter().map(prediction_to_value));
    row
}
