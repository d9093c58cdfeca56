use crate::core::attributes::Attribute;
use crate::core::model_schema::ModelSchema;
use crate::core::row_schema::{Field, FieldKind, RowSchema};
use std::sync::Arc;

/// The classic iris schema: four numeric inputs and a three-label nominal
/// target.
pub fn iris_schema() -> Arc<ModelSchema> {
    Arc::new(ModelSchema::new(
        "iris",
        vec![
            Attribute::numeric("sepallength"),
            Attribute::numeric("sepalwidth"),
            Attribute::numeric("petallength"),
            Attribute::numeric("petalwidth"),
            Attribute::nominal(
                "class",
                vec!["setosa".into(), "versicolor".into(), "virginica".into()],
            ),
        ],
        Some(4),
    ))
}

/// Incoming row structure matching the iris schema field for field.
pub fn iris_row_schema() -> RowSchema {
    RowSchema::new(vec![
        Field::new("sepallength", FieldKind::Numeric),
        Field::new("sepalwidth", FieldKind::Numeric),
        Field::new("petallength", FieldKind::Numeric),
        Field::new("petalwidth", FieldKind::Numeric),
        Field::new("class", FieldKind::Text),
    ])
}
