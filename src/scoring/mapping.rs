use crate::core::attributes::AttributeKind;
use crate::core::model_schema::ModelSchema;
use crate::core::row_schema::{FieldKind, RowSchema};
use std::collections::HashMap;

/// Resolution of one model attribute against the incoming row structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEntry {
    /// Index of the matching incoming field.
    Field(usize),
    /// No incoming field carries the attribute's name.
    NoMatch,
    /// A field with the right name exists but its kind is incompatible.
    TypeMismatch,
}

impl MapEntry {
    pub fn is_mapped(&self) -> bool {
        matches!(self, MapEntry::Field(_))
    }
}

/// Kind compatibility between a model attribute and an incoming field.
///
/// Numeric attributes accept numeric, integer and boolean fields; nominal
/// and free-text attributes accept text fields only. Everything else,
/// dates included, is a mismatch. Domain membership of nominal values is
/// deliberately not checked here: legal labels are fixed by training but
/// actual incoming strings are only known as rows arrive.
pub fn compatible(attribute: &AttributeKind, field: FieldKind) -> bool {
    match attribute {
        AttributeKind::Numeric => matches!(
            field,
            FieldKind::Numeric | FieldKind::Integer | FieldKind::Boolean
        ),
        AttributeKind::Nominal(_) | AttributeKind::Text => field == FieldKind::Text,
    }
}

/// The once-per-stream mapping from model attributes to incoming fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMapping {
    entries: Vec<MapEntry>,
}

impl SchemaMapping {
    /// Matches every model attribute against the incoming fields by exact
    /// (case-sensitive) name, then checks kind compatibility. Pure and
    /// deterministic; the result has one entry per model attribute.
    pub fn map(model: &ModelSchema, row: &RowSchema) -> SchemaMapping {
        let mut lookup: HashMap<&str, usize> = HashMap::with_capacity(row.num_fields());
        for (i, field) in row.fields.iter().enumerate() {
            lookup.insert(field.name.as_str(), i);
        }

        let entries = model
            .attributes
            .iter()
            .map(|attr| match lookup.get(attr.name()) {
                None => MapEntry::NoMatch,
                Some(&i) => {
                    if compatible(&attr.kind, row.fields[i].kind) {
                        MapEntry::Field(i)
                    } else {
                        MapEntry::TypeMismatch
                    }
                }
            })
            .collect();

        SchemaMapping { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, attribute_index: usize) -> MapEntry {
        self.entries
            .get(attribute_index)
            .copied()
            .unwrap_or(MapEntry::NoMatch)
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }
}
