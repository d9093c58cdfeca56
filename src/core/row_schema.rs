use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Primitive kind of a field in the live row stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum FieldKind {
    Numeric,
    Integer,
    Boolean,
    Text,
    Date,
}

/// One field of the incoming row structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Field {
        Field {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered field structure of the incoming row stream. Immutable for the
/// lifetime of a stream; a changed structure is treated as a new stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RowSchema {
    pub fields: Vec<Field>,
}

impl RowSchema {
    pub fn new(fields: Vec<Field>) -> RowSchema {
        RowSchema { fields }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_at(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn index_of_field(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A single typed cell value from the row stream.
///
/// `Null` and the empty string both count as missing, matching the source
/// semantics of the host pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    Null,
    Numeric(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
    Date(NaiveDateTime),
}

impl RowValue {
    pub fn is_missing(&self) -> bool {
        match self {
            RowValue::Null => true,
            RowValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the value: booleans become 1.0/0.0, integers widen
    /// to double. Text and dates have no numeric form here.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            RowValue::Numeric(v) => Some(*v),
            RowValue::Integer(v) => Some(*v as f64),
            RowValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// String form of the value, used for nominal lookup and free-text
    /// attributes. `None` only for missing values.
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            RowValue::Null => None,
            RowValue::Text(s) => {
                if s.is_empty() {
                    None
                } else {
                    Some(s.clone())
                }
            }
            RowValue::Numeric(v) => Some(v.to_string()),
            RowValue::Integer(v) => Some(v.to_string()),
            RowValue::Boolean(b) => Some(b.to_string()),
            RowValue::Date(d) => Some(d.to_string()),
        }
    }
}
