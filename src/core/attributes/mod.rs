use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of an attribute in a trained model's schema.
///
/// Nominal attributes carry the ordered domain of legal labels fixed at
/// training time. Free-text attributes accept any string at scoring time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    Numeric,
    Nominal(NominalDomain),
    Text,
}

/// Ordered domain of legal values for a nominal attribute, with a
/// label-to-index lookup built once at construction.
///
/// Serializes as the bare value list; the lookup map is rebuilt on
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct NominalDomain {
    values: Vec<String>,
    label_to_index: HashMap<String, usize>,
}

impl From<Vec<String>> for NominalDomain {
    fn from(values: Vec<String>) -> NominalDomain {
        NominalDomain::new(values)
    }
}

impl From<NominalDomain> for Vec<String> {
    fn from(domain: NominalDomain) -> Vec<String> {
        domain.values
    }
}

impl NominalDomain {
    pub fn new(values: Vec<String>) -> NominalDomain {
        let label_to_index = values
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), i))
            .collect();
        NominalDomain {
            values,
            label_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.label_to_index.get(label).copied()
    }

    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn enumerate_values(&self) -> impl Iterator<Item = (usize, &String)> {
        self.values.iter().enumerate()
    }
}

/// One input attribute of a trained model's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn numeric(name: impl Into<String>) -> Attribute {
        Attribute {
            name: name.into(),
            kind: AttributeKind::Numeric,
        }
    }

    pub fn nominal(name: impl Into<String>, values: Vec<String>) -> Attribute {
        Attribute {
            name: name.into(),
            kind: AttributeKind::Nominal(NominalDomain::new(values)),
        }
    }

    pub fn text(name: impl Into<String>) -> Attribute {
        Attribute {
            name: name.into(),
            kind: AttributeKind::Text,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, AttributeKind::Numeric)
    }

    pub fn is_nominal(&self) -> bool {
        matches!(self.kind, AttributeKind::Nominal(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, AttributeKind::Text)
    }

    pub fn domain(&self) -> Option<&NominalDomain> {
        match &self.kind {
            AttributeKind::Nominal(domain) => Some(domain),
            _ => None,
        }
    }

    /// Position of a label in the nominal domain, or `None` for labels the
    /// model never saw during training (and for non-nominal attributes).
    pub fn index_of_value(&self, label: &str) -> Option<usize> {
        self.domain().and_then(|d| d.index_of(label))
    }

    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.domain().and_then(|d| d.value_at(index))
    }

    pub fn num_values(&self) -> usize {
        self.domain().map_or(0, NominalDomain::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_domain_lookup_is_positional() {
        let attr = Attribute::nominal(
            "class",
            vec!["setosa".into(), "versicolor".into(), "virginica".into()],
        );
        assert_eq!(attr.index_of_value("setosa"), Some(0));
        assert_eq!(attr.index_of_value("virginica"), Some(2));
        assert_eq!(attr.index_of_value("unknown"), None);
        assert_eq!(attr.value_at(1), Some("versicolor"));
        assert_eq!(attr.num_values(), 3);
    }

    #[test]
    fn kind_predicates() {
        assert!(Attribute::numeric("x").is_numeric());
        assert!(Attribute::nominal("y", vec!["a".into()]).is_nominal());
        assert!(Attribute::text("z").is_text());
        assert_eq!(Attribute::numeric("x").index_of_value("a"), None);
        assert_eq!(Attribute::numeric("x").num_values(), 0);
    }

    #[test]
    fn deserialized_domain_rebuilds_the_lookup() {
        let attr = Attribute::nominal(
            "class",
            vec!["setosa".into(), "versicolor".into(), "virginica".into()],
        );
        let json = serde_json::to_string(&attr).unwrap();
        let back: Attribute = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attr);
        assert_eq!(back.index_of_value("setosa"), Some(0));
        assert_eq!(back.index_of_value("virginica"), Some(2));
        assert_eq!(back.index_of_value("unknown"), None);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let attr = Attribute::nominal("class", vec!["Yes".into(), "No".into()]);
        assert_eq!(attr.index_of_value("yes"), None);
        assert_eq!(attr.index_of_value("Yes"), Some(0));
    }
}
