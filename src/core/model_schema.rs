use crate::core::attributes::Attribute;
use serde::{Deserialize, Serialize};

/// The ordered, immutable attribute structure a model was trained with.
///
/// Supervised models designate exactly one attribute as the target; for
/// clusterers `target_index` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub relation_name: String,
    pub attributes: Vec<Attribute>,
    pub target_index: Option<usize>,
}

impl ModelSchema {
    pub fn new(
        relation_name: impl Into<String>,
        attributes: Vec<Attribute>,
        target_index: Option<usize>,
    ) -> ModelSchema {
        ModelSchema {
            relation_name: relation_name.into(),
            attributes,
            target_index,
        }
    }

    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute_at(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    pub fn index_of_attribute(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name() == name)
    }

    pub fn target_index(&self) -> Option<usize> {
        self.target_index
    }

    pub fn target_attribute(&self) -> Option<&Attribute> {
        self.target_index.and_then(|i| self.attributes.get(i))
    }
}
