use crate::core::row_schema::{FieldKind, RowSchema, RowValue};
use crate::models::model::ScoringModel;
use crate::scoring::error::ScoringError;
use crate::utils::env;
use std::collections::HashMap;
use tracing::debug;

/// Produces a model from a resolved path. Deserialization formats live
/// outside this crate; implementations bridge to whatever store holds the
/// trained artifacts.
pub trait ModelProvider {
    fn load(&mut self, resolved_path: &str) -> anyhow::Result<Box<dyn ScoringModel>>;
}

/// Where the model for a stream comes from.
///
/// A fixed model is owned exclusively by its stream instance, which is what
/// makes incremental update safe: the single writer holds the only handle.
/// Field-sourced selection reads a path from each row and loads through a
/// provider, with an optional per-run cache keyed by resolved path.
pub enum ModelSource {
    Fixed(Box<dyn ScoringModel>),
    FromField {
        field_name: String,
        provider: Box<dyn ModelProvider>,
        /// Fallback applied when a row carries no path.
        default_model: Option<Box<dyn ScoringModel>>,
        cache_loaded_models: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Active {
    None,
    Fixed,
    Default,
    Loaded,
    Cached(String),
}

/// Run-time model selection state for one stream instance.
///
/// The cache (when enabled) lives for exactly one processing run and is
/// owned by this slot, never shared across stream instances.
pub struct ModelSlot {
    source: ModelSource,
    field_index: Option<usize>,
    cache: HashMap<String, Box<dyn ScoringModel>>,
    loaded: Option<Box<dyn ScoringModel>>,
    last_path: Option<String>,
    active: Active,
}

impl ModelSlot {
    pub fn new(source: ModelSource) -> ModelSlot {
        let active = match source {
            ModelSource::Fixed(_) => Active::Fixed,
            ModelSource::FromField { .. } => Active::None,
        };
        ModelSlot {
            source,
            field_index: None,
            cache: HashMap::new(),
            loaded: None,
            last_path: None,
            active,
        }
    }

    pub fn is_field_sourced(&self) -> bool {
        matches!(self.source, ModelSource::FromField { .. })
    }

    /// Resolves the model path field against the incoming row structure.
    /// Must run before the first row is scored.
    pub fn init(&mut self, schema: &RowSchema) -> Result<(), ScoringError> {
        if let ModelSource::FromField { field_name, .. } = &self.source {
            let index = schema
                .index_of_field(field_name)
                .ok_or_else(|| ScoringError::ModelFieldMissing(field_name.clone()))?;
            let field = &schema.fields[index];
            if field.kind != FieldKind::Text {
                return Err(ScoringError::ModelFieldNotText(field_name.clone()));
            }
            self.field_index = Some(index);
        }
        Ok(())
    }

    /// Picks the model to score this row with. A no-op for fixed models and
    /// for consecutive rows naming the same resolved path.
    pub fn select_for_row(&mut self, row: &[RowValue]) -> Result<(), ScoringError> {
        let ModelSource::FromField {
            provider,
            default_model,
            cache_loaded_models,
            ..
        } = &mut self.source
        else {
            return Ok(());
        };

        let Some(index) = self.field_index else {
            return Err(ScoringError::NoModel);
        };

        let path = row.get(index).and_then(|v| v.coerce_string());
        let Some(path) = path else {
            if default_model.is_none() {
                return Err(ScoringError::NoModelPath);
            }
            debug!("row carries no model path, falling back to the default model");
            self.active = Active::Default;
            self.last_path = None;
            return Ok(());
        };

        let resolved = env::substitute(&path);
        if self.last_path.as_deref() == Some(resolved.as_str()) {
            return Ok(());
        }

        if *cache_loaded_models && self.cache.contains_key(&resolved) {
            debug!(path = %resolved, "found model in cache");
            self.active = Active::Cached(resolved.clone());
            self.last_path = Some(resolved);
            return Ok(());
        }

        debug!(path = %resolved, "loading model named by row field");
        let model = provider
            .load(&resolved)
            .map_err(|e| ScoringError::ModelLoad {
                path: resolved.clone(),
                source: e,
            })?;

        if *cache_loaded_models {
            self.cache.insert(resolved.clone(), model);
            self.active = Active::Cached(resolved.clone());
        } else {
            self.loaded = Some(model);
            self.active = Active::Loaded;
        }
        self.last_path = Some(resolved);
        Ok(())
    }

    /// The model currently selected for scoring.
    pub fn current(&self) -> Result<&dyn ScoringModel, ScoringError> {
        match &self.active {
            Active::Fixed => match &self.source {
                ModelSource::Fixed(m) => Ok(m.as_ref()),
                ModelSource::FromField { .. } => Err(ScoringError::NoModel),
            },
            Active::Default => match &self.source {
                ModelSource::FromField {
                    default_model: Some(m),
                    ..
                } => Ok(m.as_ref()),
                _ => Err(ScoringError::NoModel),
            },
            Active::Loaded => self.loaded.as_deref().ok_or(ScoringError::NoModel),
            Active::Cached(key) => self
                .cache
                .get(key)
                .map(|m| m.as_ref())
                .ok_or(ScoringError::NoModel),
            Active::None => Err(ScoringError::NoModel),
        }
    }

    /// Mutable access for incremental update. Only a fixed, exclusively
    /// owned model may be mutated; field-sourced models are read-only.
    pub fn current_mut(&mut self) -> Option<&mut dyn ScoringModel> {
        match &mut self.source {
            ModelSource::Fixed(m) => Some(m.as_mut()),
            ModelSource::FromField { .. } => None,
        }
    }
}
