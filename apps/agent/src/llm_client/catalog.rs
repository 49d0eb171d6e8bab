//! The set of models a run may use, and the one selected for runs that do
//! not name a model.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub model_name: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default = "default_provider_type")]
    pub provider_type: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub support_functions: bool,
    #[serde(default)]
    pub support_vision: bool,
}

fn default_provider_type() -> String {
    "openai_compatible".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

impl ModelInfo {
    /// Catalog entry for the client's configured model, used when no
    /// `MODELS_FILE` is given.
    pub fn fallback(model_id: &str) -> Self {
        let model_name = model_id.rsplit('/').next().unwrap_or(model_id).to_string();
        Self {
            model_id: model_id.to_string(),
            model_name,
            provider_name: String::new(),
            provider_type: default_provider_type(),
            max_tokens: default_max_tokens(),
            support_functions: false,
            support_vision: false,
        }
    }
}

/// Loads a JSON array of model entries. Only `model_id` and `model_name`
/// are required per entry.
pub fn load_models(path: &Path) -> Result<Vec<ModelInfo>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read models file {}", path.display()))?;
    let models: Vec<ModelInfo> = serde_json::from_str(&raw)
        .with_context(|| format!("Models file {} is not a valid model list", path.display()))?;
    anyhow::ensure!(!models.is_empty(), "Models file {} is empty", path.display());
    Ok(models)
}

#[derive(Clone)]
pub struct ModelCatalog {
    models: Arc<Vec<ModelInfo>>,
    default_id: String,
    selected: Arc<Mutex<Option<String>>>,
}

impl ModelCatalog {
    /// The default is `default_id` when the catalog lists it, else the first
    /// entry. An empty list falls back to `default_id` alone.
    pub fn new(models: Vec<ModelInfo>, default_id: &str) -> Self {
        let models = if models.is_empty() {
            vec![ModelInfo::fallback(default_id)]
        } else {
            models
        };
        let default_id = if models.iter().any(|m| m.model_id == default_id) {
            default_id.to_string()
        } else {
            models[0].model_id.clone()
        };
        Self {
            models: Arc::new(models),
            default_id,
            selected: Arc::new(Mutex::new(None)),
        }
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.model_id == model_id)
    }

    /// Model id chosen through `select`, if any.
    pub fn selected(&self) -> Option<String> {
        self.selected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn current(&self) -> &ModelInfo {
        let id = self.selected().unwrap_or_else(|| self.default_id.clone());
        self.get(&id).unwrap_or(&self.models[0])
    }

    /// Returns `None` for an id the catalog does not list.
    pub fn select(&self, model_id: &str) -> Option<&ModelInfo> {
        let model = self.get(model_id)?;
        *self
            .selected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(model.model_id.clone());
        info!("Selected model {} ({})", model.model_name, model.model_id);
        Some(model)
    }
}
