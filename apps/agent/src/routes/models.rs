use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::llm_client::catalog::ModelInfo;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ModelEntry {
    #[serde(flatten)]
    pub model: ModelInfo,
    pub is_current: bool,
}

#[derive(Serialize)]
pub struct ModelListResponse {
    pub models: Vec<ModelEntry>,
    pub total_count: usize,
    pub current_model: String,
}

/// GET /api/models
pub async fn handle_list_models(State(state): State<AppState>) -> Json<ModelListResponse> {
    let current = state.models.current().model_id.clone();
    let models: Vec<ModelEntry> = state
        .models
        .models()
        .iter()
        .map(|m| ModelEntry {
            is_current: m.model_id == current,
            model: m.clone(),
        })
        .collect();
    Json(ModelListResponse {
        total_count: models.len(),
        models,
        current_model: current,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectModelRequest {
    pub model_id: Option<String>,
}

/// POST /api/models/select
/// The selection applies to later runs that do not name a model.
pub async fn handle_select_model(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let req: SelectModelRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SelectModelRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?
    };
    let model_id = req
        .model_id
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::Validation("model_id is required".into()))?;

    let model = state
        .models
        .select(model_id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown model '{model_id}'")))?;

    Ok(Json(json!({
        "message": format!("Selected model {}", model.model_name),
        "model": model
    })))
}

/// GET /api/models/current
pub async fn handle_current_model(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "model": state.models.current() }))
}
