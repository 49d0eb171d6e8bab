use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};

use crate::bridge::runner::SyncStatus;
use crate::bridge::SyncRequest;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/service/fetch_news
/// Body `{date?, force_refresh?, model_id?}`; an empty body syncs today.
pub async fn handle_fetch_news(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request: SyncRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SyncRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?
    };

    let date = state
        .sync
        .start(request)
        .map_err(|status| AppError::Conflict(Box::new(status)))?;

    Ok(Json(json!({
        "message": format!("News sync started for {date}"),
        "date": date
    })))
}

/// GET /api/service/fetch_status
pub async fn handle_fetch_status(State(state): State<AppState>) -> Json<SyncStatus> {
    Json(state.sync.status())
}
