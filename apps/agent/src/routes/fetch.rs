use axum::{body::Bytes, extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::orchestrator::status::FetchStatus;
use crate::orchestrator::FetchJob;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FetchRequest {
    pub date: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
    pub model_id: Option<String>,
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

/// POST /api/fetch-news
/// The body is optional; an empty body fetches today's news with the
/// selected model.
pub async fn handle_fetch_news(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let req: FetchRequest = if body.iter().all(u8::is_ascii_whitespace) {
        FetchRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?
    };

    let target_date = match req.date.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(raw) => parse_date(raw)?,
        None => state.clock.today(),
    };

    let model_id = match req.model_id.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(id) => match state.models.get(id) {
            Some(model) => Some(model.model_id.clone()),
            None => return Err(AppError::Validation(format!("Unknown model '{id}'"))),
        },
        None => state.models.selected(),
    };

    let current = state.orchestrator.status();
    if current.is_fetching {
        return Err(AppError::Conflict(Box::new(current)));
    }

    if !req.force_refresh {
        if let Some(report) = state.reports.load(target_date).await? {
            info!("Report for {target_date} already exists, not refetching");
            return Ok(Json(json!({
                "message": format!("A report for {target_date} already exists; set force_refresh to fetch again"),
                "report": report,
                "force_refresh_required": true
            })));
        }
    }

    let job = FetchJob {
        target_date,
        model_id,
    };
    state
        .orchestrator
        .start(job)
        .map_err(|status| AppError::Conflict(Box::new(status)))?;

    Ok(Json(json!({
        "message": format!("Started fetching news for {target_date}"),
        "target_date": target_date
    })))
}

/// GET /api/fetch-status
pub async fn handle_fetch_status(State(state): State<AppState>) -> Json<FetchStatus> {
    Json(state.orchestrator.status())
}

/// GET /api/sources
pub async fn handle_sources(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "sources": state.sources.as_slice(),
        "total_count": state.sources.len()
    }))
}
