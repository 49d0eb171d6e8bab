use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::clock::TIMEZONE_NAME;
use crate::state::AppState;

/// GET /api/health
/// Liveness check. Reports the zone every timestamp is produced in.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let now = state.clock.now();
    Json(json!({
        "status": "ok",
        "service": "ai-news-agent",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": now,
        "timezone": TIMEZONE_NAME,
        "utc_offset": now.offset().to_string()
    }))
}
