use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::history::FetchHistoryRow;
use crate::models::news::{NewsFilter, NewsRecord};
use crate::state::AppState;

const HISTORY_LIMIT: i64 = 30;

/// GET /api/news?category=&importance=&limit=
pub async fn handle_list_news(
    State(state): State<AppState>,
    Query(filter): Query<NewsFilter>,
) -> Result<Json<Vec<NewsRecord>>, AppError> {
    let filter = NewsFilter {
        category: filter.category.filter(|c| !c.is_empty()),
        importance: filter.importance.filter(|i| !i.is_empty()),
        limit: filter.limit,
    };
    Ok(Json(state.store.list(&filter).await?))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// GET /api/history
pub async fn handle_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<FetchHistoryRow>>, AppError> {
    let limit = query.limit.unwrap_or(HISTORY_LIMIT).clamp(1, 365);
    Ok(Json(state.store.history(limit).await?))
}
