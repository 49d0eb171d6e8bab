use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::errors::AppError;
use crate::models::news::{AnnotatedItem, Category, Importance};
use crate::models::report::DailyReport;
use crate::routes::fetch::parse_date;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ReportEntry {
    pub date: NaiveDate,
    pub total_count: usize,
    pub summary: String,
    pub generated_time: DateTime<FixedOffset>,
}

#[derive(Serialize)]
pub struct ReportListResponse {
    pub reports: Vec<ReportEntry>,
    pub total_count: usize,
}

/// GET /api/reports
/// Newest first. Unreadable files are skipped.
pub async fn handle_list_reports(
    State(state): State<AppState>,
) -> Result<Json<ReportListResponse>, AppError> {
    let mut reports = Vec::new();
    for date in state.reports.list_dates().await?.into_iter().rev() {
        match state.reports.load(date).await {
            Ok(Some(report)) => reports.push(ReportEntry {
                date,
                total_count: report.total_count,
                summary: report.summary,
                generated_time: report.generated_time,
            }),
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable report for {date}: {e}"),
        }
    }
    Ok(Json(ReportListResponse {
        total_count: reports.len(),
        reports,
    }))
}

/// GET /api/reports/latest
pub async fn handle_latest_report(
    State(state): State<AppState>,
) -> Result<Json<DailyReport>, AppError> {
    state
        .reports
        .latest()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No reports available".into()))
}

/// GET /api/reports/:date
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DailyReport>, AppError> {
    let date = parse_date(&raw)?;
    state
        .reports
        .load(date)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No report for {date}")))
}

/// DELETE /api/reports/:date
pub async fn handle_delete_report(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let date = parse_date(&raw)?;
    if !state.reports.delete(date).await? {
        return Err(AppError::NotFound(format!("No report for {date}")));
    }
    Ok(Json(json!({
        "message": format!("Deleted report for {date}"),
        "date": date
    })))
}

#[derive(Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// One item in the flattened shape consumed by the record-storage service.
#[derive(Debug, Serialize)]
pub struct StructuredItem {
    pub title: String,
    pub source: String,
    pub content: String,
    pub summary: String,
    pub original_link: String,
    /// Same value as `original_link`.
    pub url: String,
    pub category: Category,
    pub importance: Importance,
    pub key_points: Vec<String>,
    pub tags: Vec<String>,
    pub timestamp: DateTime<FixedOffset>,
}

impl From<AnnotatedItem> for StructuredItem {
    fn from(item: AnnotatedItem) -> Self {
        Self {
            title: item.title,
            source: item.source,
            content: item.content,
            summary: item.summary,
            url: item.original_link.clone(),
            original_link: item.original_link,
            category: item.category.structured(),
            importance: item.importance,
            key_points: item.key_points,
            tags: item.tags,
            timestamp: item.processed_time,
        }
    }
}

#[derive(Serialize)]
pub struct StructuredResponse {
    pub date: NaiveDate,
    pub total_count: usize,
    pub news_items: Vec<StructuredItem>,
}

/// GET /api/news/structured?date=YYYY-MM-DD
/// Defaults to today. A missing or empty report is a 404 that still carries
/// an empty `news_items` list.
pub async fn handle_structured_news(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Response, AppError> {
    let date = match query.date.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(raw) => parse_date(raw)?,
        None => state.clock.today(),
    };

    let report = match state.reports.load(date).await? {
        Some(report) if !report.all_news.is_empty() => report,
        _ => {
            let body = Json(json!({
                "error": {
                    "code": "NOT_FOUND",
                    "message": format!("No news for {date}")
                },
                "date": date,
                "total_count": 0,
                "news_items": []
            }));
            return Ok((StatusCode::NOT_FOUND, body).into_response());
        }
    };

    let news_items: Vec<StructuredItem> = report.all_news.into_iter().map(Into::into).collect();
    Ok(Json(StructuredResponse {
        date,
        total_count: news_items.len(),
        news_items,
    })
    .into_response())
}
