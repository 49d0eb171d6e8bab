use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Success,
    Partial,
    Failed,
}

impl HistoryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryStatus::Success => "success",
            HistoryStatus::Partial => "partial",
            HistoryStatus::Failed => "failed",
        }
    }
}

/// One bridge run's outcome, written once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub fetch_date: NaiveDate,
    pub news_count: i32,
    pub status: HistoryStatus,
    pub log_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FetchHistoryRow {
    pub id: Uuid,
    pub fetch_date: NaiveDate,
    pub news_count: i32,
    pub status: String,
    pub log_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
