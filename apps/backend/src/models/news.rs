use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored news record. At most one row exists per non-null `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NewsRecord {
    pub id: Uuid,
    pub title: String,
    pub source: String,
    pub content: String,
    pub summary: String,
    pub url: Option<String>,
    pub category: String,
    pub importance: String,
    pub key_points: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The semantic content of a record, as received from the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsDraft {
    pub title: String,
    pub source: String,
    pub content: String,
    pub summary: String,
    pub url: Option<String>,
    pub category: String,
    pub importance: String,
    pub key_points: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl NewsDraft {
    /// Names of the compared fields whose values differ from `existing`,
    /// in a fixed order.
    pub fn diff_fields(&self, existing: &NewsRecord) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.title != existing.title {
            changed.push("title");
        }
        if self.source != existing.source {
            changed.push("source");
        }
        if self.content != existing.content {
            changed.push("content");
        }
        if self.summary != existing.summary {
            changed.push("summary");
        }
        if self.category != existing.category {
            changed.push("category");
        }
        if self.importance != existing.importance {
            changed.push("importance");
        }
        if self.key_points != existing.key_points {
            changed.push("key_points");
        }
        if self.timestamp != existing.timestamp {
            changed.push("timestamp");
        }
        changed
    }

    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> NewsRecord {
        NewsRecord {
            id,
            title: self.title,
            source: self.source,
            content: self.content,
            summary: self.summary,
            url: self.url,
            category: self.category,
            importance: self.importance,
            key_points: self.key_points,
            timestamp: self.timestamp,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filters for `GET /api/news`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsFilter {
    pub category: Option<String>,
    pub importance: Option<String>,
    pub limit: Option<i64>,
}

impl NewsFilter {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}
