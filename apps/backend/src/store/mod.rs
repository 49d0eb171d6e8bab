//! Durable news storage and the idempotent upsert policy applied on top of it.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::history::{FetchHistoryRow, HistoryEntry};
use crate::models::news::{NewsDraft, NewsFilter, NewsRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record {0} not found")]
    Missing(Uuid),
}

#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn find_by_url(&self, url: &str) -> Result<Option<NewsRecord>, StoreError>;

    async fn find_by_title_source(
        &self,
        title: &str,
        source: &str,
    ) -> Result<Option<NewsRecord>, StoreError>;

    async fn insert(&self, record: &NewsRecord) -> Result<(), StoreError>;

    /// Overwrites every semantic field of record `id` and sets `updated_at`.
    async fn update(
        &self,
        id: Uuid,
        draft: &NewsDraft,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Newest first by `timestamp`.
    async fn list(&self, filter: &NewsFilter) -> Result<Vec<NewsRecord>, StoreError>;

    /// Inserts or replaces the history row for `entry.fetch_date`.
    async fn record_history(
        &self,
        entry: &HistoryEntry,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Newest fetch date first.
    async fn history(&self, limit: i64) -> Result<Vec<FetchHistoryRow>, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(Uuid),
    Updated {
        id: Uuid,
        /// Changed fields followed by `updated_at`.
        update_fields: Vec<&'static str>,
    },
    Unchanged(Uuid),
}

/// Looks the draft up by `url`, or by `(title, source)` when it has no url.
/// Inserts when absent. Writes only when at least one compared field differs.
pub async fn upsert(
    store: &dyn NewsStore,
    draft: NewsDraft,
    now: DateTime<Utc>,
) -> Result<UpsertOutcome, StoreError> {
    let existing = match draft.url.as_deref() {
        Some(url) => store.find_by_url(url).await?,
        None => {
            store
                .find_by_title_source(&draft.title, &draft.source)
                .await?
        }
    };

    let Some(existing) = existing else {
        let record = draft.into_record(Uuid::new_v4(), now);
        store.insert(&record).await?;
        return Ok(UpsertOutcome::Inserted(record.id));
    };

    let mut update_fields = draft.diff_fields(&existing);
    if update_fields.is_empty() {
        return Ok(UpsertOutcome::Unchanged(existing.id));
    }

    store.update(existing.id, &draft, now).await?;
    update_fields.push("updated_at");
    Ok(UpsertOutcome::Updated {
        id: existing.id,
        update_fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::store::memory::MemoryNewsStore;

    fn draft(title: &str, url: Option<&str>) -> NewsDraft {
        NewsDraft {
            title: title.into(),
            source: "Feed".into(),
            content: "body".into(),
            summary: format!("{title} summary"),
            url: url.map(String::from),
            category: "product_release".into(),
            importance: "medium".into(),
            key_points: vec!["k1".into(), "k2".into(), "k3".into()],
            timestamp: Utc.with_ymd_and_hms(2024, 6, 10, 1, 0, 0).unwrap(),
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_second_identical_upsert_is_a_no_op() {
        let store = MemoryNewsStore::new();
        let first = upsert(&store, draft("A", Some("https://a")), at(2)).await.unwrap();
        assert!(matches!(first, UpsertOutcome::Inserted(_)));

        let second = upsert(&store, draft("A", Some("https://a")), at(3)).await.unwrap();
        assert!(matches!(second, UpsertOutcome::Unchanged(_)));

        let stored = store.find_by_url("https://a").await.unwrap().unwrap();
        assert_eq!(stored.updated_at, at(2));
    }

    #[tokio::test]
    async fn test_summary_change_updates_only_that_field() {
        let store = MemoryNewsStore::new();
        upsert(&store, draft("A", Some("https://a")), at(2)).await.unwrap();

        let mut changed = draft("A", Some("https://a"));
        changed.summary = "Rewritten".into();
        let outcome = upsert(&store, changed, at(3)).await.unwrap();

        match outcome {
            UpsertOutcome::Updated { update_fields, .. } => {
                assert_eq!(update_fields, vec!["summary", "updated_at"]);
            }
            other => panic!("expected update, got {other:?}"),
        }
        let stored = store.find_by_url("https://a").await.unwrap().unwrap();
        assert_eq!(stored.summary, "Rewritten");
        assert_eq!(stored.created_at, at(2));
        assert_eq!(stored.updated_at, at(3));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_linkless_items_match_on_title_and_source() {
        let store = MemoryNewsStore::new();
        upsert(&store, draft("No link", None), at(2)).await.unwrap();
        let again = upsert(&store, draft("No link", None), at(3)).await.unwrap();
        assert!(matches!(again, UpsertOutcome::Unchanged(_)));

        let other = upsert(&store, draft("Other", None), at(3)).await.unwrap();
        assert!(matches!(other, UpsertOutcome::Inserted(_)));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_same_title_different_link_is_a_new_record() {
        let store = MemoryNewsStore::new();
        upsert(&store, draft("A", Some("https://a/1")), at(2)).await.unwrap();
        let outcome = upsert(&store, draft("A", Some("https://a/2")), at(2)).await.unwrap();
        assert!(matches!(outcome, UpsertOutcome::Inserted(_)));
    }
}
