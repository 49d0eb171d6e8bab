use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::history::{FetchHistoryRow, HistoryEntry};
use crate::models::news::{NewsDraft, NewsFilter, NewsRecord};
use crate::store::{NewsStore, StoreError};

/// In-process store, selected with `DATABASE_URL=memory://`. Contents are
/// lost on restart.
#[derive(Clone, Default)]
pub struct MemoryNewsStore {
    records: Arc<RwLock<Vec<NewsRecord>>>,
    history: Arc<RwLock<Vec<FetchHistoryRow>>>,
}

impl MemoryNewsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl NewsStore for MemoryNewsStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<NewsRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.url.as_deref() == Some(url))
            .cloned())
    }

    async fn find_by_title_source(
        &self,
        title: &str,
        source: &str,
    ) -> Result<Option<NewsRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.title == title && r.source == source)
            .cloned())
    }

    async fn insert(&self, record: &NewsRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        draft: &NewsDraft,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::Missing(id))?;
        let created_at = record.created_at;
        *record = draft.clone().into_record(id, updated_at);
        record.created_at = created_at;
        Ok(())
    }

    async fn list(&self, filter: &NewsFilter) -> Result<Vec<NewsRecord>, StoreError> {
        let mut records: Vec<NewsRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| filter.category.as_ref().map_or(true, |c| &r.category == c))
            .filter(|r| filter.importance.as_ref().map_or(true, |i| &r.importance == i))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(filter.effective_limit() as usize);
        Ok(records)
    }

    async fn record_history(
        &self,
        entry: &HistoryEntry,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut history = self.history.write().await;
        history.retain(|h| h.fetch_date != entry.fetch_date);
        history.push(FetchHistoryRow {
            id: Uuid::new_v4(),
            fetch_date: entry.fetch_date,
            news_count: entry.news_count,
            status: entry.status.as_str().to_string(),
            log_message: entry.log_message.clone(),
            created_at: at,
        });
        Ok(())
    }

    async fn history(&self, limit: i64) -> Result<Vec<FetchHistoryRow>, StoreError> {
        let mut rows = self.history.read().await.clone();
        rows.sort_by(|a, b| b.fetch_date.cmp(&a.fetch_date));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}
