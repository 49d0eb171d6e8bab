use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::history::{FetchHistoryRow, HistoryEntry};
use crate::models::news::{NewsDraft, NewsFilter, NewsRecord};
use crate::store::{NewsStore, StoreError};

#[derive(Clone)]
pub struct PgNewsStore {
    pool: PgPool,
}

impl PgNewsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NewsStore for PgNewsStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<NewsRecord>, StoreError> {
        let record = sqlx::query_as("SELECT * FROM news_items WHERE url = $1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_by_title_source(
        &self,
        title: &str,
        source: &str,
    ) -> Result<Option<NewsRecord>, StoreError> {
        let record = sqlx::query_as(
            "SELECT * FROM news_items WHERE title = $1 AND source = $2 ORDER BY created_at LIMIT 1",
        )
        .bind(title)
        .bind(source)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn insert(&self, record: &NewsRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO news_items
                (id, title, source, content, summary, url, category, importance,
                 key_points, timestamp, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.source)
        .bind(&record.content)
        .bind(&record.summary)
        .bind(&record.url)
        .bind(&record.category)
        .bind(&record.importance)
        .bind(&record.key_points)
        .bind(record.timestamp)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        draft: &NewsDraft,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE news_items
            SET title = $2, source = $3, content = $4, summary = $5, category = $6,
                importance = $7, key_points = $8, timestamp = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.source)
        .bind(&draft.content)
        .bind(&draft.summary)
        .bind(&draft.category)
        .bind(&draft.importance)
        .bind(&draft.key_points)
        .bind(draft.timestamp)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(id));
        }
        Ok(())
    }

    async fn list(&self, filter: &NewsFilter) -> Result<Vec<NewsRecord>, StoreError> {
        let records = sqlx::query_as(
            r#"
            SELECT * FROM news_items
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR importance = $2)
            ORDER BY timestamp DESC
            LIMIT $3
            "#,
        )
        .bind(&filter.category)
        .bind(&filter.importance)
        .bind(filter.effective_limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn record_history(
        &self,
        entry: &HistoryEntry,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO fetch_history (id, fetch_date, news_count, status, log_message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (fetch_date) DO UPDATE
            SET news_count = EXCLUDED.news_count,
                status = EXCLUDED.status,
                log_message = EXCLUDED.log_message,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.fetch_date)
        .bind(entry.news_count)
        .bind(entry.status.as_str())
        .bind(&entry.log_message)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn history(&self, limit: i64) -> Result<Vec<FetchHistoryRow>, StoreError> {
        let rows = sqlx::query_as("SELECT * FROM fetch_history ORDER BY fetch_date DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
