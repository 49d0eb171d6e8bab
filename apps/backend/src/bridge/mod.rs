//! Cross-service bridge: triggers the agent, waits for it, then pulls the
//! finished report and upserts it into the news store.

pub mod client;
pub mod poll;
pub mod runner;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::bridge::client::{AgentApi, AgentError, StructuredItem, TriggerOutcome, TriggerRequest};
use crate::bridge::poll::{wait_until_done, PollPolicy};
use crate::clock::Clock;
use crate::models::history::{HistoryEntry, HistoryStatus};
use crate::models::news::NewsDraft;
use crate::store::{upsert, NewsStore, UpsertOutcome};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub force_refresh: bool,
    pub model_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub date: NaiveDate,
    /// Date of the report actually used; the previous day when the target
    /// day had no news.
    pub report_date: NaiveDate,
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl SyncSummary {
    pub fn stored(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("No news available for {date} or {previous}")]
    NoNews { date: NaiveDate, previous: NaiveDate },
}

pub struct Bridge {
    agent: Arc<dyn AgentApi>,
    store: Arc<dyn NewsStore>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
}

impl Bridge {
    pub fn new(
        agent: Arc<dyn AgentApi>,
        store: Arc<dyn NewsStore>,
        clock: Arc<dyn Clock>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            agent,
            store,
            clock,
            policy,
        }
    }

    /// Runs one sync and records exactly one history entry for it, whatever
    /// the outcome.
    pub async fn run(&self, request: SyncRequest) -> Result<SyncSummary, BridgeError> {
        let date = request.date.unwrap_or_else(|| self.clock.today());
        info!("Starting news sync for {date}");

        let result = self.sync(date, &request).await;

        let entry = match &result {
            Ok(summary) => HistoryEntry {
                fetch_date: date,
                news_count: summary.stored() as i32,
                status: if summary.failed == 0 {
                    HistoryStatus::Success
                } else {
                    HistoryStatus::Partial
                },
                log_message: Some(format!(
                    "Report {}: {} fetched, {} inserted, {} updated, {} unchanged, {} failed",
                    summary.report_date,
                    summary.fetched,
                    summary.inserted,
                    summary.updated,
                    summary.unchanged,
                    summary.failed
                )),
            },
            Err(e) => HistoryEntry {
                fetch_date: date,
                news_count: 0,
                status: HistoryStatus::Failed,
                log_message: Some(e.to_string()),
            },
        };
        if let Err(e) = self.store.record_history(&entry, self.clock.now()).await {
            error!("Failed to record fetch history for {date}: {e}");
        }

        match &result {
            Ok(summary) => info!("News sync for {date} finished: {summary:?}"),
            Err(e) => error!("News sync for {date} failed: {e}"),
        }
        result
    }

    async fn sync(&self, date: NaiveDate, request: &SyncRequest) -> Result<SyncSummary, BridgeError> {
        let trigger = TriggerRequest {
            date: Some(date),
            force_refresh: request.force_refresh,
            model_id: request.model_id.clone(),
        };

        match self.agent.trigger(&trigger).await? {
            TriggerOutcome::Started => {
                info!("Agent started collecting news for {date}");
                self.wait_for_agent().await?;
            }
            TriggerOutcome::AlreadyRunning => {
                warn!("Agent is already collecting; waiting for that run instead");
                self.wait_for_agent().await?;
            }
            TriggerOutcome::ReportExists => {
                info!("Agent already has a report for {date}; using it as is");
            }
        }

        let (report_date, items) = self.fetch_items(date).await?;
        Ok(self.persist(date, report_date, items).await)
    }

    async fn wait_for_agent(&self) -> Result<(), AgentError> {
        wait_until_done(self.agent.as_ref(), &self.policy).await?;
        // Covers the agent flushing its report files after reporting done.
        tokio::time::sleep(self.policy.grace).await;
        Ok(())
    }

    /// The target day's items, or the previous day's when the target is empty.
    async fn fetch_items(&self, date: NaiveDate) -> Result<(NaiveDate, Vec<StructuredItem>), BridgeError> {
        let items = self.agent.structured_news(date).await?;
        if !items.is_empty() {
            return Ok((date, items));
        }

        let previous = date.pred_opt().unwrap_or(date);
        warn!("No news for {date}, trying {previous}");
        let items = self.agent.structured_news(previous).await?;
        if items.is_empty() {
            return Err(BridgeError::NoNews { date, previous });
        }
        Ok((previous, items))
    }

    async fn persist(&self, date: NaiveDate, report_date: NaiveDate, items: Vec<StructuredItem>) -> SyncSummary {
        let mut summary = SyncSummary {
            date,
            report_date,
            fetched: items.len(),
            inserted: 0,
            updated: 0,
            unchanged: 0,
            failed: 0,
        };

        let now = self.clock.now();
        for item in items {
            let title = item.title.clone();
            let draft = draft_from_item(item, report_date);
            match upsert(self.store.as_ref(), draft, now).await {
                Ok(UpsertOutcome::Inserted(_)) => summary.inserted += 1,
                Ok(UpsertOutcome::Updated { id, update_fields }) => {
                    debug!("Updated {id}: {update_fields:?}");
                    summary.updated += 1;
                }
                Ok(UpsertOutcome::Unchanged(_)) => summary.unchanged += 1,
                Err(e) => {
                    error!("Failed to store '{title}': {e}");
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}

/// Items without a timestamp are pinned to midnight (UTC+8) of the report
/// date so repeated syncs compare equal. Timestamps keep microseconds only,
/// matching what a `TIMESTAMPTZ` column stores.
fn draft_from_item(item: StructuredItem, report_date: NaiveDate) -> NewsDraft {
    let url = item.link().map(String::from);
    let timestamp = item
        .timestamp
        .map(|ts| ts.with_timezone(&Utc).trunc_subsecs(6))
        .unwrap_or_else(|| start_of_day(report_date));

    NewsDraft {
        title: item.title.trim().to_string(),
        source: item.source,
        content: item.content,
        summary: item.summary,
        url,
        category: item.category,
        importance: item.importance,
        key_points: item.key_points,
        timestamp,
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    FixedOffset::east_opt(8 * 3600)
        .and_then(|offset| midnight.and_local_timezone(offset).single())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use tokio::sync::Notify;
    use uuid::Uuid;

    use crate::bridge::client::{AgentPhase, AgentStatus};
    use crate::clock::FixedClock;
    use crate::models::history::FetchHistoryRow;
    use crate::models::news::{NewsFilter, NewsRecord};
    use crate::store::memory::MemoryNewsStore;
    use crate::store::StoreError;

    /// Fake agent. Statuses are served in order; once exhausted it reports a
    /// run that is still going.
    pub(crate) struct ScriptedAgent {
        trigger: Mutex<Result<TriggerOutcome, u16>>,
        statuses: Mutex<VecDeque<Result<AgentStatus, ()>>>,
        news: Mutex<HashMap<NaiveDate, Vec<StructuredItem>>>,
        gate: Option<Arc<Notify>>,
        polls: AtomicU32,
        pub(crate) triggers: Mutex<Vec<TriggerRequest>>,
    }

    impl ScriptedAgent {
        pub(crate) fn with_statuses(statuses: Vec<Result<AgentStatus, ()>>) -> Self {
            Self {
                trigger: Mutex::new(Ok(TriggerOutcome::Started)),
                statuses: Mutex::new(statuses.into()),
                news: Mutex::new(HashMap::new()),
                gate: None,
                polls: AtomicU32::new(0),
                triggers: Mutex::new(Vec::new()),
            }
        }

        /// Finishes on the first poll.
        pub(crate) fn finishing() -> Self {
            Self::with_statuses(vec![Ok(done())])
        }

        pub(crate) fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::finishing()
            }
        }

        pub(crate) fn set_trigger(&self, outcome: Result<TriggerOutcome, u16>) {
            *self.trigger.lock().unwrap() = outcome;
        }

        pub(crate) fn push_status(&self, status: AgentStatus) {
            self.statuses.lock().unwrap().push_back(Ok(status));
        }

        pub(crate) fn set_news(&self, date: NaiveDate, items: Vec<StructuredItem>) {
            self.news.lock().unwrap().insert(date, items);
        }

        pub(crate) fn polls(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AgentApi for ScriptedAgent {
        async fn trigger(&self, request: &TriggerRequest) -> Result<TriggerOutcome, AgentError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.triggers.lock().unwrap().push(request.clone());
            let outcome = *self.trigger.lock().unwrap();
            outcome.map_err(|status| AgentError::Status {
                status,
                body: "scripted failure".into(),
            })
        }

        async fn status(&self) -> Result<AgentStatus, AgentError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            match self.statuses.lock().unwrap().pop_front() {
                Some(Ok(status)) => Ok(status),
                Some(Err(())) => Err(AgentError::Status {
                    status: 503,
                    body: "unavailable".into(),
                }),
                None => Ok(AgentStatus {
                    is_fetching: true,
                    progress: 40,
                    message: "Analyzing article 1/9".into(),
                    phase: Some(AgentPhase::Fetching),
                    last_error: None,
                }),
            }
        }

        async fn structured_news(&self, date: NaiveDate) -> Result<Vec<StructuredItem>, AgentError> {
            Ok(self.news.lock().unwrap().get(&date).cloned().unwrap_or_default())
        }
    }

    pub(crate) fn done() -> AgentStatus {
        AgentStatus {
            is_fetching: false,
            progress: 100,
            message: "Completed: 2 news items".into(),
            phase: Some(AgentPhase::Completed),
            last_error: None,
        }
    }

    pub(crate) fn news_item(title: &str, url: &str) -> StructuredItem {
        StructuredItem {
            title: title.into(),
            source: "Feed".into(),
            content: "body".into(),
            summary: format!("{title} summary"),
            original_link: url.into(),
            url: url.into(),
            category: "product_release".into(),
            importance: "high".into(),
            key_points: vec!["k1".into(), "k2".into(), "k3".into()],
            timestamp: Some(
                DateTime::parse_from_rfc3339("2024-06-10T09:30:00+08:00").unwrap(),
            ),
        }
    }

    pub(crate) fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    pub(crate) fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 6, 10, 2, 0, 0).unwrap()))
    }

    fn bridge(agent: Arc<ScriptedAgent>, store: Arc<dyn NewsStore>) -> Bridge {
        Bridge::new(agent, store, clock(), PollPolicy::default())
    }

    async fn history(store: &dyn NewsStore) -> Vec<FetchHistoryRow> {
        store.history(10).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_sync_inserts_and_records_history() {
        let agent = Arc::new(ScriptedAgent::with_statuses(vec![
            Ok(AgentStatus {
                is_fetching: true,
                progress: 15,
                message: "Fetching RSS articles...".into(),
                phase: Some(AgentPhase::Fetching),
                last_error: None,
            }),
            Ok(done()),
        ]));
        agent.set_news(date(10), vec![news_item("A", "https://a"), news_item("B", "https://b")]);
        let store = Arc::new(MemoryNewsStore::new());

        let summary = bridge(agent.clone(), store.clone())
            .run(SyncRequest {
                model_id: Some("m".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.report_date, date(10));
        assert_eq!(agent.polls(), 2);
        let trigger = agent.triggers.lock().unwrap()[0].clone();
        assert_eq!(trigger.date, Some(date(10)));
        assert_eq!(trigger.model_id.as_deref(), Some("m"));

        let rows = history(store.as_ref()).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "success");
        assert_eq!(rows[0].news_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_is_idempotent_and_detects_summary_change() {
        let agent = Arc::new(ScriptedAgent::finishing());
        agent.set_news(date(10), vec![news_item("A", "https://a"), news_item("B", "https://b")]);
        let store = Arc::new(MemoryNewsStore::new());
        let bridge = bridge(agent.clone(), store.clone());
        bridge.run(SyncRequest::default()).await.unwrap();

        agent.push_status(done());
        let again = bridge.run(SyncRequest::default()).await.unwrap();
        assert_eq!((again.inserted, again.updated, again.unchanged), (0, 0, 2));

        let mut changed = news_item("B", "https://b");
        changed.summary = "B, revised".into();
        agent.set_news(date(10), vec![news_item("A", "https://a"), changed]);
        agent.push_status(done());
        let third = bridge.run(SyncRequest::default()).await.unwrap();
        assert_eq!((third.inserted, third.updated, third.unchanged), (0, 1, 1));

        assert_eq!(store.len().await, 2);
        assert_eq!(history(store.as_ref()).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflict_still_waits_for_running_fetch() {
        let agent = Arc::new(ScriptedAgent::finishing());
        agent.set_trigger(Ok(TriggerOutcome::AlreadyRunning));
        agent.set_news(date(10), vec![news_item("A", "https://a")]);
        let store = Arc::new(MemoryNewsStore::new());

        let summary = bridge(agent.clone(), store).run(SyncRequest::default()).await.unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(agent.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_report_skips_polling() {
        let agent = Arc::new(ScriptedAgent::with_statuses(vec![]));
        agent.set_trigger(Ok(TriggerOutcome::ReportExists));
        agent.set_news(date(10), vec![news_item("A", "https://a")]);
        let store = Arc::new(MemoryNewsStore::new());

        let summary = bridge(agent.clone(), store).run(SyncRequest::default()).await.unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(agent.polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_day_falls_back_to_previous_day_once() {
        let agent = Arc::new(ScriptedAgent::finishing());
        agent.set_news(date(9), vec![news_item("Yesterday", "https://y")]);
        let store = Arc::new(MemoryNewsStore::new());

        let summary = bridge(agent, store).run(SyncRequest::default()).await.unwrap();
        assert_eq!(summary.report_date, date(9));
        assert_eq!(summary.inserted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_news_fails_with_single_history_entry() {
        let agent = Arc::new(ScriptedAgent::finishing());
        let store = Arc::new(MemoryNewsStore::new());

        let err = bridge(agent, store.clone()).run(SyncRequest::default()).await.unwrap_err();
        assert!(matches!(err, BridgeError::NoNews { .. }));

        let rows = history(store.as_ref()).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "failed");
        assert_eq!(rows[0].fetch_date, date(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_failure_is_surfaced() {
        let agent = Arc::new(ScriptedAgent::finishing());
        agent.set_trigger(Err(502));
        let store = Arc::new(MemoryNewsStore::new());

        let err = bridge(agent.clone(), store.clone())
            .run(SyncRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Agent(AgentError::Status { status: 502, .. })));
        assert_eq!(agent.polls(), 0);
        assert_eq!(history(store.as_ref()).await[0].status, "failed");
    }

    /// Rejects inserts of one title.
    struct RejectingStore {
        inner: MemoryNewsStore,
        title: &'static str,
    }

    #[async_trait]
    impl NewsStore for RejectingStore {
        async fn find_by_url(&self, url: &str) -> Result<Option<NewsRecord>, StoreError> {
            self.inner.find_by_url(url).await
        }

        async fn find_by_title_source(
            &self,
            title: &str,
            source: &str,
        ) -> Result<Option<NewsRecord>, StoreError> {
            self.inner.find_by_title_source(title, source).await
        }

        async fn insert(&self, record: &NewsRecord) -> Result<(), StoreError> {
            if record.title == self.title {
                return Err(StoreError::Missing(Uuid::nil()));
            }
            self.inner.insert(record).await
        }

        async fn update(
            &self,
            id: Uuid,
            draft: &NewsDraft,
            updated_at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.inner.update(id, draft, updated_at).await
        }

        async fn list(&self, filter: &NewsFilter) -> Result<Vec<NewsRecord>, StoreError> {
            self.inner.list(filter).await
        }

        async fn record_history(
            &self,
            entry: &HistoryEntry,
            at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.inner.record_history(entry, at).await
        }

        async fn history(&self, limit: i64) -> Result<Vec<FetchHistoryRow>, StoreError> {
            self.inner.history(limit).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_failure_is_skipped_and_marks_partial() {
        let agent = Arc::new(ScriptedAgent::finishing());
        agent.set_news(
            date(10),
            vec![
                news_item("A", "https://a"),
                news_item("Broken", "https://broken"),
                news_item("C", "https://c"),
            ],
        );
        let store = Arc::new(RejectingStore {
            inner: MemoryNewsStore::new(),
            title: "Broken",
        });

        let summary = bridge(agent, store.clone()).run(SyncRequest::default()).await.unwrap();
        assert_eq!((summary.inserted, summary.failed), (2, 1));

        let rows = history(store.as_ref()).await;
        assert_eq!(rows[0].status, "partial");
        assert_eq!(rows[0].news_count, 2);
    }

    #[tokio::test]
    async fn test_nanosecond_timestamp_matches_microsecond_row() {
        let mut item = news_item("A", "https://a");
        item.timestamp =
            Some(DateTime::parse_from_rfc3339("2024-06-10T09:30:00.123456789+08:00").unwrap());
        let store = MemoryNewsStore::new();

        // Row as a TIMESTAMPTZ column hands it back.
        let mut stored = draft_from_item(item.clone(), date(10)).into_record(Uuid::new_v4(), Utc::now());
        stored.timestamp =
            Utc.with_ymd_and_hms(2024, 6, 10, 1, 30, 0).unwrap() + chrono::Duration::microseconds(123_456);
        store.insert(&stored).await.unwrap();

        let draft = draft_from_item(item, date(10));
        assert!(draft.diff_fields(&stored).is_empty());
        let outcome = upsert(&store, draft, Utc::now()).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged(stored.id));
    }

    #[test]
    fn test_missing_timestamp_pins_to_report_midnight() {
        let mut item = news_item("A", "");
        item.timestamp = None;
        let draft = draft_from_item(item, date(10));
        assert_eq!(draft.url, None);
        assert_eq!(
            draft.timestamp,
            Utc.with_ymd_and_hms(2024, 6, 9, 16, 0, 0).unwrap()
        );
    }
}
