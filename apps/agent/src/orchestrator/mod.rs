//! Fetch Orchestrator: single-flight background collection runs with
//! percentage progress published through `StatusTracker`.
//!
//! States: Idle -> Fetching -> (Completed | Failed). The Idle -> Fetching
//! transition happens inside `start`, before the task is spawned, so a poller
//! that reads the status right after a successful trigger sees Fetching.

pub mod collection;
pub mod status;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::models::report::DailyReport;
use crate::orchestrator::status::{FetchGuard, FetchStatus, StatusTracker};
use crate::report::store::StoreError;
use crate::sources::reader::ReaderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    pub target_date: NaiveDate,
    pub model_id: Option<String>,
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("source reading failed: {0}")]
    Reader(#[from] ReaderError),

    #[error("report persistence failed: {0}")]
    Store(#[from] StoreError),
}

/// The body of one run. Publishes its own checkpoints through `progress`.
#[async_trait]
pub trait Collector: Send + Sync {
    async fn run(&self, job: &FetchJob, progress: &StatusTracker) -> Result<DailyReport, CollectError>;
}

#[derive(Clone)]
pub struct Orchestrator {
    status: StatusTracker,
    collector: Arc<dyn Collector>,
}

impl Orchestrator {
    pub fn new(status: StatusTracker, collector: Arc<dyn Collector>) -> Self {
        Self { status, collector }
    }

    pub fn status(&self) -> FetchStatus {
        self.status.snapshot()
    }

    /// Starts a run in the background. Returns the in-flight status, unchanged,
    /// if a run is already going. There is no queueing and no cancellation.
    pub fn start(&self, job: FetchJob) -> Result<(), FetchStatus> {
        self.status
            .try_begin(&format!("Starting news collection for {}", job.target_date))?;
        info!(
            "Accepted fetch for {} (model: {})",
            job.target_date,
            job.model_id.as_deref().unwrap_or("default")
        );

        let status = self.status.clone();
        let collector = self.collector.clone();
        tokio::spawn(async move {
            let _guard = FetchGuard(status.clone());
            match collector.run(&job, &status).await {
                Ok(report) if report.is_empty() => {
                    status.complete(format!("Completed with no news for {}", job.target_date))
                }
                Ok(report) => status.complete(format!(
                    "Completed: {} news items for {}",
                    report.total_count, job.target_date
                )),
                Err(e) => status.fail(&e.to_string()),
            }
        });

        Ok(())
    }
}
