//! Single-flight background execution of bridge runs.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::bridge::{Bridge, SyncRequest, SyncSummary};
use crate::clock::Clock;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncStatus {
    pub is_running: bool,
    pub current_date: Option<NaiveDate>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_summary: Option<SyncSummary>,
    pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct SyncRunner {
    bridge: Arc<Bridge>,
    clock: Arc<dyn Clock>,
    status: Arc<Mutex<SyncStatus>>,
}

fn lock(status: &Mutex<SyncStatus>) -> MutexGuard<'_, SyncStatus> {
    status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears `is_running` if the task ends without recording a result.
struct RunGuard(Arc<Mutex<SyncStatus>>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut status = lock(&self.0);
        if status.is_running {
            status.is_running = false;
            status.last_error = Some("sync task ended unexpectedly".to_string());
            error!("Sync task ended without a result; status released");
        }
    }
}

impl SyncRunner {
    pub fn new(bridge: Arc<Bridge>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bridge,
            clock,
            status: Arc::new(Mutex::new(SyncStatus::default())),
        }
    }

    pub fn status(&self) -> SyncStatus {
        lock(&self.status).clone()
    }

    /// Starts a sync in the background and returns its target date, or the
    /// current status if one is already running.
    pub fn start(&self, request: SyncRequest) -> Result<NaiveDate, SyncStatus> {
        let date = request.date.unwrap_or_else(|| self.clock.today());
        {
            let mut status = lock(&self.status);
            if status.is_running {
                return Err(status.clone());
            }
            status.is_running = true;
            status.current_date = Some(date);
            status.started_at = Some(self.clock.now());
        }
        info!("Accepted news sync for {date}");

        let request = SyncRequest {
            date: Some(date),
            ..request
        };
        let bridge = self.bridge.clone();
        let clock = self.clock.clone();
        let shared = self.status.clone();
        tokio::spawn(async move {
            let _guard = RunGuard(shared.clone());
            let result = bridge.run(request).await;

            let mut status = lock(&shared);
            status.is_running = false;
            status.finished_at = Some(clock.now());
            match result {
                Ok(summary) => {
                    status.last_summary = Some(summary);
                    status.last_error = None;
                }
                Err(e) => status.last_error = Some(e.to_string()),
            }
        });

        Ok(date)
    }
}
