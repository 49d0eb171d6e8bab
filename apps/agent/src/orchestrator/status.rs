//! Shared fetch status: the only cross-task mutable state in the agent.
//!
//! Every mutation is a short critical section; readers get a snapshot copied
//! under the same lock.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPhase {
    Idle,
    Fetching,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchStatus {
    pub is_fetching: bool,
    pub progress: u8,
    pub message: String,
    pub phase: FetchPhase,
    pub start_time: Option<DateTime<FixedOffset>>,
    pub estimated_completion: Option<DateTime<FixedOffset>>,
    pub last_error: Option<String>,
}

impl Default for FetchStatus {
    fn default() -> Self {
        Self {
            is_fetching: false,
            progress: 0,
            message: String::new(),
            phase: FetchPhase::Idle,
            start_time: None,
            estimated_completion: None,
            last_error: None,
        }
    }
}

#[derive(Clone)]
pub struct StatusTracker {
    inner: Arc<Mutex<FetchStatus>>,
    clock: Arc<dyn Clock>,
}

impl StatusTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FetchStatus::default())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FetchStatus> {
        // A panic while holding the lock cannot leave a half-written status:
        // every update assigns whole fields.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> FetchStatus {
        self.lock().clone()
    }

    /// Idle -> Fetching. Fails with the current snapshot, untouched, when a
    /// fetch is already running.
    pub fn try_begin(&self, message: &str) -> Result<(), FetchStatus> {
        let mut status = self.lock();
        if status.is_fetching {
            return Err(status.clone());
        }
        *status = FetchStatus {
            is_fetching: true,
            progress: 0,
            message: message.to_string(),
            phase: FetchPhase::Fetching,
            start_time: Some(self.clock.now()),
            estimated_completion: None,
            last_error: None,
        };
        Ok(())
    }

    /// Publishes a checkpoint. Progress never moves backwards during a run.
    pub fn update(&self, progress: u8, message: impl Into<String>) {
        let message = message.into();
        let mut status = self.lock();
        if !status.is_fetching {
            return;
        }
        status.progress = status.progress.max(progress.min(100));
        status.message = message;
        info!("Fetch progress {}% - {}", status.progress, status.message);
    }

    pub fn complete(&self, message: impl Into<String>) {
        let mut status = self.lock();
        status.is_fetching = false;
        status.progress = 100;
        status.message = message.into();
        status.phase = FetchPhase::Completed;
        status.last_error = None;
        info!("Fetch completed: {}", status.message);
    }

    pub fn fail(&self, error: &str) {
        let mut status = self.lock();
        status.is_fetching = false;
        status.progress = 0;
        status.message = format!("Fetch failed: {error}");
        status.phase = FetchPhase::Failed;
        status.last_error = Some(error.to_string());
        error!("Fetch failed: {error}");
    }

    /// Clears `is_fetching` if the run ended without reaching `complete` or
    /// `fail` (for example, the task panicked).
    pub(crate) fn release(&self) {
        let mut status = self.lock();
        if status.is_fetching {
            status.is_fetching = false;
            status.progress = 0;
            status.message = "Fetch aborted".to_string();
            status.phase = FetchPhase::Failed;
            status.last_error = Some("fetch task ended unexpectedly".to_string());
            error!("Fetch task ended without a result; status released");
        }
    }
}

/// Releases the status when dropped, on every exit path of a fetch task.
pub(crate) struct FetchGuard(pub(crate) StatusTracker);

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}
