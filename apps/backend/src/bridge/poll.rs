//! Waiting for the agent to finish a run.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::bridge::client::{AgentApi, AgentError, AgentPhase, AgentStatus};

/// Case-insensitive markers of an unfinished run, checked only when the agent
/// does not report a phase.
pub const IN_PROGRESS_KEYWORDS: &[&str] = &[
    "processing",
    "fetching",
    "analyzing",
    "处理",
    "抓取",
    "分析",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Extra wait after completion before the report is read.
    pub grace: Duration,
    /// `None` polls forever.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            grace: Duration::from_secs(3),
            max_attempts: None,
        }
    }
}

/// Done means not fetching, progress exactly 100, and either a `completed`
/// phase or (without a phase) a message free of in-progress keywords.
pub fn is_strict_done(status: &AgentStatus) -> bool {
    if status.is_fetching || status.progress != 100 {
        return false;
    }
    match status.phase {
        Some(AgentPhase::Unknown) | None => {
            let message = status.message.to_lowercase();
            !IN_PROGRESS_KEYWORDS.iter().any(|k| message.contains(k))
        }
        Some(phase) => phase == AgentPhase::Completed,
    }
}

/// Polls until strict-done. Poll errors are logged and retried; a `failed`
/// phase ends the wait with the agent's error.
pub async fn wait_until_done(
    agent: &dyn AgentApi,
    policy: &PollPolicy,
) -> Result<AgentStatus, AgentError> {
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match agent.status().await {
            Ok(status) if is_strict_done(&status) => {
                info!("Agent finished after {attempts} polls: {}", status.message);
                return Ok(status);
            }
            Ok(status) if !status.is_fetching && status.phase == Some(AgentPhase::Failed) => {
                let error = status
                    .last_error
                    .clone()
                    .unwrap_or_else(|| status.message.clone());
                return Err(AgentError::RunFailed(error));
            }
            Ok(status) => debug!("Agent at {}%: {}", status.progress, status.message),
            Err(e) => warn!("Status poll {attempts} failed, will retry: {e}"),
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(AgentError::PollExhausted { attempts });
        }
        tokio::time::sleep(policy.interval).await;
    }
}
