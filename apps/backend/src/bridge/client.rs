//! HTTP client for the agent service, plus the wire shapes it returns.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Agent returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Agent run failed: {0}")]
    RunFailed(String),

    #[error("Agent did not finish after {attempts} polls")]
    PollExhausted { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    Idle,
    Fetching,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Status payload from `GET /api/fetch-status`. `phase` is absent on older
/// agents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentStatus {
    pub is_fetching: bool,
    pub progress: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub phase: Option<AgentPhase>,
    #[serde(default)]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StructuredItem {
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub original_link: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_importance")]
    pub importance: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

fn default_category() -> String {
    "other".to_string()
}

fn default_importance() -> String {
    "medium".to_string()
}

impl StructuredItem {
    /// The canonical link: `url`, else `original_link`, else none.
    pub fn link(&self) -> Option<&str> {
        [self.url.trim(), self.original_link.trim()]
            .into_iter()
            .find(|l| !l.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct StructuredResponse {
    #[serde(default)]
    news_items: Vec<StructuredItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub force_refresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    /// Another caller's run is in flight; its result is still worth waiting for.
    AlreadyRunning,
    /// The agent already has a report for the date and did not start a run.
    ReportExists,
}

/// The agent service as seen by the bridge.
#[async_trait]
pub trait AgentApi: Send + Sync {
    async fn trigger(&self, request: &TriggerRequest) -> Result<TriggerOutcome, AgentError>;

    async fn status(&self) -> Result<AgentStatus, AgentError>;

    /// Items of the report for `date`; empty when the agent has none.
    async fn structured_news(&self, date: NaiveDate) -> Result<Vec<StructuredItem>, AgentError>;
}

#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    base_url: String,
}

impl AgentClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AgentError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }
}

async fn status_error(response: reqwest::Response) -> AgentError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AgentError::Status { status, body }
}

#[async_trait]
impl AgentApi for AgentClient {
    async fn trigger(&self, request: &TriggerRequest) -> Result<TriggerOutcome, AgentError> {
        let response = self
            .client
            .post(self.url("fetch-news"))
            .json(request)
            .send()
            .await?;

        match response.status() {
            StatusCode::CONFLICT => Ok(TriggerOutcome::AlreadyRunning),
            status if status.is_success() => {
                let body: Value = response.json().await?;
                debug!("Agent accepted trigger: {body}");
                if body["force_refresh_required"].as_bool().unwrap_or(false) {
                    Ok(TriggerOutcome::ReportExists)
                } else {
                    Ok(TriggerOutcome::Started)
                }
            }
            _ => Err(status_error(response).await),
        }
    }

    async fn status(&self) -> Result<AgentStatus, AgentError> {
        let response = self.client.get(self.url("fetch-status")).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn structured_news(&self, date: NaiveDate) -> Result<Vec<StructuredItem>, AgentError> {
        let response = self
            .client
            .get(self.url("news/structured"))
            .query(&[("date", date.to_string())])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if status.is_success() => {
                Ok(response.json::<StructuredResponse>().await?.news_items)
            }
            _ => Err(status_error(response).await),
        }
    }
}
