//! Source Reader: pulls a bounded number of entries from each feed and
//! normalizes them into `Article`s.
//!
//! Per-source failures are logged and skipped. Only a run where every source
//! failed is an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use feed_rs::model::Entry;
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::clock::shanghai;
use crate::models::news::{Article, Source};

/// Entries taken from the head of each feed.
pub const MAX_ARTICLES_PER_SOURCE: usize = 10;
/// Entries further than this many days from the target date are dropped.
pub const FRESHNESS_WINDOW_DAYS: i64 = 3;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; ai-news-agent/0.1)";

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed returned status {0}")]
    Status(u16),

    #[error("Feed parse error: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),

    #[error("All {0} sources failed")]
    AllSourcesFailed(usize),
}

/// Downloads a raw feed document.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ReaderError>;
}

pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ReaderError> {
        Ok(Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .build()?,
        })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ReaderError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReaderError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Clone)]
pub struct SourceReader {
    fetcher: Arc<dyn FeedFetcher>,
    politeness_delay: Duration,
}

impl SourceReader {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, politeness_delay: Duration) -> Self {
        Self {
            fetcher,
            politeness_delay,
        }
    }

    /// Reads every source in declaration order; entries keep feed order.
    pub async fn fetch_all(
        &self,
        sources: &[Source],
        target_date: NaiveDate,
    ) -> Result<Vec<Article>, ReaderError> {
        info!("Fetching {} sources for {target_date}", sources.len());

        let mut articles = Vec::new();
        let mut failures = 0;

        for (i, source) in sources.iter().enumerate() {
            if i > 0 && !self.politeness_delay.is_zero() {
                tokio::time::sleep(self.politeness_delay).await;
            }

            match self.fetch_source(source, target_date).await {
                Ok(mut found) => {
                    info!("Fetched {} articles from {}", found.len(), source.name);
                    articles.append(&mut found);
                }
                Err(e) => {
                    failures += 1;
                    error!("Failed to fetch {}: {e}", source.name);
                }
            }
        }

        if !sources.is_empty() && failures == sources.len() {
            return Err(ReaderError::AllSourcesFailed(failures));
        }

        info!("Fetched {} articles in total", articles.len());
        Ok(articles)
    }

    async fn fetch_source(
        &self,
        source: &Source,
        target_date: NaiveDate,
    ) -> Result<Vec<Article>, ReaderError> {
        let body = self.fetcher.fetch(&source.url).await?;
        let feed = feed_rs::parser::parse(&body[..])?;

        Ok(feed
            .entries
            .into_iter()
            .take(MAX_ARTICLES_PER_SOURCE)
            .filter_map(|entry| article_from_entry(entry, source, target_date))
            .collect())
    }
}

/// Normalizes one feed entry. Returns `None` for stale entries and entries
/// missing a title or link.
pub fn article_from_entry(entry: Entry, source: &Source, target_date: NaiveDate) -> Option<Article> {
    let published_date = entry
        .published
        .or(entry.updated)
        .map(|ts| ts.with_timezone(&shanghai()));

    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();

    if !is_fresh(published_date.map(|d| d.date_naive()), target_date) {
        return None;
    }
    if published_date.is_none() {
        info!("Entry has no publish date, keeping it: {}", truncate_chars(&title, 50));
    }

    let link = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();

    if title.is_empty() || link.is_empty() {
        warn!("Dropping entry without title or link from {}", source.name);
        return None;
    }

    let summary = entry
        .summary
        .map(|s| s.content.trim().to_string())
        .unwrap_or_default();

    let content = entry
        .content
        .and_then(|c| c.body)
        .filter(|body| !body.trim().is_empty())
        .unwrap_or_else(|| summary.clone());

    let tags = entry
        .categories
        .into_iter()
        .map(|c| c.term)
        .filter(|term| !term.is_empty())
        .collect();

    Some(Article {
        title,
        summary,
        content,
        link,
        source: source.name.clone(),
        source_description: source.description.clone(),
        published_date,
        tags,
    })
}

/// Feed timestamps are unreliable, so the window is loose and undated
/// entries are kept.
pub fn is_fresh(published: Option<NaiveDate>, target_date: NaiveDate) -> bool {
    match published {
        Some(date) => (date - target_date).num_days().abs() <= FRESHNESS_WINDOW_DAYS,
        None => true,
    }
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
