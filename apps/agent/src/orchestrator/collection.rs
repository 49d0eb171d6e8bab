//! The daily collection run: read sources, annotate, build the report,
//! persist it. Checkpoints: 5/10 model selection (optional), 15 reading,
//! 40-65 annotation, 75 report, 90 persistence, 100 done.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::annotate::Annotator;
use crate::clock::Clock;
use crate::models::news::{AnnotatedItem, Article, Source};
use crate::models::report::DailyReport;
use crate::orchestrator::status::StatusTracker;
use crate::orchestrator::{CollectError, Collector, FetchJob};
use crate::report::builder::{empty_report, ReportBuilder};
use crate::report::store::ReportStore;
use crate::sources::reader::{truncate_chars, SourceReader};

const PROGRESS_MODEL_SELECT: u8 = 5;
const PROGRESS_MODEL_READY: u8 = 10;
const PROGRESS_READING: u8 = 15;
const PROGRESS_ANNOTATE_START: u8 = 40;
const PROGRESS_ANNOTATE_SPAN: usize = 25;
const PROGRESS_REPORT: u8 = 75;
const PROGRESS_SAVING: u8 = 90;
const PROGRESS_DONE: u8 = 100;

pub struct DailyCollection {
    pub sources: Vec<Source>,
    pub reader: SourceReader,
    pub annotator: Annotator,
    pub builder: ReportBuilder,
    pub store: ReportStore,
    pub clock: Arc<dyn Clock>,
}

#[async_trait]
impl Collector for DailyCollection {
    async fn run(&self, job: &FetchJob, progress: &StatusTracker) -> Result<DailyReport, CollectError> {
        let date = job.target_date;
        info!("Starting daily collection for {date}");

        if let Some(model_id) = &job.model_id {
            progress.update(PROGRESS_MODEL_SELECT, format!("Selecting model {model_id}..."));
            progress.update(PROGRESS_MODEL_READY, format!("Using model {model_id}"));
        }
        let annotator = self.annotator.with_model(job.model_id.as_deref());
        let builder = self.builder.with_model(job.model_id.as_deref());

        progress.update(PROGRESS_READING, "Fetching RSS articles...");
        let articles = self.reader.fetch_all(&self.sources, date).await?;
        if articles.is_empty() {
            warn!("No articles fetched for {date}");
            progress.update(PROGRESS_DONE, "Done, no articles found");
            return Ok(empty_report(date, self.clock.as_ref()));
        }
        let raw_count = articles.len();
        progress.update(
            PROGRESS_ANNOTATE_START,
            format!("Fetched {raw_count} articles, starting AI analysis..."),
        );

        let items = annotate_all(&annotator, articles, progress).await;
        if items.is_empty() {
            warn!("No articles survived annotation for {date}");
            progress.update(PROGRESS_DONE, "Done, no articles could be annotated");
            return Ok(empty_report(date, self.clock.as_ref()));
        }

        progress.update(PROGRESS_REPORT, "Building daily report...");
        let mut report = builder.build(date, items).await;
        report.raw_articles_count = raw_count;

        progress.update(PROGRESS_SAVING, "Saving results...");
        self.store.save(&report).await?;

        progress.update(
            PROGRESS_DONE,
            format!("Done, {} news items collected", report.total_count),
        );
        Ok(report)
    }
}

/// Annotates articles in order. Each article runs in its own task so a
/// failure drops only that article.
async fn annotate_all(
    annotator: &Annotator,
    articles: Vec<Article>,
    progress: &StatusTracker,
) -> Vec<AnnotatedItem> {
    let total = articles.len();
    let mut items = Vec::with_capacity(total);

    for (i, article) in articles.into_iter().enumerate() {
        let step = (PROGRESS_ANNOTATE_SPAN * (i + 1) / total) as u8;
        progress.update(
            PROGRESS_ANNOTATE_START + step,
            format!(
                "Analyzing article {}/{}: {}",
                i + 1,
                total,
                truncate_chars(&article.title, 30)
            ),
        );

        let title = article.title.clone();
        let annotator = annotator.clone();
        match tokio::spawn(async move { annotator.annotate(&article).await }).await {
            Ok(item) => items.push(item),
            Err(e) => error!("Dropping article '{}': {e}", truncate_chars(&title, 50)),
        }
    }

    info!("Annotated {}/{} articles", items.len(), total);
    items
}
