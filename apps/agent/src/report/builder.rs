//! Report Builder: aggregates annotated items into one `DailyReport`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::warn;

use crate::annotate::prompts::{DAILY_SUMMARY_PROMPT, DAILY_SUMMARY_SYSTEM};
use crate::clock::Clock;
use crate::llm_client::{ChatModel, ChatRequest};
use crate::models::news::{AnnotatedItem, Category, Importance};
use crate::models::report::DailyReport;

pub const MAX_TOP_STORIES: usize = 5;
const MAX_TOP_HIGH: usize = 3;
const MAX_TOP_MEDIUM: usize = 2;
const SUMMARY_TITLES: usize = 10;
const SUMMARY_TEMPERATURE: f32 = 0.4;

#[derive(Clone)]
pub struct ReportBuilder {
    model: Arc<dyn ChatModel>,
    clock: Arc<dyn Clock>,
    model_id: Option<String>,
}

impl ReportBuilder {
    pub fn new(model: Arc<dyn ChatModel>, clock: Arc<dyn Clock>) -> Self {
        Self {
            model,
            clock,
            model_id: None,
        }
    }

    pub fn with_model(&self, model_id: Option<&str>) -> Self {
        Self {
            model_id: model_id.map(String::from),
            ..self.clone()
        }
    }

    pub async fn build(&self, collection_date: NaiveDate, items: Vec<AnnotatedItem>) -> DailyReport {
        if items.is_empty() {
            return empty_report(collection_date, self.clock.as_ref());
        }

        let category_stats = count_by(&items, |i| i.category);
        let importance_stats = count_by(&items, |i| i.importance);
        let top_stories = select_top_stories(&items);
        let summary = self
            .daily_summary(&items, &category_stats, &importance_stats)
            .await;

        DailyReport {
            collection_date,
            summary,
            total_count: items.len(),
            raw_articles_count: 0,
            processed_articles_count: items.len(),
            category_stats,
            importance_stats,
            top_stories,
            all_news: items,
            generated_time: self.clock.now(),
        }
    }

    async fn daily_summary(
        &self,
        items: &[AnnotatedItem],
        category_stats: &BTreeMap<Category, usize>,
        importance_stats: &BTreeMap<Importance, usize>,
    ) -> String {
        let high = importance_stats.get(&Importance::High).copied().unwrap_or(0);
        let categories = category_stats
            .iter()
            .map(|(c, n)| format!("{} ({n})", c.label()))
            .collect::<Vec<_>>()
            .join(", ");
        let titles = items
            .iter()
            .take(SUMMARY_TITLES)
            .map(|i| format!("- {}", i.title))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = DAILY_SUMMARY_PROMPT
            .replace("{total}", &items.len().to_string())
            .replace("{high}", &high.to_string())
            .replace("{categories}", &categories)
            .replace("{titles}", &titles);
        let request = ChatRequest::new(DAILY_SUMMARY_SYSTEM, prompt, SUMMARY_TEMPERATURE)
            .with_model(self.model_id.as_deref());

        match self.model.complete(&request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => fallback_summary(items.len(), category_stats.len(), high),
            Err(e) => {
                warn!("Daily summary call failed, using fallback: {e}");
                fallback_summary(items.len(), category_stats.len(), high)
            }
        }
    }
}

/// High-importance items first (at most 3), then medium (at most 2), in
/// input order, capped at `MAX_TOP_STORIES`.
pub fn select_top_stories(items: &[AnnotatedItem]) -> Vec<AnnotatedItem> {
    let high = items
        .iter()
        .filter(|i| i.importance == Importance::High)
        .take(MAX_TOP_HIGH);
    let medium = items
        .iter()
        .filter(|i| i.importance == Importance::Medium)
        .take(MAX_TOP_MEDIUM);

    high.chain(medium).take(MAX_TOP_STORIES).cloned().collect()
}

fn count_by<K: Ord>(items: &[AnnotatedItem], key: impl Fn(&AnnotatedItem) -> K) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}

fn fallback_summary(total: usize, categories: usize, high: usize) -> String {
    format!(
        "Collected {total} AI news items today across {categories} categories, {high} of them high importance."
    )
}

/// The canonical shape for a day with nothing to report.
pub fn empty_report(collection_date: NaiveDate, clock: &dyn Clock) -> DailyReport {
    DailyReport {
        collection_date,
        summary: format!("No AI news collected for {collection_date}."),
        total_count: 0,
        raw_articles_count: 0,
        processed_articles_count: 0,
        category_stats: BTreeMap::new(),
        importance_stats: BTreeMap::new(),
        top_stories: Vec::new(),
        all_news: Vec::new(),
        generated_time: clock.now(),
    }
}
