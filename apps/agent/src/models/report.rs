use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::news::{AnnotatedItem, Category, Importance};

/// The day-scoped aggregate written to `ai_news_report_<YYYYMMDD>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub collection_date: NaiveDate,
    pub summary: String,
    pub total_count: usize,
    #[serde(default)]
    pub raw_articles_count: usize,
    #[serde(default)]
    pub processed_articles_count: usize,
    pub category_stats: BTreeMap<Category, usize>,
    pub importance_stats: BTreeMap<Importance, usize>,
    pub top_stories: Vec<AnnotatedItem>,
    #[serde(default)]
    pub all_news: Vec<AnnotatedItem>,
    pub generated_time: DateTime<FixedOffset>,
}

impl DailyReport {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn simplified(&self) -> SimplifiedReport {
        SimplifiedReport {
            collection_date: self.collection_date,
            summary: self.summary.clone(),
            total_count: self.total_count,
            top_stories: self
                .top_stories
                .iter()
                .map(|story| StoryBrief {
                    title: story.title.clone(),
                    source: story.source.clone(),
                    summary: story.summary.clone(),
                    original_link: story.original_link.clone(),
                    importance: story.importance,
                })
                .collect(),
            generated_time: self.generated_time,
        }
    }
}

/// Top-stories-only variant written to `ai_news_simplified_<YYYYMMDD>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedReport {
    pub collection_date: NaiveDate,
    pub summary: String,
    pub total_count: usize,
    pub top_stories: Vec<StoryBrief>,
    pub generated_time: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryBrief {
    pub title: String,
    pub source: String,
    pub summary: String,
    pub original_link: String,
    pub importance: Importance,
}
