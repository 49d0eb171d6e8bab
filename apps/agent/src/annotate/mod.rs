//! Annotator: turns one `Article` into one `AnnotatedItem`.
//!
//! Three independent model calls per article (classification, summary, key
//! points). Each call falls back to the rules in `rules` on its own, so one
//! failed sub-task never discards the others.

pub mod clean;
pub mod prompts;
pub mod rules;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::annotate::prompts::{
    CLASSIFY_PROMPT, CLASSIFY_SYSTEM, KEY_POINTS_PROMPT, KEY_POINTS_SYSTEM, SUMMARY_PROMPT,
    SUMMARY_SYSTEM,
};
use crate::clock::Clock;
use crate::llm_client::json::{parse_as, parse_json_response};
use crate::llm_client::{ChatModel, ChatRequest};
use crate::models::news::{AnnotatedItem, Article, Category, Importance};
use crate::sources::reader::truncate_chars;

/// Content budget for the classification call.
pub const CLASSIFY_CONTENT_CHARS: usize = 1000;
/// Content budget for the summary and key-point calls.
pub const SUMMARY_CONTENT_CHARS: usize = 1500;

const CLASSIFY_TEMPERATURE: f32 = 0.3;
const SUMMARY_TEMPERATURE: f32 = 0.4;
const KEY_POINTS_TEMPERATURE: f32 = 0.3;
const MAX_KEY_POINTS: usize = 5;
const MAX_MODEL_TAGS: usize = 5;

/// Expected shape of the classification reply.
#[derive(Debug, Clone, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub title: Option<String>,
    pub category: Category,
    pub importance: Importance,
    #[serde(default)]
    pub additional_tags: Vec<String>,
}

#[derive(Clone)]
pub struct Annotator {
    model: Arc<dyn ChatModel>,
    clock: Arc<dyn Clock>,
    model_id: Option<String>,
}

impl Annotator {
    pub fn new(model: Arc<dyn ChatModel>, clock: Arc<dyn Clock>) -> Self {
        Self {
            model,
            clock,
            model_id: None,
        }
    }

    /// Same annotator, routed to a specific model for every call.
    pub fn with_model(&self, model_id: Option<&str>) -> Self {
        Self {
            model_id: model_id.map(String::from),
            ..self.clone()
        }
    }

    pub async fn annotate(&self, article: &Article) -> AnnotatedItem {
        let classification = self.classify(article).await;
        let summary = self.summarize(article).await;
        let key_points = self.extract_key_points(article).await;

        let title = classification
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&article.title)
            .to_string();

        AnnotatedItem {
            title,
            original_title: article.title.clone(),
            source: article.source.clone(),
            source_description: article.source_description.clone(),
            original_link: article.link.clone(),
            summary,
            content: clean::clean_content(&article.content),
            category: classification.category,
            importance: classification.importance,
            key_points,
            tags: merge_tags(&article.tags, &classification.additional_tags),
            published_date: article.published_date,
            processed_time: self.clock.now(),
            is_today_news: true,
        }
    }

    async fn ask(&self, system: &str, prompt: String, temperature: f32) -> Option<String> {
        let request =
            ChatRequest::new(system, prompt, temperature).with_model(self.model_id.as_deref());
        match self.model.complete(&request).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Model call failed, using rule-based fallback: {e}");
                None
            }
        }
    }

    pub async fn classify(&self, article: &Article) -> Classification {
        let categories = Category::ALL
            .iter()
            .map(|c| format!("{} ({})", c.code(), c.label()))
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = CLASSIFY_PROMPT
            .replace("{title}", &article.title)
            .replace(
                "{content}",
                truncate_chars(&article.content, CLASSIFY_CONTENT_CHARS),
            )
            .replace("{source}", &article.source)
            .replace("{categories}", &categories);

        let parsed = self
            .ask(CLASSIFY_SYSTEM, prompt, CLASSIFY_TEMPERATURE)
            .await
            .and_then(|text| parse_as::<Classification>(&text));

        match parsed {
            Some(mut c) => {
                c.additional_tags.truncate(MAX_MODEL_TAGS);
                c
            }
            None => {
                let fallback = rules::classify(article);
                debug!(
                    "Fallback classification for '{}': {:?}",
                    truncate_chars(&article.title, 50),
                    fallback.category
                );
                Classification {
                    title: None,
                    category: fallback.category,
                    importance: fallback.importance,
                    additional_tags: fallback.tags,
                }
            }
        }
    }

    pub async fn summarize(&self, article: &Article) -> String {
        let prompt = SUMMARY_PROMPT.replace("{title}", &article.title).replace(
            "{content}",
            truncate_chars(&article.content, SUMMARY_CONTENT_CHARS),
        );

        match self.ask(SUMMARY_SYSTEM, prompt, SUMMARY_TEMPERATURE).await {
            Some(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
            _ => rules::summarize(article),
        }
    }

    pub async fn extract_key_points(&self, article: &Article) -> Vec<String> {
        let prompt = KEY_POINTS_PROMPT.replace("{title}", &article.title).replace(
            "{content}",
            truncate_chars(&article.content, SUMMARY_CONTENT_CHARS),
        );

        let points = self
            .ask(KEY_POINTS_SYSTEM, prompt, KEY_POINTS_TEMPERATURE)
            .await
            .map(|text| parse_json_response(&text))
            .and_then(string_list);

        match points {
            Some(mut points) if !points.is_empty() => {
                points.truncate(MAX_KEY_POINTS);
                points
            }
            _ => rules::key_points(article),
        }
    }
}

/// Accepts only a JSON array of non-empty strings.
fn string_list(value: Value) -> Option<Vec<String>> {
    let items = match value {
        Value::Array(items) => items,
        _ => return None,
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect()
}

fn merge_tags(feed_tags: &[String], model_tags: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(feed_tags.len() + model_tags.len());
    for tag in feed_tags.iter().chain(model_tags) {
        let tag = tag.trim();
        if !tag.is_empty() && !merged.iter().any(|t| t == tag) {
            merged.push(tag.to_string());
        }
    }
    merged
}
