//! Deterministic fallbacks used when a model call fails or returns
//! something unusable. Rules are evaluated in order; the first match wins.

use crate::annotate::clean::{clean_content, sentences};
use crate::models::news::{Article, Category, Importance};
use crate::sources::reader::truncate_chars;

pub const MAX_FALLBACK_TAGS: usize = 3;
const SUMMARY_CHARS: usize = 200;
const MIN_FEED_SUMMARY_CHARS: usize = 20;
const MIN_SENTENCE_CHARS: usize = 10;
const FALLBACK_KEY_POINTS: usize = 3;

/// A keyword rule: matches when any keyword occurs in the lowercased title
/// or content.
pub struct ClassificationRule {
    pub keywords: &'static [&'static str],
    pub category: Category,
    pub importance: Importance,
}

pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        keywords: &["breakthrough", "突破", "innovation", "创新"],
        category: Category::TechBreakthrough,
        importance: Importance::High,
    },
    ClassificationRule {
        keywords: &["release", "发布", "launch", "推出"],
        category: Category::ProductRelease,
        importance: Importance::Medium,
    },
    ClassificationRule {
        keywords: &["research", "研究", "paper", "论文"],
        category: Category::ResearchProgress,
        importance: Importance::Medium,
    },
    ClassificationRule {
        keywords: &["policy", "政策", "regulation", "监管"],
        category: Category::PolicyRegulation,
        importance: Importance::High,
    },
    ClassificationRule {
        keywords: &["funding", "融资", "acquisition", "收购"],
        category: Category::FundingAcquisition,
        importance: Importance::Medium,
    },
];

pub struct TagRule {
    pub title_words: &'static [&'static str],
    pub content_phrases: &'static [&'static str],
    pub tag: &'static str,
}

pub const TAG_RULES: &[TagRule] = &[
    TagRule {
        title_words: &["ai"],
        content_phrases: &["artificial intelligence"],
        tag: "artificial-intelligence",
    },
    TagRule {
        title_words: &["ml"],
        content_phrases: &["machine learning"],
        tag: "machine-learning",
    },
    TagRule {
        title_words: &[],
        content_phrases: &["deep learning"],
        tag: "deep-learning",
    },
    TagRule {
        title_words: &["llm", "llms"],
        content_phrases: &["language model"],
        tag: "llm",
    },
];

const GENERIC_KEY_POINTS: [&str; FALLBACK_KEY_POINTS] = [
    "Latest progress in AI technology",
    "Relevant application scenarios and their value",
    "Potential impact on the industry",
];

/// Rule-based stand-in for the classification call.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackClassification {
    pub category: Category,
    pub importance: Importance,
    pub tags: Vec<String>,
}

pub fn classify(article: &Article) -> FallbackClassification {
    let title = article.title.to_lowercase();
    let content = article.content.to_lowercase();

    let (category, importance) = CLASSIFICATION_RULES
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|k| title.contains(k) || content.contains(k))
        })
        .map(|rule| (rule.category, rule.importance))
        .unwrap_or((Category::Other, Importance::Medium));

    let title_words: Vec<&str> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let tags = TAG_RULES
        .iter()
        .filter(|rule| {
            rule.title_words.iter().any(|w| title_words.contains(w))
                || rule.content_phrases.iter().any(|p| content.contains(p))
        })
        .map(|rule| rule.tag.to_string())
        .take(MAX_FALLBACK_TAGS)
        .collect();

    FallbackClassification {
        category,
        importance,
        tags,
    }
}

/// Feed summary when usable, else the first two substantive sentences of
/// the cleaned content, else a stock sentence naming the title.
pub fn summarize(article: &Article) -> String {
    if article.summary.chars().count() > MIN_FEED_SUMMARY_CHARS {
        let cleaned = clean_content(&article.summary);
        if !cleaned.is_empty() {
            return truncate_chars(&cleaned, SUMMARY_CHARS).to_string();
        }
    }

    let lead = substantive_sentences(&article.content, 2);
    if !lead.is_empty() {
        let summary = format!("{}.", lead.join(". "));
        return truncate_chars(&summary, SUMMARY_CHARS).to_string();
    }

    format!(
        "This article covers \"{}\"; see the original for details.",
        article.title
    )
}

/// First sentences of the cleaned content, padded with generic points.
pub fn key_points(article: &Article) -> Vec<String> {
    let mut points = substantive_sentences(&article.content, FALLBACK_KEY_POINTS);
    for generic in GENERIC_KEY_POINTS {
        if points.len() >= FALLBACK_KEY_POINTS {
            break;
        }
        points.push(generic.to_string());
    }
    points
}

fn substantive_sentences(content: &str, limit: usize) -> Vec<String> {
    sentences(&clean_content(content))
        .into_iter()
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .take(limit)
        .collect()
}
