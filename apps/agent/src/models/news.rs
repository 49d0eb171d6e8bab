use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A configured feed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// A raw feed entry after parsing, before annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub link: String,
    pub source: String,
    pub source_description: String,
    pub published_date: Option<DateTime<FixedOffset>>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TechBreakthrough,
    ProductRelease,
    IndustryNews,
    PolicyRegulation,
    ResearchProgress,
    ApplicationCase,
    FundingAcquisition,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::TechBreakthrough,
        Category::ProductRelease,
        Category::IndustryNews,
        Category::PolicyRegulation,
        Category::ResearchProgress,
        Category::ApplicationCase,
        Category::FundingAcquisition,
        Category::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Category::TechBreakthrough => "tech_breakthrough",
            Category::ProductRelease => "product_release",
            Category::IndustryNews => "industry_news",
            Category::PolicyRegulation => "policy_regulation",
            Category::ResearchProgress => "research_progress",
            Category::ApplicationCase => "application_case",
            Category::FundingAcquisition => "funding_acquisition",
            Category::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::TechBreakthrough => "technology breakthrough",
            Category::ProductRelease => "product release",
            Category::IndustryNews => "industry news",
            Category::PolicyRegulation => "policy and regulation",
            Category::ResearchProgress => "research progress",
            Category::ApplicationCase => "application case",
            Category::FundingAcquisition => "funding and acquisition",
            Category::Other => "other",
        }
    }

    /// Category exposed to the record-storage service. Funding news has no
    /// counterpart there and is folded into industry news.
    pub fn structured(self) -> Category {
        match self {
            Category::FundingAcquisition => Category::IndustryNews,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub fn code(self) -> &'static str {
        match self {
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }
}

/// An article enriched with model-derived (or rule-derived) annotations.
/// Created once per source article per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedItem {
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    pub source: String,
    #[serde(default)]
    pub source_description: String,
    pub original_link: String,
    pub summary: String,
    pub content: String,
    pub category: Category,
    pub importance: Importance,
    pub key_points: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published_date: Option<DateTime<FixedOffset>>,
    pub processed_time: DateTime<FixedOffset>,
    #[serde(default = "default_true")]
    pub is_today_news: bool,
}

fn default_true() -> bool {
    true
}
