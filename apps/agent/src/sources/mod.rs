//! Feed sources and the reader that turns them into articles.

pub mod reader;

use std::path::Path;

use anyhow::{Context, Result};

use crate::models::news::Source;

/// Built-in feed list used when no `SOURCES_FILE` is configured.
pub fn default_sources() -> Vec<Source> {
    [
        (
            "Hugging Face Blog",
            "https://huggingface.co/blog/feed.xml",
            "Official Hugging Face blog with new models and tooling releases",
        ),
        (
            "ArXiv cs.AI",
            "http://rss.arxiv.org/rss/cs.AI",
            "Latest artificial intelligence papers on ArXiv",
        ),
        (
            "Reddit r/MachineLearning",
            "https://www.reddit.com/r/MachineLearning/.rss",
            "Trending discussions in the machine learning community",
        ),
        (
            "MIT Technology Review AI",
            "https://www.technologyreview.com/topic/artificial-intelligence/rss",
            "MIT Technology Review artificial intelligence coverage",
        ),
        (
            "The Batch",
            "https://landing.ai/the-batch/rss.xml",
            "Andrew Ng's weekly AI newsletter",
        ),
    ]
    .into_iter()
    .map(|(name, url, description)| Source {
        name: name.to_string(),
        url: url.to_string(),
        description: description.to_string(),
    })
    .collect()
}

/// Loads a JSON array of `{name, url, description}` objects.
pub fn load_sources(path: &Path) -> Result<Vec<Source>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sources file {}", path.display()))?;
    let sources: Vec<Source> = serde_json::from_str(&raw)
        .with_context(|| format!("Sources file {} is not a valid source list", path.display()))?;
    anyhow::ensure!(!sources.is_empty(), "Sources file {} is empty", path.display());
    Ok(sources)
}
