//! Raw feed HTML to plain text.

use std::sync::OnceLock;

use regex::Regex;

use crate::sources::reader::truncate_chars;

pub const MAX_CLEAN_CHARS: usize = 1000;

const MIN_SUBSTANTIVE_CHARS: usize = 50;
const MAX_LINKS: usize = 3;
const SALVAGE_SENTENCES: usize = 3;
const PLACEHOLDER: &str = "See the original link for the full article.";

const ENTITIES: [(&str, &str); 7] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#32;", " "),
    ("&nbsp;", " "),
    ("&hellip;", "..."),
];

struct Patterns {
    comment: Regex,
    tag: Regex,
    whitespace: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        comment: Regex::new(r"(?s)<!--.*?-->").expect("static regex"),
        tag: Regex::new(r"<[^>]+>").expect("static regex"),
        whitespace: Regex::new(r"\s+").expect("static regex"),
    })
}

/// Strips comments and tags, decodes the common entities, collapses
/// whitespace and caps the result at `MAX_CLEAN_CHARS`.
///
/// Short or link-dominated text is reduced to its first few substantive
/// sentences, or a placeholder when none exist.
pub fn clean_content(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let p = patterns();
    let text = p.comment.replace_all(raw, "");
    let text = p.tag.replace_all(&text, "");
    let mut text = text.into_owned();
    for (entity, ch) in ENTITIES {
        text = text.replace(entity, ch);
    }
    let text = p.whitespace.replace_all(&text, " ").trim().to_string();

    let text = if text.chars().count() < MIN_SUBSTANTIVE_CHARS
        || text.matches("http").count() > MAX_LINKS
    {
        salvage_sentences(&text)
    } else {
        text
    };

    truncate_chars(&text, MAX_CLEAN_CHARS).to_string()
}

fn salvage_sentences(text: &str) -> String {
    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() > 20 && !s.contains("http"))
        .take(SALVAGE_SENTENCES)
        .collect();

    if sentences.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        format!("{}.", sentences.join(". "))
    }
}

/// Splits text into sentences on ASCII and CJK terminators.
pub fn sentences(text: &str) -> Vec<String> {
    text.split(['。', '.', '!', '?', '！', '？'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_comments_and_entities() {
        let raw = "<p>Large language models &amp; agents <!-- hidden --> are   reshaping\n how teams build&nbsp;software today.</p>";
        assert_eq!(
            clean_content(raw),
            "Large language models & agents are reshaping how teams build software today."
        );
    }

    #[test]
    fn test_link_dominated_text_is_salvaged() {
        let raw = "Submitted by someone who likes links a lot. http://a http://b http://c http://d. \
                   This sentence is long enough to be substantive. tiny.";
        assert_eq!(
            clean_content(raw),
            "Submitted by someone who likes links a lot. This sentence is long enough to be substantive."
        );
    }

    #[test]
    fn test_short_text_without_sentences_gets_placeholder() {
        assert_eq!(clean_content("<a href='x'>link</a>"), PLACEHOLDER);
    }

    #[test]
    fn test_empty_stays_empty() {
        assert_eq!(clean_content("   "), "");
    }

    #[test]
    fn test_truncates_long_content() {
        let raw = "word ".repeat(400);
        assert_eq!(clean_content(&raw).chars().count(), MAX_CLEAN_CHARS);
    }

    #[test]
    fn test_sentences_split_on_mixed_terminators() {
        assert_eq!(
            sentences("First one. 第二句。Third!"),
            vec!["First one", "第二句", "Third"]
        );
    }
}
