//! Recovers JSON from free-form model output.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

fn span_regex() -> &'static Regex {
    static SPAN: OnceLock<Regex> = OnceLock::new();
    SPAN.get_or_init(|| Regex::new(r"(?s)\{.*\}|\[.*\]").expect("static regex"))
}

/// Parses model text as JSON.
///
/// Order: strip code fences and parse directly; otherwise parse the first
/// `{...}` or `[...]` span; otherwise an empty object.
pub fn parse_json_response(text: &str) -> Value {
    let text = strip_json_fences(text);

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return value;
    }

    if let Some(span) = span_regex().find(text) {
        match serde_json::from_str::<Value>(span.as_str()) {
            Ok(value) => return value,
            Err(e) => warn!("Extracted JSON span did not parse: {e}"),
        }
    } else {
        warn!("No JSON span found in model output");
    }

    Value::Object(Map::new())
}

/// Parses model text into `T`. A schema mismatch is reported as `None` so the
/// caller can fall back instead of failing.
pub fn parse_as<T: DeserializeOwned>(text: &str) -> Option<T> {
    let value = parse_json_response(text);
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Model output did not match the expected schema: {e}");
            None
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
