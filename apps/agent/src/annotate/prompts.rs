// Annotation and daily-summary prompt templates.
// Placeholders in braces are substituted with `str::replace`.

pub const CLASSIFY_SYSTEM: &str = "\
You are a professional AI news analyst who classifies and titles AI articles. \
Respond with a single JSON object only.";

pub const CLASSIFY_PROMPT: &str = r#"Analyse the following AI-related article.

Title: {title}
Content: {content}
Source: {source}

Tasks:
1. Improve the title if the original is unclear.
2. Pick one category: {categories}
3. Pick an importance: high, medium or low.
4. Suggest up to 5 additional tags.

Output format:
{
  "title": "optimized title",
  "category": "category code",
  "importance": "high | medium | low",
  "additional_tags": ["tag1", "tag2"]
}"#;

pub const SUMMARY_SYSTEM: &str = "\
You are a professional AI news editor who writes concise, accurate summaries.";

pub const SUMMARY_PROMPT: &str = r#"Write a clear summary (60-120 words) of this AI article.

Title: {title}
Content: {content}

Requirements:
1. Lead with the core information and why it matters.
2. Use plain language.
3. Mention the key technical point or business impact.
Return the summary text only."#;

pub const KEY_POINTS_SYSTEM: &str = "\
You are an information extraction specialist who identifies the key points of an article.";

pub const KEY_POINTS_PROMPT: &str = r#"Extract 3-5 key points from this AI article.

Title: {title}
Content: {content}

Requirements:
1. One sentence per point.
2. Focus on innovation, application value or industry impact.
3. Order by importance.

Return a JSON array of strings: ["point 1", "point 2", "point 3"]"#;

pub const DAILY_SUMMARY_SYSTEM: &str = "\
You are an AI industry analyst who writes the daily briefing on AI developments.";

pub const DAILY_SUMMARY_PROMPT: &str = r#"Write a concise daily briefing (60-100 words) based on today's AI news.

Total items: {total}
High importance items: {high}
Categories: {categories}

Representative headlines:
{titles}

Highlight the main developments and trends of the day. Return the briefing text only."#;
