//! Prompt templates for the generative backend
//!
//! Each operation issues exactly one call; the templates demand strict JSON
//! so the reply can be decoded after substring extraction.

pub fn themes(reviews_json: &str, max_themes: usize) -> String {
    format!(
        r#"You'll receive a sample of app-store reviews as JSON records with rating and text.
Identify the {max_themes} dominant themes users bring up.

Return ONLY a JSON array of objects, each:
{{"label": "<2-4 word theme>", "count": <number of sampled reviews mentioning it>}}

CONSTRAINTS:
- Counts refer to the sample you were given, not the whole corpus.
- Order by count descending.
- No prose before or after the JSON.

REVIEWS JSON:
<{reviews_json}>"#
    )
}

pub fn action_ideas(reviews_json: &str, max_actions: usize) -> String {
    format!(
        r#"You'll receive negative app-store reviews as JSON records with rating and text.
Propose at most {max_actions} concrete, specific product actions addressing the complaints.

Return ONLY a JSON array of strings, one action each, imperative mood.

REVIEWS JSON:
<{reviews_json}>"#
    )
}

pub fn quotes(reviews_json: &str, max_quotes: usize) -> String {
    format!(
        r#"You'll receive app-store reviews as JSON records with rating and text.
Select up to {max_quotes} short, vivid quotes that represent the range of user experience.

Return ONLY a JSON array of strings. Each string must be copied verbatim
from a review text, trimmed to at most one sentence.

REVIEWS JSON:
<{reviews_json}>"#
    )
}
