use serde_json::Value;

use crate::domain::quote::QuoteDraft;

pub const FALLBACK_TEXT: &str = "Wisdom comes from experience and reflection.";
pub const FALLBACK_AUTHOR: &str = "AI Wisdom";

const TEXT_FIELDS: &[&str] = &["text", "content", "quote"];
const AUTHOR_FIELDS: &[&str] = &["author", "by"];

/// Shapes an arbitrary webhook payload into a quote draft. Field aliases are
/// checked in order, non-string and blank values are skipped, and missing
/// fields fall back to fixed defaults so generation always yields a quote.
pub fn normalize(raw: &Value) -> QuoteDraft {
    let text = first_string(raw, TEXT_FIELDS).unwrap_or_else(|| FALLBACK_TEXT.to_string());
    let author = first_string(raw, AUTHOR_FIELDS).unwrap_or_else(|| FALLBACK_AUTHOR.to_string());

    QuoteDraft { text, author }
}

fn first_string(raw: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        raw.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}
