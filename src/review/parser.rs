//! Lenient parsing of the model's JSON reply into a [`ReviewResult`].
//!
//! Models asked for a JSON object still occasionally wrap it in prose or a
//! Markdown fence, or emit trailing commas. Each candidate slice of the
//! reply is tried as strict JSON first and then as JSON5. When nothing
//! decodes, the candidates are repaired (raw newlines in strings, missing
//! commas, a reply cut off mid-object) and tried again.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};

use crate::models::ReviewResult;

use super::ReviewError;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json5?|JSON)?[ \t]*\r?\n(.*?)\r?\n[ \t]*```")
        .expect("fence regex is valid")
});

/// Parse a completion into a review.
///
/// Fails when no candidate slice of `text` decodes to a JSON object.
pub fn parse_review(text: &str) -> Result<ReviewResult, ReviewError> {
    let object = parse_object(text)?;
    Ok(review_from_object(object))
}

/// Find the first candidate that decodes to a JSON object.
///
/// Candidates are tried as written first. Only when none of them decodes
/// are repaired variants tried, so a well-formed reply is never rewritten.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, ReviewError> {
    let mut first_error = None;
    let candidates = extract_json_candidates(text);

    for candidate in &candidates {
        match decode(candidate) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(other) => {
                first_error.get_or_insert_with(|| {
                    format!("expected a JSON object, got {}", kind(&other))
                });
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    for source in repair_sources(text, &candidates) {
        for repaired in repair_json(&source) {
            if let Ok(Value::Object(map)) = decode(&repaired) {
                tracing::debug!("Parsed review after repairing malformed JSON");
                return Ok(map);
            }
        }
    }

    Err(ReviewError::Parse {
        message: first_error.unwrap_or_else(|| "empty response".to_string()),
        excerpt: excerpt(text),
    })
}

fn decode(candidate: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Ok(value),
        Err(strict) => json5::from_str::<Value>(candidate)
            .map_err(|lenient| format!("{strict}; as JSON5: {lenient}")),
    }
}

/// Candidate slices of a reply, most likely first.
fn extract_json_candidates(text: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return candidates;
    }
    candidates.push(trimmed.to_string());

    // Outermost braces. Survives prose around the object and code fences
    // nested inside string values.
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            let slice = &text[start..=end];
            if slice != trimmed {
                candidates.push(slice.to_string());
            }
        }
    }

    for cap in FENCE_RE.captures_iter(text) {
        if let Some(inner) = cap.get(1) {
            let inner = inner.as_str().trim();
            if !inner.is_empty() {
                candidates.push(inner.to_string());
            }
        }
    }

    candidates
}

/// Texts worth repairing: every candidate, plus everything from the first
/// `{` to the end so a truncated object behind prose is not cut short.
fn repair_sources(text: &str, candidates: &[String]) -> Vec<String> {
    let mut sources = candidates.to_vec();
    if let Some(start) = text.find('{') {
        let tail = text[start..].trim_end();
        if !sources.iter().any(|s| s == tail) {
            sources.push(tail.to_string());
        }
    }
    sources
}

/// Rewrite the defects models most often produce into decodable JSON.
///
/// Raw control characters inside strings are escaped, missing commas
/// between members are inserted, and an unterminated string or container
/// is closed. When the text was cut off, a second variant ends at the last
/// complete member instead.
fn repair_json(text: &str) -> Vec<String> {
    let mut out = String::with_capacity(text.len() + 8);
    let mut stack: Vec<char> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    // Last significant character outside strings.
    let mut last: Option<char> = None;
    // Output length and open containers just before the most recent comma.
    let mut last_member: Option<(usize, Vec<char>)> = None;

    for c in text.chars() {
        if let Some(q) = quote {
            if escaped {
                out.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => {
                    out.push(c);
                    escaped = true;
                }
                _ if c == q => {
                    out.push(c);
                    quote = None;
                    last = Some(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
                _ => out.push(c),
            }
            continue;
        }

        match c {
            '"' | '\'' | '{' | '[' => {
                if !stack.is_empty() && last.is_some_and(ends_value) {
                    last_member = Some((out.len(), stack.clone()));
                    out.push(',');
                }
                out.push(c);
                if c == '{' || c == '[' {
                    stack.push(c);
                    last = Some(c);
                } else {
                    quote = Some(c);
                }
            }
            '}' | ']' => {
                if stack.last() == Some(&opener(c)) {
                    stack.pop();
                }
                out.push(c);
                last = Some(c);
            }
            ',' => {
                last_member = Some((out.len(), stack.clone()));
                out.push(c);
                last = Some(c);
            }
            _ if c.is_whitespace() => out.push(c),
            _ => {
                out.push(c);
                last = Some(c);
            }
        }
    }

    let truncated = quote.is_some() || !stack.is_empty();

    let mut repaired = out.clone();
    if let Some(q) = quote {
        if escaped {
            repaired.pop();
        }
        repaired.push(q);
    }
    repaired.truncate(repaired.trim_end().len());
    if repaired.ends_with(',') {
        repaired.pop();
    } else if repaired.ends_with(':') {
        repaired.push_str("null");
    }
    close_containers(&mut repaired, &stack);

    let mut variants = vec![repaired];
    if truncated {
        if let Some((len, open)) = last_member {
            let mut cut = out[..len].trim_end().to_string();
            close_containers(&mut cut, &open);
            variants.push(cut);
        }
    }
    variants
}

fn ends_value(c: char) -> bool {
    matches!(c, '"' | '\'' | '}' | ']') || c.is_ascii_alphanumeric()
}

fn opener(closer: char) -> char {
    if closer == '}' { '{' } else { '[' }
}

fn close_containers(text: &mut String, open: &[char]) {
    for c in open.iter().rev() {
        text.push(if *c == '{' { '}' } else { ']' });
    }
}

/// Pull `summary` and `suggestions` out of a decoded object.
///
/// Values of the wrong type are dropped with a debug log rather than
/// failing the run.
pub fn review_from_object(mut object: Map<String, Value>) -> ReviewResult {
    let summary = match object.remove("summary") {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => {
            tracing::debug!("Ignoring non-string summary ({})", kind(&other));
            None
        }
    };

    let mut suggestions = IndexMap::new();
    match object.remove("suggestions") {
        Some(Value::Object(map)) => {
            for (key, value) in map {
                match value {
                    Value::String(body) => {
                        suggestions.insert(key, body);
                    }
                    other => tracing::debug!("Ignoring suggestion {key}: {} value", kind(&other)),
                }
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => tracing::debug!("Ignoring suggestions ({})", kind(&other)),
    }

    ReviewResult {
        summary,
        suggestions,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn excerpt(text: &str) -> String {
    const MAX_CHARS: usize = 200;
    let mut out: String = text.chars().take(MAX_CHARS).collect();
    if text.chars().count() > MAX_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_strict_json() {
        let review = parse_review(
            r#"{"summary": "Looks fine overall.", "suggestions": {"m.py:10": "Rename variable."}}"#,
        )
        .unwrap();
        assert_eq!(review.summary.as_deref(), Some("Looks fine overall."));
        assert_eq!(review.suggestions["m.py:10"], "Rename variable.");
    }

    #[test]
    fn keeps_suggestion_order() {
        let review = parse_review(
            r#"{"suggestions": {"z.py:1": "a", "a.py:2": "b", "m.py:3": "c"}}"#,
        )
        .unwrap();
        let keys: Vec<_> = review.suggestions.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z.py:1", "a.py:2", "m.py:3"]);
    }

    #[test]
    fn accepts_trailing_commas_and_unquoted_keys() {
        let review = parse_review(
            "{summary: 'ok', suggestions: {'a.py:1': 'fix this',},}",
        )
        .unwrap();
        assert_eq!(review.summary.as_deref(), Some("ok"));
        assert_eq!(review.suggestions["a.py:1"], "fix this");
    }

    #[test]
    fn accepts_fenced_json() {
        let text = "Here is the review:\n```json\n{\"summary\": \"s\", \"suggestions\": {}}\n```\n";
        let review = parse_review(text).unwrap();
        assert_eq!(review.summary.as_deref(), Some("s"));
        assert!(review.suggestions.is_empty());
    }

    #[test]
    fn accepts_object_wrapped_in_prose() {
        let text = "Sure! {\"summary\": \"s\"} Hope that helps.";
        assert_eq!(parse_review(text).unwrap().summary.as_deref(), Some("s"));
    }

    #[test]
    fn accepts_comments() {
        let text = "{\n  // overall\n  \"summary\": \"s\",\n  /* none */ \"suggestions\": {}\n}";
        assert_eq!(parse_review(text).unwrap().summary.as_deref(), Some("s"));
    }

    #[test]
    fn rejects_prose_without_object() {
        let err = parse_review("I could not review this diff.").unwrap_err();
        assert!(matches!(err, ReviewError::Parse { .. }));
    }

    #[test]
    fn rejects_empty_reply() {
        assert!(parse_review("   ").is_err());
    }

    #[test]
    fn rejects_top_level_array() {
        let err = parse_review(r#"["a.py:1"]"#).unwrap_err();
        assert!(err.to_string().contains("array"), "got: {err}");
    }

    #[test]
    fn missing_and_null_fields_are_empty() {
        let review = parse_review(r#"{"summary": null}"#).unwrap();
        assert_eq!(review, ReviewResult::default());
    }

    #[test]
    fn drops_non_string_values() {
        let review = parse_review(
            r#"{"summary": 3, "suggestions": {"a.py:1": "ok", "b.py:2": ["x"], "c.py:3": null}}"#,
        )
        .unwrap();
        assert_eq!(review.summary, None);
        assert_eq!(review.suggestions.len(), 1);
        assert!(review.suggestions.contains_key("a.py:1"));
    }

    #[test]
    fn candidates_start_with_raw_text() {
        let candidates = extract_json_candidates("  {\"a\": 1}  ");
        assert_eq!(candidates, vec!["{\"a\": 1}".to_string()]);
    }

    #[test]
    fn nested_fences_inside_values_still_parse() {
        let text = "```json\n{\"suggestions\": {\"a.rs:3\": \"Use:\\n```\\nlet x = 1;\\n```\"}}\n```";
        let review = parse_review(text).unwrap();
        assert!(review.suggestions["a.rs:3"].contains("let x = 1;"));
    }

    #[test]
    fn repairs_raw_newlines_in_strings() {
        let text = "{\"summary\": \"First line.\nSecond line.\", \"suggestions\": {\"a.py:1\": \"Tab\there.\"}}";
        let review = parse_review(text).unwrap();
        assert_eq!(review.summary.as_deref(), Some("First line.\nSecond line."));
        assert_eq!(review.suggestions["a.py:1"], "Tab\there.");
    }

    #[test]
    fn repairs_missing_commas_between_members() {
        let text = r#"{"summary": "ok" "suggestions": {"a.py:1": "x" "b.py:2": "y"}}"#;
        let review = parse_review(text).unwrap();
        assert_eq!(review.summary.as_deref(), Some("ok"));
        let keys: Vec<_> = review.suggestions.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a.py:1", "b.py:2"]);
    }

    #[test]
    fn repairs_reply_cut_off_after_a_value() {
        let text = r#"{"summary": "ok", "suggestions": {"a.py:1": "fix this""#;
        let review = parse_review(text).unwrap();
        assert_eq!(review.summary.as_deref(), Some("ok"));
        assert_eq!(review.suggestions["a.py:1"], "fix this");
    }

    #[test]
    fn repairs_reply_cut_off_inside_a_string() {
        let text = r#"Here you go: {"summary": "ok", "suggestions": {"a.py:1": "fix th"#;
        let review = parse_review(text).unwrap();
        assert_eq!(review.suggestions["a.py:1"], "fix th");
    }

    #[test]
    fn reply_cut_off_inside_a_key_keeps_complete_members() {
        let text = r#"{"summary": "ok", "sugges"#;
        let review = parse_review(text).unwrap();
        assert_eq!(review.summary.as_deref(), Some("ok"));
        assert!(review.suggestions.is_empty());
    }

    #[test]
    fn repair_leaves_prose_unparsable() {
        assert!(parse_review("Sorry, I can't help with that.").is_err());
    }
}
