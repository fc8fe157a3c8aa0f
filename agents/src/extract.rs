//! JSON extraction from model output
//!
//! Models wrap JSON in markdown fences, embed it in prose, or emit several
//! brace-delimited fragments. Extraction runs an ordered list of strategies;
//! each returns `Some(object)` or `None` and none of them can fail the caller.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// A single extraction attempt
pub type Strategy = fn(&str) -> Option<Value>;

/// Strategies in the order they are tried
pub const STRATEGIES: [(&str, Strategy); 3] = [
    ("fenced_block", from_fenced_block),
    ("longest_object", from_longest_object),
    ("whole_text", from_whole_text),
];

/// Extract the first JSON object any strategy can find
pub fn extract_json(text: &str) -> Option<Value> {
    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(text) {
            tracing::trace!(strategy = name, "extract_json: matched");
            return Some(value);
        }
    }
    None
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\n?(.*?)\s*```").expect("valid fence regex")
    })
}

/// Content of the first ```json fence that holds a JSON object
pub fn from_fenced_block(text: &str) -> Option<Value> {
    fence_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| parse_object(m.as_str()))
}

/// The longest brace-delimited span that parses as an object
///
/// Candidates are every balanced top-level `{...}` span plus the greedy span
/// from the first `{` to the last `}`.
pub fn from_longest_object(text: &str) -> Option<Value> {
    let mut candidates = balanced_spans(text);

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            candidates.push(&text[start..=end]);
        }
    }

    candidates.sort_by_key(|c| std::cmp::Reverse(c.len()));
    candidates.into_iter().find_map(parse_object)
}

/// The whole response, trimmed
pub fn from_whole_text(text: &str) -> Option<Value> {
    parse_object(text.trim())
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

/// Top-level balanced `{...}` spans, skipping braces inside JSON strings
fn balanced_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=idx]);
                }
            }
            _ => {}
        }
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_block() {
        let text = "Here is the plan:\n```json\n{\"analysis\":\"x\",\"steps\":[],\"visualization\":\"none\",\"visualization_config\":{},\"expected_output\":\"y\"}\n```\nDone.";
        assert_eq!(
            extract_json(text).unwrap(),
            json!({
                "analysis": "x",
                "steps": [],
                "visualization": "none",
                "visualization_config": {},
                "expected_output": "y"
            })
        );
    }

    #[test]
    fn test_unlabelled_fence() {
        let text = "```\n{\"answer\": \"42\"}\n```";
        assert_eq!(from_fenced_block(text).unwrap(), json!({"answer": "42"}));
    }

    #[test]
    fn test_object_in_prose() {
        let text = "Sure! {\"answer\": \"Total is 35\", \"insights\": []} Hope that helps.";
        assert_eq!(
            extract_json(text).unwrap()["answer"],
            json!("Total is 35")
        );
    }

    #[test]
    fn test_longest_candidate_wins() {
        let text = r#"First {"a": 1} then {"answer": "full", "insights": ["x", "y"]} end"#;
        let value = extract_json(text).unwrap();
        assert_eq!(value["answer"], "full");
    }

    #[test]
    fn test_braces_inside_strings() {
        let text = r#"Result: {"answer": "use {x} here", "n": 2}"#;
        let value = from_longest_object(text).unwrap();
        assert_eq!(value["answer"], "use {x} here");
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn test_nested_object() {
        let text = r#"{"analysis": "a", "visualization_config": {"x_axis": "region"}}"#;
        let value = extract_json(text).unwrap();
        assert_eq!(value["visualization_config"]["x_axis"], "region");
    }

    #[test]
    fn test_unparsable_text() {
        assert!(extract_json("I could not find an answer.").is_none());
        assert!(extract_json("{not json at all}").is_none());
        assert!(extract_json("[1, 2, 3]").is_none());
    }
}
