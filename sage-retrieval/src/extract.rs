//! JSON payload extraction from agent responses.
//!
//! Selection agents end their answer with a fenced ```json block; only the
//! last one counts, since earlier blocks may belong to worked examples in
//! the chain of thought.

use regex::Regex;
use std::sync::OnceLock;

fn json_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json(.*?)```").expect("static pattern"))
}

/// The content of the last ```json fenced block, trimmed.
pub fn extract_last_json(text: &str) -> Option<&str> {
    json_block()
        .captures_iter(text)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_last_block() {
        let text = "例子:\n```json\n[\"a\"]\n```\n结论:\n```json\n[\"b\"]\n```";
        assert_eq!(extract_last_json(text), Some("[\"b\"]"));
    }

    #[test]
    fn none_without_a_block() {
        assert_eq!(extract_last_json("没有代码块"), None);
    }

    #[test]
    fn block_spans_lines() {
        let text = "```json\n{\n  \"db.t\": [\"c\"]\n}\n```";
        assert_eq!(extract_last_json(text), Some("{\n  \"db.t\": [\"c\"]\n}"));
    }
}
