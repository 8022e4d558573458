//! Rich-text to plain-text conversion for Drive exports.
//!
//! Letters store their body as Draft.js raw state:
//! `{"blocks": [{"text": "..."}, ...], "entityMap": {...}}`.
//! The plain-text rendering is every block's text joined by newlines.

use serde::Deserialize;
use serde_json::Value;

/// Converts a letter's rich content into plain text.
///
/// Injected into `LetterService` so the export step can be exercised with
/// any conversion.
pub trait ContentNormalizer: Send + Sync {
    fn to_plain_text(&self, content: &Value) -> String;
}

/// Normalizer for Draft.js raw content.
#[derive(Debug, Clone, Copy, Default)]
pub struct DraftPlainText;

impl ContentNormalizer for DraftPlainText {
    fn to_plain_text(&self, content: &Value) -> String {
        to_plain_text(Some(content))
    }
}

#[derive(Deserialize)]
struct RawDraftState {
    #[serde(default)]
    blocks: Vec<RawDraftBlock>,
}

#[derive(Deserialize)]
struct RawDraftBlock {
    #[serde(default)]
    text: String,
}

/// Render Draft raw state as plain text. Absent content renders as "".
///
/// A string is first decoded as JSON-encoded raw state; a string that is
/// not JSON is already plain text and is returned as is.
pub fn to_plain_text(content: Option<&Value>) -> String {
    match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::String(inner)) => inner,
            Ok(decoded @ Value::Object(_)) => render_blocks(&decoded),
            _ => s.clone(),
        },
        Some(value @ Value::Object(_)) => render_blocks(value),
        Some(_) => String::new(),
    }
}

fn render_blocks(value: &Value) -> String {
    match RawDraftState::deserialize(value) {
        Ok(state) => state
            .blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_content() {
        assert_eq!(to_plain_text(None), "");
        assert_eq!(to_plain_text(Some(&Value::Null)), "");
        assert_eq!(to_plain_text(Some(&json!({}))), "");
        assert_eq!(to_plain_text(Some(&json!({"blocks": []}))), "");
    }

    #[test]
    fn test_blocks_joined_by_newline() {
        let raw = json!({
            "blocks": [
                {"key": "a1", "text": "Dear Ada,", "type": "unstyled"},
                {"key": "a2", "text": "", "type": "unstyled"},
                {"key": "a3", "text": "Thank you.", "type": "unstyled", "inlineStyleRanges": []}
            ],
            "entityMap": {}
        });
        assert_eq!(to_plain_text(Some(&raw)), "Dear Ada,\n\nThank you.");
    }

    #[test]
    fn test_json_encoded_raw_state() {
        let encoded = Value::String(r#"{"blocks":[{"text":"one"},{"text":"two"}]}"#.to_string());
        assert_eq!(to_plain_text(Some(&encoded)), "one\ntwo");
    }

    #[test]
    fn test_plain_string_passes_through() {
        let text = Value::String("just words".to_string());
        assert_eq!(to_plain_text(Some(&text)), "just words");
    }

    #[test]
    fn test_malformed_blocks_render_empty() {
        assert_eq!(to_plain_text(Some(&json!({"blocks": "nope"}))), "");
        assert_eq!(to_plain_text(Some(&json!(42))), "");
    }

    #[test]
    fn test_trait_object() {
        let normalizer: &dyn ContentNormalizer = &DraftPlainText;
        assert_eq!(
            normalizer.to_plain_text(&json!({"blocks": [{"text": "hi"}]})),
            "hi"
        );
    }
}
