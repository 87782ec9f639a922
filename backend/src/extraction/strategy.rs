use regex::Regex;
use serde_json::{Map, Value};

use super::CONTENT_FIELD;

/// Keywords that identify a bare diagram blob returned instead of JSON.
const CONTENT_MARKERS: &[&str] = &["mermaid", "graph td", "flowchart", "sequencediagram"];

/// One way of pulling a field out of model output.
///
/// [`ExtractionStrategy::CHAIN`] lists them in the order they are tried; the
/// first one that yields a value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    /// The whole text is a JSON object.
    WholeDocument,
    /// A JSON object is embedded in prose or a code fence.
    EmbeddedObject,
    /// Regex over `"field": "value"`, for output that is almost JSON.
    QuotedField,
    /// The raw text is itself the content (diagram source).
    MarkerSniff,
}

impl ExtractionStrategy {
    pub const CHAIN: [ExtractionStrategy; 4] = [
        ExtractionStrategy::WholeDocument,
        ExtractionStrategy::EmbeddedObject,
        ExtractionStrategy::QuotedField,
        ExtractionStrategy::MarkerSniff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExtractionStrategy::WholeDocument => "whole_document",
            ExtractionStrategy::EmbeddedObject => "embedded_object",
            ExtractionStrategy::QuotedField => "quoted_field",
            ExtractionStrategy::MarkerSniff => "marker_sniff",
        }
    }

    /// Try this strategy for `field` against `raw`.
    pub fn attempt(self, raw: &str, field: &str) -> Option<Value> {
        match self {
            // A `null` field carries no data; let later strategies try.
            ExtractionStrategy::WholeDocument => {
                parse_object(raw)?.remove(field).filter(|v| !v.is_null())
            }
            ExtractionStrategy::EmbeddedObject => {
                embedded_object(raw)?.remove(field).filter(|v| !v.is_null())
            }
            ExtractionStrategy::QuotedField => quoted_field(raw, field).map(Value::String),
            ExtractionStrategy::MarkerSniff => {
                if field != CONTENT_FIELD {
                    return None;
                }
                let lowered = raw.to_lowercase();
                CONTENT_MARKERS
                    .iter()
                    .any(|marker| lowered.contains(marker))
                    .then(|| Value::String(raw.to_string()))
            }
        }
    }
}

/// Parse `text` as a JSON object, ignoring surrounding whitespace.
pub(crate) fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Find the first `{` and extend to each following `}` until the slice
/// parses as a JSON object.
pub(crate) fn embedded_object(raw: &str) -> Option<Map<String, Value>> {
    let start = raw.find('{')?;
    raw[start..]
        .match_indices('}')
        .find_map(|(offset, _)| parse_object(&raw[start..=start + offset]))
}

fn quoted_field(raw: &str, field: &str) -> Option<String> {
    let pattern = format!(
        r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)""#,
        regex::escape(field)
    );
    let re = Regex::new(&format!("(?s){pattern}")).ok()?;
    let captured = re.captures(raw)?.get(1)?.as_str();
    Some(unescape_json_string(captured))
}

/// Decode JSON string escapes. Unknown or truncated escapes are kept verbatim.
pub(crate) fn unescape_json_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match decode_unicode_escape(&hex, &mut chars) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

fn decode_unicode_escape(
    hex: &str,
    rest: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Option<char> {
    if hex.len() != 4 {
        return None;
    }
    let high = u32::from_str_radix(hex, 16).ok()?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high);
    }

    // Surrogate pair: expect a `\uXXXX` low half right after.
    let lookahead: String = rest.clone().take(6).collect();
    let low_hex = lookahead.strip_prefix("\\u")?;
    let low = u32::from_str_radix(low_hex, 16).ok()?;
    if !(0xDC00..0xE000).contains(&low) {
        return None;
    }
    for _ in 0..6 {
        rest.next();
    }
    char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whole_document() {
        let value = ExtractionStrategy::WholeDocument.attempt(r#" {"topic": "Rivers"} "#, "topic");
        assert_eq!(value, Some(json!("Rivers")));
    }

    #[test]
    fn test_whole_document_rejects_prose() {
        assert!(ExtractionStrategy::WholeDocument
            .attempt("Sure! {\"topic\": \"Rivers\"}", "topic")
            .is_none());
    }

    #[test]
    fn test_embedded_object_with_nested_braces() {
        let raw = "```json\n{\"meta\": {\"v\": 1}, \"topics\": [\"Soil\"]}\n```";
        let value = ExtractionStrategy::EmbeddedObject.attempt(raw, "topics");
        assert_eq!(value, Some(json!(["Soil"])));
    }

    #[test]
    fn test_embedded_object_without_closing_brace() {
        assert!(embedded_object("text { \"a\": 1").is_none());
    }

    #[test]
    fn test_quoted_field_handles_escapes() {
        let raw = r#"{"content": "Line one\nSay \"hi\" é", broken"#;
        let value = ExtractionStrategy::QuotedField.attempt(raw, "content");
        assert_eq!(value, Some(json!("Line one\nSay \"hi\" é")));
    }

    #[test]
    fn test_quoted_field_missing() {
        assert!(ExtractionStrategy::QuotedField
            .attempt(r#"{"other": "x""#, "content")
            .is_none());
    }

    #[test]
    fn test_marker_sniff_only_for_content() {
        let raw = "```mermaid\ngraph TD; A-->B\n```";
        assert_eq!(
            ExtractionStrategy::MarkerSniff.attempt(raw, "content"),
            Some(Value::String(raw.to_string()))
        );
        assert!(ExtractionStrategy::MarkerSniff.attempt(raw, "topics").is_none());
        assert!(ExtractionStrategy::MarkerSniff
            .attempt("plain prose", "content")
            .is_none());
    }

    #[test]
    fn test_unescape_surrogate_pair() {
        assert_eq!(unescape_json_string(r"\ud83d\ude00!"), "\u{1F600}!");
    }

    #[test]
    fn test_unescape_keeps_unknown_escapes() {
        assert_eq!(unescape_json_string(r"a\qb\u12"), r"a\qb\u12");
    }
}
