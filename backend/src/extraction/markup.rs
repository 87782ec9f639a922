//! Markdown to display-safe HTML for generated lesson content.

use std::sync::OnceLock;

use regex::Regex;

/// Placeholders for inserted emphasis; private-use code points survive escaping.
const STRONG_OPEN: char = '\u{E000}';
const STRONG_CLOSE: char = '\u{E001}';
const STRONG_REPLACEMENT: &str = "\u{E000}${1}\u{E001}";

fn re_fence_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^```\w*\n?").expect("fence regex should compile"))
}

fn re_rule() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n?-{3,}\n?").expect("rule regex should compile"))
}

fn re_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#{1,6}\s?(.*)$").expect("heading regex should compile"))
}

fn re_emphasis() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*+\s*([^*]+?)\s*\*+").expect("emphasis regex should compile")
    })
}

/// Turn model-written markdown into a small HTML fragment.
///
/// Only `<strong>` and `<br/>` survive; everything else is escaped.
pub fn clean_content(content: &str) -> String {
    let mut text = content.trim().replace("\r\n", "\n");

    if text.starts_with("```") && text.ends_with("```") {
        text = re_fence_open().replace(&text, "").into_owned();
        text = text.trim_end_matches('`').trim().to_string();
    }

    text = re_rule().replace_all(&text, "\n").into_owned();
    text = repair_mojibake(text);
    text = re_heading()
        .replace_all(&text, STRONG_REPLACEMENT)
        .into_owned();
    text = re_emphasis()
        .replace_all(&text, STRONG_REPLACEMENT)
        .into_owned();

    // Only the tags inserted above become markup; model-written tags stay escaped.
    escape_html(&text)
        .replace(STRONG_OPEN, "<strong>")
        .replace(STRONG_CLOSE, "</strong>")
        .replace('\n', "<br/>")
}

/// Undo UTF-8 that was decoded as Latin-1 somewhere upstream (`cafÃ©`).
///
/// Left unchanged unless every char fits in a byte and the bytes form valid
/// UTF-8.
fn repair_mojibake(text: String) -> String {
    if text.is_ascii() {
        return text;
    }
    let bytes: Option<Vec<u8>> = text.chars().map(|c| u8::try_from(c).ok()).collect();
    match bytes.map(String::from_utf8) {
        Some(Ok(repaired)) => repaired,
        _ => text,
    }
}

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
