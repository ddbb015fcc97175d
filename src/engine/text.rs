//! Converters that need no backend: plain text, markdown, JSON and HTML.
//!
//! Text and markdown are user content and pass through unchanged apart from
//! BOM and line-ending normalisation. HTML goes through `html2md`.

use super::postprocess::{normalize_document, tidy_converted};
use super::ConversionResult;
use once_cell::sync::Lazy;
use regex::Regex;

/// Plain text and markdown pass through; the first level-1 ATX heading
/// becomes the title.
pub fn convert_text(bytes: &[u8]) -> ConversionResult {
    let markdown = normalize_document(&String::from_utf8_lossy(bytes));
    let title = first_heading(&markdown);
    ConversionResult::new(markdown, title)
}

/// JSON is wrapped in a fenced code block, pretty-printed when it parses.
pub fn convert_json(bytes: &[u8]) -> ConversionResult {
    let raw = normalize_document(&String::from_utf8_lossy(bytes));
    let body = serde_json::from_str::<serde_json::Value>(&raw)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| raw.trim().to_string());
    ConversionResult::new(format!("```json\n{body}\n```\n"), None)
}

static RE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title(\s[^>]*)?>(.*?)</title>").unwrap());
static RE_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body(\s[^>]*)?>(.*)</body>").unwrap());

/// `<title>` becomes the title; `<body>` (or the whole document when there
/// is none) is converted to markdown.
pub fn convert_html(bytes: &[u8]) -> ConversionResult {
    let html = normalize_document(&String::from_utf8_lossy(bytes));
    let title = RE_TITLE
        .captures(&html)
        .map(|c| html2md::parse_html(&c[2]).trim().to_string())
        .filter(|t| !t.is_empty());

    let body = RE_BODY
        .captures(&html)
        .and_then(|c| c.get(2))
        .map_or(html.as_str(), |m| m.as_str());
    let markdown = tidy_converted(&html2md::parse_html(body));

    ConversionResult::new(markdown, title)
}

fn first_heading(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .find_map(|l| l.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
