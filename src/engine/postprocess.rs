//! Post-processing: deterministic cleanup of converter output.
//!
//! Model-generated markdown (OCR output, image descriptions) passes through
//! [`clean_markdown`]. LLM captions go through [`clean_caption`] instead,
//! which keeps them on one line for use as image alt text.
//!
//! User documents are never rewritten by those rules: text and markdown only
//! get [`normalize_document`], and converted HTML gets [`tidy_converted`].
//!
//! ## Rule Order
//!
//! Fences are stripped before line endings are normalised (the fence regex
//! expects `\n`), and the final-newline pass runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to converter output.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Strip outer markdown fences (LLMs sometimes wrap their answer)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 6. Ensure the text ends with exactly one newline; empty stays empty
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_markdown_fences(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_invisible_chars(&s);
    ensure_final_newline(&s)
}

/// Flatten an LLM caption to a single line of plain text.
pub fn clean_caption(input: &str) -> String {
    let s = strip_markdown_fences(&normalise_line_endings(input));
    let s = remove_invisible_chars(&s);
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop a leading byte-order mark and normalise line endings to LF.
/// Content is otherwise untouched.
pub fn normalize_document(input: &str) -> String {
    normalise_line_endings(input.strip_prefix('\u{FEFF}').unwrap_or(input))
}

/// Line endings, blank-line runs and the outer blank lines of
/// library-generated markdown.
pub fn tidy_converted(input: &str) -> String {
    let s = collapse_blank_lines(&normalise_line_endings(input));
    ensure_final_newline(s.trim_start_matches('\n'))
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\n(.*)\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 5: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 6: Ensure single final newline ──────────────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
