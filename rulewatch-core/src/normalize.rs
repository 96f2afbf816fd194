//! Content normalizer: raw body (markup or plain text) to canonical plain text.
//!
//! Output is line-oriented so the diff stage can work on it directly:
//! - Block-level elements start a new line; inline markup does not.
//! - `head`, `script`, `style`, `noscript` and `template` content is dropped.
//! - Inside a line, every run of whitespace (Unicode whitespace included) becomes one space.
//! - Blank lines are removed.
//!
//! Normalization never fails. The HTML parser recovers from any malformed input the way
//! a browser does, and bodies without tags skip it entirely.

use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

/// An opening, closing or self-closing tag, or a comment / doctype.
static MARKUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:!--|!doctype|/?[a-z][a-z0-9-]*(?:\s[^<>]*)?/?>)").unwrap()
});

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead",
    "tr", "ul",
];

/// Zero-width characters that survive copy/paste and change the hash without
/// changing what a reader sees.
const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// Canonicalize encoding-level differences: BOM, line endings, zero-width characters.
pub fn canonicalize_encoding(input: &str) -> String {
    let without_bom = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    without_bom
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| !ZERO_WIDTH.contains(c))
        .collect()
}

/// Whether the body contains anything that looks like a tag.
pub fn looks_like_markup(input: &str) -> bool {
    MARKUP_PATTERN.is_match(input)
}

/// Normalize a raw body into canonical plain text.
pub fn normalize(raw: &str) -> String {
    let canonical = canonicalize_encoding(raw);
    if canonical.trim().is_empty() {
        return String::new();
    }

    if looks_like_markup(&canonical) {
        collapse_lines(&html_to_text(&canonical))
    } else {
        collapse_lines(&canonical)
    }
}

/// Extract visible text from markup, one line per block element.
pub fn html_to_text(markup: &str) -> String {
    let document = Html::parse_document(markup);
    let mut out = String::with_capacity(markup.len() / 2);
    walk(document.root_element(), &mut out);
    out
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            // Source formatting newlines inside a text node are not structure.
            for c in text.chars() {
                out.push(if c == '\n' { ' ' } else { c });
            }
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if SKIPPED_ELEMENTS.contains(&name) {
                continue;
            }
            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                out.push('\n');
            }
            walk(child_element, out);
            if block {
                out.push('\n');
            }
        }
    }
}

/// Collapse whitespace inside each line and drop blank lines.
fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
