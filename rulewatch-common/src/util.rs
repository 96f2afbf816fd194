//! Utility functions shared across rulewatch crates.

use crate::error::{Error, Result};

/// Return the prefix of `s` holding at most `max_chars` characters.
///
/// Cuts on character boundaries, so multi-byte UTF-8 input never panics.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// This function safely handles multi-byte UTF-8 characters (emoji, CJK, accented characters)
/// by using character boundaries instead of byte indices.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    let prefix = truncate_chars(s, max_chars);
    if prefix.len() == s.len() {
        s.to_string()
    } else {
        format!("{}...", prefix.trim_end())
    }
}

/// Parse a duration string like "5m", "1h", "30s" into seconds.
pub fn parse_duration_secs(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::InvalidInput("empty duration string".into()));
    }

    let Some(unit) = s.chars().last() else {
        return Err(Error::InvalidInput("empty duration string".into()));
    };
    let num_str = &s[..s.len() - unit.len_utf8()];
    let num: u64 = num_str
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid number: {num_str}")))?;

    let secs = match unit {
        's' => Some(num),
        'm' => num.checked_mul(60),
        'h' => num.checked_mul(3600),
        'd' => num.checked_mul(86400),
        _ => return Err(Error::InvalidInput(format!("unknown unit: {unit}"))),
    };
    secs.ok_or_else(|| Error::InvalidInput(format!("duration overflows: {s}")))
}

/// Lowercase ASCII slug: alphanumerics kept, every other run of characters becomes one `-`.
///
/// Not injective on its own; callers that need a unique key must pair it with a digest.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
