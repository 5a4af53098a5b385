//! Text normalization for the free-form fragments found on property pages.
//!
//! Nothing here fails: malformed input resolves to `0` or an empty label, and
//! callers treat `0` as "unresolved" rather than as a zero-size suite.

/// Unit tokens that may trail an area figure, longest first
const AREA_UNITS: &[&str] = &["square feet", "sq. ft.", "sq.ft.", "sq ft", "sqft", "sf"];

/// Parse an area figure like `"1,250 SF"` or `"980 square feet"`.
///
/// The remainder after stripping the unit and thousands separators must be a
/// plain digit run; anything else (ranges, words) resolves to `0`.
pub fn parse_area_text(text: &str) -> u64 {
    let mut value = text.trim();
    for unit in AREA_UNITS {
        if let Some(stripped) = strip_suffix_ignore_case(value, unit) {
            value = stripped.trim_end();
            break;
        }
    }

    let digits: String = value.chars().filter(|c| *c != ',').collect();
    let digits = digits.trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

/// Parse the size field of a card or label layout: only the first
/// space-separated token counts, with every non-digit stripped from it.
pub fn parse_size_token(text: &str) -> u64 {
    let token = text.trim().split(' ').next().unwrap_or("");
    let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Extract the integer that follows `label` (e.g. `"Suites available:"`).
pub fn parse_count(text: &str, label: &str) -> u64 {
    let haystack = text.to_ascii_lowercase();
    let needle = label.to_ascii_lowercase();
    match haystack.find(&needle) {
        Some(pos) => {
            let rest = text[pos + needle.len()..].trim_start();
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        }
        None => 0,
    }
}

/// First number in `text`, allowing thousands separators (`"1,234,567 SQ. FT."`).
pub fn parse_leading_number(text: &str) -> u64 {
    let start = match text.find(|c: char| c.is_ascii_digit()) {
        Some(start) => start,
        None => return 0,
    };
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    digits.parse().unwrap_or(0)
}

/// Canonical form of a field label: trimmed, no trailing colon, lower-case.
pub fn normalize_label(text: &str) -> String {
    text.trim().trim_end_matches(':').trim_end().to_lowercase()
}

/// Trimmed text, or `"Unknown"` when empty
pub fn or_unknown(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        crate::models::UNKNOWN.to_string()
    } else {
        text.to_string()
    }
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    let tail = text.get(split..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        text.get(..split)
    } else {
        None
    }
}
