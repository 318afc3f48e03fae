//! Placeholder syntax: a tag name wrapped in a comment marker, `/*Name*/`.
//!
//! Names start with an ASCII letter, digit or underscore and may continue
//! with `.` and `-`. Whitespace is not allowed inside the marker, so ordinary
//! CSS or script comments such as `/* header */` are left alone.

use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\*([A-Za-z0-9_][A-Za-z0-9_.\-]*)\*/").expect("Invalid placeholder regex")
});

/// Distinct placeholder names in order of first appearance.
pub fn extract_placeholders(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// The marker text for `tag`.
pub fn marker(tag: &str) -> String {
    format!("/*{}*/", tag)
}

/// Replace every placeholder in one pass.
///
/// Replacement text is never rescanned, so a value that itself looks like a
/// placeholder is emitted verbatim.
pub fn replace_placeholders<F>(html: &str, mut replacement: F) -> String
where
    F: FnMut(&str) -> String,
{
    PLACEHOLDER
        .replace_all(html, |caps: &Captures<'_>| replacement(&caps[1]))
        .into_owned()
}
