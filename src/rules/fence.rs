//! Markdown code-fence stripping for generated code.

const FENCE: &str = "```";

const LANGUAGE_TAGS: &[&str] = &[
    "javascript",
    "js",
    "node",
    "ecmascript",
    "typescript",
    "ts",
    "mjs",
    "cjs",
];

/// Extract code from text that may be wrapped in a Markdown fence.
///
/// Without a fence the whole text is returned trimmed. With one, the content
/// between the first fence and the next (or the end of text) is kept, and a
/// bare language tag on its first line is dropped.
pub fn strip_fences(text: &str) -> String {
    let Some(open) = text.find(FENCE) else {
        return text.trim().to_string();
    };
    let inner = &text[open + FENCE.len()..];
    let inner = match inner.find(FENCE) {
        Some(close) => &inner[..close],
        None => inner,
    };

    let (first_line, rest) = match inner.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (inner, ""),
    };
    let info = first_line.trim();
    if info.is_empty() || is_language_tag(info) {
        rest.trim().to_string()
    } else {
        inner.trim().to_string()
    }
}

fn is_language_tag(info: &str) -> bool {
    LANGUAGE_TAGS
        .iter()
        .any(|tag| tag.eq_ignore_ascii_case(info))
}
