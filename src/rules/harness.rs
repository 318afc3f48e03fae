//! Rule artifacts: a generated function body wrapped in a runner harness.
//!
//! An artifact is a self-contained Node.js script laid out as
//!
//! ```text
//! // docfill rule artifact
//! // tag: "<tag as a JSON string>"
//! <generated body>
//! <runner>
//! ```
//!
//! The runner reads a JSON object from stdin, resolves the entry point from a
//! candidate list computed here at generation time, calls it with the data and
//! writes the result to stdout. Exit code 2 means no candidate resolved to a
//! function; exit code 3 means the input was not JSON or the function threw.

use crate::error::{DocfillError, Result};
use crate::rules::store::sanitize_tag;
use regex::Regex;
use std::sync::LazyLock;

pub const HEADER_LINE: &str = "// docfill rule artifact";
const TAG_LINE_PREFIX: &str = "// tag: ";

/// Harness exit code when no candidate name resolves to a function.
pub const EXIT_NO_FUNCTION: i32 = 2;
/// Harness exit code when the input is not JSON or the function threw.
pub const EXIT_RULE_ERROR: i32 = 3;

static FUNCTION_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bfunction\s*\*?\s*([A-Za-z_$][\w$]*)\s*\(").expect("Invalid function regex")
});

static BINDING_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)",
    )
    .expect("Invalid binding regex")
});

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*$").expect("Invalid identifier regex"));

const RUNNER: &str = r#"
// ---- docfill runner ----
;(function () {
  const __candidates = __CANDIDATES__;
  let __input = '';
  process.stdin.setEncoding('utf8');
  process.stdin.on('data', (chunk) => { __input += chunk; });
  process.stdin.on('end', () => {
    let __data;
    try {
      __data = __input.trim() === '' ? {} : JSON.parse(__input);
    } catch (err) {
      process.stderr.write('ERROR_RUNNING_RULE: invalid input: ' + err.message);
      process.exitCode = 3;
      return;
    }
    let __entry = null;
    for (const __name of __candidates) {
      try {
        const __candidate = eval(__name);
        if (typeof __candidate === 'function') { __entry = __candidate; break; }
      } catch (_) {}
    }
    if (__entry === null) {
      process.stderr.write('NO_FUNCTION_FOUND: tried ' + __candidates.join(', '));
      process.exitCode = 2;
      return;
    }
    Promise.resolve()
      .then(() => __entry(__data))
      .then((result) => {
        let out;
        if (result === undefined || result === null) out = '';
        else if (typeof result === 'string') out = result;
        else if (typeof result === 'object') out = JSON.stringify(result);
        else out = String(result);
        process.stdout.write(out);
      })
      .catch((err) => {
        process.stderr.write('ERROR_RUNNING_RULE: ' + (err && err.message ? err.message : String(err)));
        process.exitCode = 3;
      });
  });
})();
"#;

/// A generated body bound to its tag and entry-point candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleArtifact {
    tag: String,
    body: String,
    candidates: Vec<String>,
}

impl RuleArtifact {
    /// Bind `body` to `tag`.
    ///
    /// Fails with `Upstream` when the body is empty or declares no function,
    /// since such output has no entry point to call.
    pub fn new(tag: &str, body: &str) -> Result<Self> {
        let body = body.trim();
        if body.is_empty() {
            return Err(DocfillError::Upstream(
                "generated code is empty".to_string(),
            ));
        }
        let declared = declared_functions(body);
        if declared.is_empty() {
            return Err(DocfillError::Upstream(
                "generated code does not declare a function".to_string(),
            ));
        }

        let mut candidates = candidate_names(tag);
        for name in declared.into_iter().rev() {
            if !candidates.contains(&name) {
                candidates.push(name);
            }
        }

        Ok(Self {
            tag: tag.to_string(),
            body: body.to_string(),
            candidates,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Names the runner tries, in order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Full script text as written to the rule store.
    pub fn render(&self) -> String {
        let tag_json = serde_json::to_string(&self.tag).unwrap_or_else(|_| "\"\"".to_string());
        let candidates_json =
            serde_json::to_string(&self.candidates).unwrap_or_else(|_| "[]".to_string());

        let mut out = String::with_capacity(self.body.len() + RUNNER.len() + 128);
        out.push_str(HEADER_LINE);
        out.push('\n');
        out.push_str(TAG_LINE_PREFIX);
        out.push_str(&tag_json);
        out.push('\n');
        out.push_str(&self.body);
        out.push('\n');
        out.push_str(&RUNNER.replace("__CANDIDATES__", &candidates_json));
        out
    }
}

/// Convention-derived entry-point names for `tag`, most specific first.
///
/// Only names that are valid JavaScript identifiers are returned.
pub fn candidate_names(tag: &str) -> Vec<String> {
    let safe = sanitize_tag(tag);
    let lower = safe.to_lowercase();
    let capitalized = capitalize(&safe);

    let raw = [
        format!("generate_{}", tag),
        format!("generate{}", tag),
        format!("generate_{}", safe),
        format!("generate{}", safe),
        format!("generate_{}", lower),
        format!("generate{}", lower),
        format!("generate_{}", capitalized),
        format!("generate{}", capitalized),
        "generate".to_string(),
    ];

    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for name in raw {
        if IDENTIFIER.is_match(&name) && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Functions declared in `body`, in source order.
pub fn declared_functions(body: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = FUNCTION_DECL
        .captures_iter(body)
        .chain(BINDING_DECL.captures_iter(body))
        .filter_map(|caps| caps.get(1).map(|m| (m.start(), m.as_str().to_string())))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);

    let mut names: Vec<String> = Vec::new();
    for (_, name) in found {
        names.retain(|existing| existing != &name);
        names.push(name);
    }
    names
}

/// Recover the tag recorded in an artifact's header, if present.
pub fn read_tag(artifact: &str) -> Option<String> {
    let mut lines = artifact.lines();
    if lines.next()? != HEADER_LINE {
        return None;
    }
    let json = lines.next()?.strip_prefix(TAG_LINE_PREFIX)?;
    serde_json::from_str(json).ok()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
