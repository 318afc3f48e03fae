//! `{variable}` substitution for prompt and command templates.
//!
//! Configured prompt templates and external command lines both use this
//! syntax:
//!
//! - `{name}` substitutes the value of `name`
//! - `{{` and `}}` render as literal braces
//!
//! Unknown variables are an error rather than an empty substitution, so a
//! typo in a configured template is caught at config validation time.

use std::collections::HashMap;
use std::fmt;

/// Error raised when a template cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarsError {
    UndefinedVariable { name: String, position: usize },
    UnmatchedBrace { position: usize },
    EmptyVariableName { position: usize },
}

impl fmt::Display for VarsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarsError::UndefinedVariable { name, position } => {
                write!(f, "undefined variable '{}' at position {}", name, position)
            }
            VarsError::UnmatchedBrace { position } => {
                write!(f, "unmatched '{{' at position {}", position)
            }
            VarsError::EmptyVariableName { position } => {
                write!(f, "empty variable name '{{}}' at position {}", position)
            }
        }
    }
}

impl std::error::Error for VarsError {}

enum Segment<'t> {
    Literal(String),
    Var { name: &'t str, position: usize },
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>, VarsError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                literal.push('{');
            }
            '{' => {
                let end = loop {
                    match chars.next() {
                        Some((end, '}')) => break end,
                        Some(_) => {}
                        None => return Err(VarsError::UnmatchedBrace { position: pos }),
                    }
                };
                let name = template[pos + 1..end].trim();
                if name.is_empty() {
                    return Err(VarsError::EmptyVariableName { position: pos });
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Var {
                    name,
                    position: pos,
                });
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                }
                literal.push('}');
            }
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Render `template`, substituting each `{name}` from `variables`.
pub fn substitute(
    template: &str,
    variables: &HashMap<&str, String>,
) -> Result<String, VarsError> {
    let mut out = String::with_capacity(template.len());
    for segment in parse(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Var { name, position } => {
                let value = variables
                    .get(name)
                    .ok_or_else(|| VarsError::UndefinedVariable {
                        name: name.to_string(),
                        position,
                    })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

/// Names of the variables a template references, in order of appearance.
pub fn referenced(template: &str) -> Result<Vec<String>, VarsError> {
    Ok(parse(template)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Var { name, .. } => Some(name.to_string()),
            Segment::Literal(_) => None,
        })
        .collect())
}

/// Build a variable map from key/value pairs.
pub fn vars<'a, I, V>(pairs: I) -> HashMap<&'a str, String>
where
    I: IntoIterator<Item = (&'a str, V)>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k, v.into())).collect()
}
