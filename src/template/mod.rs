//! HTML templates: placeholder extraction and document rendering.

mod placeholders;
mod render;

pub use placeholders::{extract_placeholders, marker, replace_placeholders};
pub use render::{RenderResult, Resolution, Source, missing_rule_marker, render, rule_error_marker};
