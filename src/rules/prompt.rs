//! Instructions sent to the text-generation service.
//!
//! Both templates are configurable and use `{name}` substitution. The system
//! template may reference `tag` and `function_name`; the user template may
//! additionally reference `prompt` and `sample` (the pretty-printed JSON
//! sample of the uploaded data).

use crate::data::DataMapping;
use crate::error::{DocfillError, Result};
use crate::rules::store::sanitize_tag;
use crate::vars;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a JavaScript code generator. Generate a single \
JavaScript function named '{function_name}' that accepts one argument 'data' (an object) and \
returns a string value for the template placeholder. Use only JavaScript. Do NOT include ANY \
markdown or explanation. Function should be robust (handle missing properties) and return a \
string. Example: function generate_X(data) {{ try {{ return data.X || ''; }} catch(e) {{ return ''; }} }}";

pub const DEFAULT_USER_PROMPT: &str = "Tag: {tag}\nPrompt: {prompt}\n\nXML sample data (JSON):\n\
{sample}\n\nGenerate the JS function now.";

pub const SYSTEM_PROMPT_VARS: &[&str] = &["tag", "function_name"];
pub const USER_PROMPT_VARS: &[&str] = &["tag", "function_name", "prompt", "sample"];

/// The entry point the model is asked to emit for `tag`.
pub fn function_name(tag: &str) -> String {
    format!("generate_{}", sanitize_tag(tag))
}

/// Rendered system and user instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    pub system: String,
    pub user: String,
}

/// Render both templates for one generation request.
pub fn render_prompts(
    system_template: &str,
    user_template: &str,
    tag: &str,
    prompt: &str,
    sample: &DataMapping,
) -> Result<Prompts> {
    let variables = vars::vars([
        ("tag", tag.to_string()),
        ("function_name", function_name(tag)),
        ("prompt", prompt.to_string()),
        ("sample", sample.to_json_pretty()),
    ]);

    let system = vars::substitute(system_template, &variables).map_err(|e| {
        DocfillError::Configuration(format!("invalid generator.system_prompt: {}", e))
    })?;
    let user = vars::substitute(user_template, &variables).map_err(|e| {
        DocfillError::Configuration(format!("invalid generator.user_prompt: {}", e))
    })?;

    Ok(Prompts { system, user })
}

/// Check that `template` only references variables from `allowed`.
pub fn check_template(field: &str, template: &str, allowed: &[&str]) -> Result<()> {
    let names = vars::referenced(template)
        .map_err(|e| DocfillError::Configuration(format!("invalid {}: {}", field, e)))?;
    if let Some(unknown) = names.iter().find(|n| !allowed.contains(&n.as_str())) {
        return Err(DocfillError::Configuration(format!(
            "invalid {}: unknown variable '{{{}}}' (available: {})",
            field,
            unknown,
            allowed.join(", ")
        )));
    }
    Ok(())
}
