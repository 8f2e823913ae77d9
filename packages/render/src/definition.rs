// ABOUTME: Prepares compiled behavior code for evaluation as a single expression
// ABOUTME: Strips the default-export wrapper and parenthesizes the remaining object

use once_cell::sync::Lazy;
use regex::Regex;

static DEFAULT_EXPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"export\s+default\s+").expect("export pattern is valid"));

/// Expression evaluating to the component definition object
pub fn definition_expression(behavior_code: &str) -> String {
    let cleaned = DEFAULT_EXPORT.replace(behavior_code.trim(), "");
    format!("({})", cleaned)
}
