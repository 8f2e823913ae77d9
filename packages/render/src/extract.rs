// ABOUTME: Fallback splitting of compiled render code into hoisted declarations and body
// ABOUTME: Used for payloads that carry render code only as text

use crate::error::{RenderError, Result};
use once_cell::sync::Lazy;
use playground_core::RenderParts;
use regex::Regex;

static PRIMITIVES_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s+\{[^}]+\}\s+from\s+['"]vue['"];?\s*"#)
        .expect("primitives import pattern is valid")
});

static HOISTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(.*?)export function render").expect("hoisted pattern is valid")
});

static RENDER_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)export function render\(([^)]*)\)\s*\{(.*)\}$")
        .expect("render pattern is valid")
});

pub fn extract_render(template_code: &str) -> Result<RenderParts> {
    let stripped = PRIMITIVES_IMPORT.replace_all(template_code, "");
    let code = stripped.trim_end();

    let hoisted = HOISTED
        .captures(code)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let captures = RENDER_FUNCTION
        .captures(code)
        .ok_or(RenderError::Extraction)?;

    let params = captures
        .get(1)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    Ok(RenderParts {
        params,
        hoisted,
        body: captures
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    })
}
