// ABOUTME: Synthesizes the render procedure source handed to the script engine
// ABOUTME: Primitives prelude, then hoisted declarations, then the compiled body

use crate::error::Result;
use crate::extract::extract_render;
use crate::primitives::{prelude, PRIMITIVES_BINDING};
use playground_core::{CompiledArtifact, RenderParts};

/// Instance context and render cache
pub const RENDER_PARAMS: [&str; 2] = ["_ctx", "_cache"];

/// Source of a render procedure ready for compilation by a [`ScriptEngine`].
///
/// The procedure takes [`RENDER_PARAMS`] and expects the engine to bind its
/// primitives table under `primitives_binding`. Nothing else from the host is
/// in scope.
///
/// [`ScriptEngine`]: crate::engine::ScriptEngine
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSource {
    pub params: Vec<String>,
    pub primitives_binding: String,
    pub code: String,
}

impl RenderSource {
    /// Use the driver's structured render parts, falling back to splitting
    /// `template_code` when the artifact has none
    pub fn for_artifact(artifact: &CompiledArtifact) -> Result<Self> {
        match &artifact.render {
            Some(parts) => Ok(Self::from_parts(parts)),
            None => Self::synthesize(&artifact.template_code),
        }
    }

    pub fn synthesize(template_code: &str) -> Result<Self> {
        Ok(Self::from_parts(&extract_render(template_code)?))
    }

    pub fn from_parts(parts: &RenderParts) -> Self {
        let mut code = prelude();
        if !parts.hoisted.is_empty() {
            code.push('\n');
            code.push_str(&parts.hoisted);
            code.push('\n');
        }
        code.push('\n');
        code.push_str(&parts.body);

        Self {
            params: RENDER_PARAMS.iter().map(|p| p.to_string()).collect(),
            primitives_binding: PRIMITIVES_BINDING.to_string(),
            code,
        }
    }
}
