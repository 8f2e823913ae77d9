// ABOUTME: Immutable result of one successful compilation
// ABOUTME: Behavior code, render code, template presence flag and the derived input schema

use crate::schema::InputSchema;
use serde::{Deserialize, Serialize};

/// Render procedure already split by the build driver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderParts {
    /// Parameter names as written in the compiled signature
    #[serde(default)]
    pub params: Vec<String>,
    /// Declarations emitted before the render function
    #[serde(default)]
    pub hoisted: String,
    /// Everything between the signature's opening brace and the final one
    pub body: String,
}

/// Output of one compilation run. A new compilation replaces the artifact
/// wholesale; it is never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledArtifact {
    /// Component definition source (logic, state, lifecycle)
    pub behavior_code: String,
    /// Render procedure source plus hoisted constant declarations
    pub template_code: String,
    pub has_template: bool,
    pub schema: Option<InputSchema>,
    /// Structured form of `template_code`, when the driver provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderParts>,
}

impl CompiledArtifact {
    pub fn new(
        behavior_code: impl Into<String>,
        template_code: impl Into<String>,
        has_template: bool,
        schema: Option<InputSchema>,
    ) -> Self {
        Self {
            behavior_code: behavior_code.into(),
            template_code: template_code.into(),
            has_template,
            schema,
            render: None,
        }
    }

    pub fn with_render(mut self, render: RenderParts) -> Self {
        self.render = Some(render);
        self
    }

    pub fn has_inputs(&self) -> bool {
        self.schema
            .as_ref()
            .map(InputSchema::has_properties)
            .unwrap_or(false)
    }
}
