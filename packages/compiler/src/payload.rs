// ABOUTME: Wire format between the build driver and the compile orchestrator
// ABOUTME: Success payload on stdout, structured failure message on stderr

use crate::schema::derive_schema;
use playground_core::{CompiledArtifact, InputSchema, RenderParts};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One JSON object printed by the build driver on success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPayload {
    /// Payload format revision; drivers that predate `props` omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub script: String,
    pub template: String,
    #[serde(default)]
    pub has_template: bool,
    /// Schema already derived by the driver
    #[serde(default)]
    pub props_schema: Option<InputSchema>,
    /// Raw input declarations, derived into a schema on this side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    /// Render procedure split into signature, hoisted block and body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderParts>,
}

impl BuildPayload {
    pub fn parse(stdout: &str) -> serde_json::Result<Self> {
        serde_json::from_str(stdout.trim())
    }

    pub fn into_artifact(self) -> CompiledArtifact {
        let schema = match &self.props {
            Some(declarations) => derive_schema(declarations),
            None => self.props_schema,
        };
        let artifact = CompiledArtifact::new(self.script, self.template, self.has_template, schema);
        match self.render {
            Some(render) => artifact.with_render(render),
            None => artifact,
        }
    }
}

/// `{ "error": "..." }` written to stderr when the driver gives up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildFailure {
    pub error: String,
}

impl BuildFailure {
    /// Last structured failure found in the driver's stderr, if any
    pub fn find(stderr: &str) -> Option<Self> {
        stderr
            .lines()
            .rev()
            .filter_map(|line| serde_json::from_str::<BuildFailure>(line.trim()).ok())
            .next()
    }
}
