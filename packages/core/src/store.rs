// ABOUTME: Owner of the current input schema and input values
// ABOUTME: Re-initializes values from schema defaults whenever a new schema is installed

use crate::artifact::CompiledArtifact;
use crate::schema::InputSchema;
use crate::values::InputValues;
use serde_json::Value;
use tracing::debug;

/// Input Value Store.
///
/// After every [`update_schema`](Self::update_schema) the value keys are
/// exactly the schema's property names, each holding that property's default.
/// Values are not validated against the schema; bounds are advisory metadata
/// for the editor.
#[derive(Debug, Default)]
pub struct InputValueStore {
    schema: Option<InputSchema>,
    values: InputValues,
}

impl InputValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the schema of `artifact`, or clear everything when absent
    pub fn update_schema(&mut self, artifact: Option<&CompiledArtifact>) {
        let Some(artifact) = artifact else {
            self.schema = None;
            self.values.clear();
            return;
        };

        let schema = artifact.schema.clone().unwrap_or_default();
        self.values = InputValues::from_defaults(&schema);
        debug!(
            "Installed input schema with {} properties",
            schema.properties.len()
        );
        self.schema = Some(schema);
    }

    pub fn update_value(&mut self, name: impl Into<String>, value: Value) {
        self.values.set(name, value);
    }

    pub fn reset_values(&mut self) {
        self.values = match &self.schema {
            Some(schema) => InputValues::from_defaults(schema),
            None => InputValues::new(),
        };
    }

    pub fn schema(&self) -> Option<&InputSchema> {
        self.schema.as_ref()
    }

    pub fn values(&self) -> &InputValues {
        &self.values
    }

    pub fn has_properties(&self) -> bool {
        self.schema
            .as_ref()
            .map(InputSchema::has_properties)
            .unwrap_or(false)
    }

    pub fn formatted_schema(&self) -> Option<String> {
        self.schema.as_ref().map(InputSchema::to_pretty_json)
    }
}
