// ABOUTME: JSON-Schema shaped description of a component's configurable inputs
// ABOUTME: Keeps declaration order and distinguishes absent defaults from explicit null

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const JSON_SCHEMA_DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// One configurable input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
    /// Any truthy value the declaration carried, usually a string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub maximum: Option<Value>,
}

impl SchemaProperty {
    pub fn of_type(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            default: None,
            description: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

// A key that is present maps to Some, even when its value is null
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Property table in declaration order. Names are unique; inserting an
/// existing name replaces its definition in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaProperties(Vec<(String, SchemaProperty)>);

impl SchemaProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, property: SchemaProperty) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = property,
            None => self.0.push((name, property)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SchemaProperty> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, property)| property)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaProperty)> {
        self.0.iter().map(|(name, property)| (name.as_str(), property))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SchemaProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, property)| (name, property)))
    }
}

impl<'de> Deserialize<'de> for SchemaProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        let mut properties = SchemaProperties::new();
        for (name, value) in raw {
            let property = SchemaProperty::deserialize(value).map_err(D::Error::custom)?;
            properties.insert(name, property);
        }
        Ok(properties)
    }
}

/// `{ $schema, type: "object", properties }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "$schema")]
    pub schema: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: SchemaProperties,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::with_properties(SchemaProperties::new())
    }
}

impl InputSchema {
    pub fn with_properties(properties: SchemaProperties) -> Self {
        Self {
            schema: JSON_SCHEMA_DRAFT.to_string(),
            kind: "object".to_string(),
            properties,
        }
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    /// Indented JSON for display next to the editor
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
