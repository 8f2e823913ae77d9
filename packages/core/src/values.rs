// ABOUTME: Ordered map of current input values keyed by input name
// ABOUTME: A key may hold an undefined value, which is distinct from JSON null

use crate::schema::InputSchema;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Current input values.
///
/// Keys keep insertion order (schema declaration order after a reset). A key
/// whose value is `None` is present but undefined: it is listed by [`keys`]
/// and omitted from the JSON form, the same way an `undefined` property
/// disappears from `JSON.stringify` output.
///
/// [`keys`]: InputValues::keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputValues {
    entries: Vec<(String, Option<Value>)>,
}

impl InputValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per schema property, initialized to the property's default
    pub fn from_defaults(schema: &InputSchema) -> Self {
        let entries = schema
            .properties
            .iter()
            .map(|(name, property)| (name.to_string(), property.default.clone()))
            .collect();
        Self { entries }
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.put(name.into(), Some(value));
    }

    /// Keep the key but make its value undefined
    pub fn set_undefined(&mut self, name: impl Into<String>) {
        self.put(name.into(), None);
    }

    fn put(&mut self, name: String, value: Option<Value>) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Defined value for `name`; `None` for unknown or undefined keys
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// JSON object of the defined values
    pub fn to_json(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter_map(|(name, value)| value.clone().map(|v| (name.clone(), v)))
            .collect()
    }
}

impl Serialize for InputValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.entries
                .iter()
                .filter_map(|(name, value)| value.as_ref().map(|v| (name, v))),
        )
    }
}
