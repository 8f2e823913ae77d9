// ABOUTME: Derives the input schema from a component's declared inputs
// ABOUTME: Handles shorthand type references and full declarations with mvt metadata

use playground_core::{InputSchema, SchemaProperties, SchemaProperty};
use serde_json::{Map, Value};
use tracing::debug;

const CTOR_KEY: &str = "$ctor";

/// Build an input schema from the build driver's encoded declarations.
///
/// Returns `None` when nothing resolves to a property. Declarations whose
/// type cannot be resolved are skipped.
pub fn derive_schema(declarations: &Map<String, Value>) -> Option<InputSchema> {
    let mut properties = SchemaProperties::new();

    for (name, declaration) in declarations {
        match derive_property(declaration) {
            Some(property) => properties.insert(name.clone(), property),
            None => debug!("Skipping input '{}' with unsupported declaration", name),
        }
    }

    if properties.is_empty() {
        None
    } else {
        Some(InputSchema::with_properties(properties))
    }
}

fn derive_property(declaration: &Value) -> Option<SchemaProperty> {
    let fields = declaration.as_object()?;

    // Shorthand: `title: String`
    if let Some(ctor) = fields.get(CTOR_KEY) {
        return type_name(ctor).map(SchemaProperty::of_type);
    }

    let mut property = SchemaProperty::of_type(resolve_type(fields.get("type")?)?);
    property.default = fields.get("default").cloned();

    if let Some(mvt) = fields.get("mvt").and_then(Value::as_object) {
        property.description = mvt.get("description").filter(|d| is_truthy(d)).cloned();
        property.minimum = mvt.get("min").cloned();
        property.maximum = mvt.get("max").cloned();
    }

    Some(property)
}

/// `{"$ctor": "Number"}` or an alias string such as `"Number"`
fn resolve_type(declared: &Value) -> Option<String> {
    match declared {
        Value::Object(reference) => type_name(reference.get(CTOR_KEY)?),
        other => type_name(other),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn type_name(name: &Value) -> Option<String> {
    name.as_str()
        .filter(|n| !n.is_empty())
        .map(str::to_lowercase)
}
