// ABOUTME: Core types shared across the playground pipeline
// ABOUTME: Compiled artifacts, JSON-Schema input descriptions, input value maps and their store

pub mod artifact;
pub mod sample;
pub mod schema;
pub mod store;
pub mod values;

pub use artifact::{CompiledArtifact, RenderParts};
pub use sample::SAMPLE_COMPONENT;
pub use schema::{InputSchema, SchemaProperties, SchemaProperty, JSON_SCHEMA_DRAFT};
pub use store::InputValueStore;
pub use values::InputValues;
