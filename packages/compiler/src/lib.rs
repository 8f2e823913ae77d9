// ABOUTME: Component compilation for the playground
// ABOUTME: Build driver asset, wire payload, schema derivation and the compile orchestrator

pub mod driver;
pub mod orchestrator;
pub mod payload;
pub mod schema;

pub use driver::{dependency_manifest, project_layout, BUILD_DRIVER};
pub use orchestrator::{
    read_with_timeout, CapturedOutput, CompilationError, CompilationState, CompilerOptions,
    ComponentCompiler, Result,
};
pub use payload::{BuildFailure, BuildPayload};
pub use schema::derive_schema;
