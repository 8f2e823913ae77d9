// ABOUTME: Configuration crate for the component playground
// ABOUTME: Environment variable names, env parsing helpers and the resolved PlaygroundConfig

pub mod constants;
pub mod env;
pub mod settings;

pub use settings::{ConfigError, PlaygroundConfig, SandboxKind};
