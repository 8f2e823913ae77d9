// ABOUTME: Top-level error for the playground facade
// ABOUTME: Wraps configuration, sandbox, compilation and render failures

use playground_compiler::CompilationError;
use playground_config::ConfigError;
use playground_render::RenderError;
use playground_sandbox::SandboxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaygroundError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

pub type Result<T> = std::result::Result<T, PlaygroundError>;
