// ABOUTME: Error type for render synthesis and mounting
// ABOUTME: Extraction, definition, engine and mount failures

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Failed to extract render function")]
    Extraction,

    #[error("Invalid component definition: {0}")]
    Definition(String),

    #[error("Script engine error: {0}")]
    Engine(String),

    #[error("Mount failed: {0}")]
    Mount(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
