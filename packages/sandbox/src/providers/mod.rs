// ABOUTME: Provider traits and implementations for sandbox execution backends
// ABOUTME: Narrow boundary of boot, mkdir, write-file and process spawn with streamed output

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

pub mod docker;
pub mod local;

pub use docker::DockerProvider;
pub use local::LocalProvider;

/// Errors are `Clone` so a single failed boot can be handed to every caller
/// that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SandboxError {
    #[error("Sandbox setup failed: {0}")]
    Setup(String),

    #[error("Sandbox not available: {0}")]
    NotAvailable(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Invalid sandbox path: {0}")]
    InvalidPath(String),

    #[error("Container error: {0}")]
    Container(String),
}

pub type Result<T> = std::result::Result<T, SandboxError>;

#[derive(Debug, Clone, Default)]
pub struct SpawnOptions {
    /// Working directory inside the sandbox
    pub cwd: Option<String>,
    pub env: HashMap<String, String>,
}

impl SpawnOptions {
    pub fn in_dir(cwd: impl Into<String>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            env: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone)]
pub struct OutputChunk {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub stream: StreamType,
    pub data: Vec<u8>,
}

impl OutputChunk {
    pub fn new(stream: StreamType, data: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            stream,
            data: data.into(),
        }
    }

    pub fn stdout(data: impl Into<Vec<u8>>) -> Self {
        Self::new(StreamType::Stdout, data)
    }

    pub fn stderr(data: impl Into<Vec<u8>>) -> Self {
        Self::new(StreamType::Stderr, data)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Output of a spawned process. Closes once every producer has finished.
pub struct OutputStream {
    pub receiver: mpsc::UnboundedReceiver<OutputChunk>,
}

/// Resolves to the exit code of a spawned process
pub struct ExitHandle {
    receiver: oneshot::Receiver<i64>,
}

impl ExitHandle {
    pub async fn code(self) -> Result<i64> {
        self.receiver.await.map_err(|_| {
            SandboxError::Process("Process ended without reporting an exit code".to_string())
        })
    }
}

/// Producer side of a [`SpawnedProcess`], held by the provider
pub struct ProcessIo {
    pub output: mpsc::UnboundedSender<OutputChunk>,
    pub exit: oneshot::Sender<i64>,
}

/// Handle to a process running inside a sandbox
pub struct SpawnedProcess {
    pub output: OutputStream,
    pub exit: ExitHandle,
}

impl SpawnedProcess {
    /// Create a connected process handle and its producer side
    pub fn channel() -> (ProcessIo, SpawnedProcess) {
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = oneshot::channel();
        (
            ProcessIo {
                output: output_tx,
                exit: exit_tx,
            },
            SpawnedProcess {
                output: OutputStream {
                    receiver: output_rx,
                },
                exit: ExitHandle { receiver: exit_rx },
            },
        )
    }
}

/// Acquires fresh isolated environments
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &str;

    /// Boot a new, empty environment
    async fn boot(&self) -> Result<Arc<dyn SandboxEnvironment>>;
}

/// A booted environment with its own filesystem and process table
#[async_trait]
pub trait SandboxEnvironment: Send + Sync {
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<()>;

    async fn write_file(&self, path: &str, contents: &str) -> Result<()>;

    async fn spawn(
        &self,
        command: &str,
        args: &[String],
        options: SpawnOptions,
    ) -> Result<SpawnedProcess>;

    /// Release the environment's resources
    async fn teardown(&self) -> Result<()>;
}
