// ABOUTME: Compile orchestrator: runs the build driver in the sandbox and parses its payload
// ABOUTME: Output is read against an overall deadline; the exit code decides success

use crate::payload::{BuildFailure, BuildPayload};
use playground_config::PlaygroundConfig;
use playground_core::CompiledArtifact;
use playground_sandbox::{OutputStream, SandboxError, SandboxSession, SpawnedProcess, StreamType};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum CompilationError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("Compilation failed. Exit code: {exit_code}{}", reason_suffix(.reason))]
    BuildFailed {
        exit_code: i64,
        reason: Option<String>,
    },

    #[error("Compilation failed. Exit code: {exit_code} (no output)")]
    EmptyOutput { exit_code: i64 },

    #[error("Malformed compiler output: {0}")]
    MalformedPayload(String),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, CompilationError>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompilationState {
    #[default]
    Idle,
    Compiling,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub node_bin: String,
    pub driver_script: String,
    /// Overall budget for reading the driver's output
    pub read_timeout: Duration,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::from_config(&PlaygroundConfig::default())
    }
}

impl CompilerOptions {
    pub fn from_config(config: &PlaygroundConfig) -> Self {
        Self {
            node_bin: config.node_bin.clone(),
            driver_script: crate::driver::DRIVER_FILE.to_string(),
            read_timeout: config.compile_timeout,
        }
    }
}

/// Output collected from a process until it closed or the deadline passed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

/// Collect output until the stream closes or `timeout` elapses overall.
///
/// Hitting the deadline is not an error: whatever arrived so far is returned
/// and the process keeps running.
pub async fn read_with_timeout(output: &mut OutputStream, timeout: Duration) -> CapturedOutput {
    let deadline = Instant::now() + timeout;
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut timed_out = false;

    loop {
        match timeout_at(deadline, output.receiver.recv()).await {
            Ok(Some(chunk)) => match chunk.stream {
                StreamType::Stdout => stdout.extend_from_slice(&chunk.data),
                StreamType::Stderr => stderr.extend_from_slice(&chunk.data),
            },
            Ok(None) => break,
            Err(_) => {
                warn!("Stopped reading compiler output after {:?}", timeout);
                timed_out = true;
                break;
            }
        }
    }

    // Decode once so multi-byte characters split across chunks survive
    CapturedOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        timed_out,
    }
}

/// Compilation Orchestrator.
///
/// Each [`compile`](Self::compile) rewrites the component source in the shared
/// sandbox and runs the build driver once. The latest artifact and the state
/// of the last run stay observable until [`reset`](Self::reset).
pub struct ComponentCompiler {
    session: Arc<SandboxSession>,
    options: CompilerOptions,
    state: RwLock<CompilationState>,
    compiled: RwLock<Option<Arc<CompiledArtifact>>>,
}

impl ComponentCompiler {
    pub fn new(session: Arc<SandboxSession>, options: CompilerOptions) -> Self {
        Self {
            session,
            options,
            state: RwLock::new(CompilationState::Idle),
            compiled: RwLock::new(None),
        }
    }

    pub fn session(&self) -> &Arc<SandboxSession> {
        &self.session
    }

    pub async fn state(&self) -> CompilationState {
        self.state.read().await.clone()
    }

    pub async fn is_compiling(&self) -> bool {
        *self.state.read().await == CompilationState::Compiling
    }

    pub async fn compilation_error(&self) -> Option<String> {
        match &*self.state.read().await {
            CompilationState::Error(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Artifact of the most recent successful compile
    pub async fn compiled(&self) -> Option<Arc<CompiledArtifact>> {
        self.compiled.read().await.clone()
    }

    pub async fn reset(&self) {
        *self.compiled.write().await = None;
        *self.state.write().await = CompilationState::Idle;
    }

    pub async fn compile(&self, source: &str) -> Result<Arc<CompiledArtifact>> {
        *self.state.write().await = CompilationState::Compiling;

        match self.run(source).await {
            Ok(artifact) => {
                *self.compiled.write().await = Some(artifact.clone());
                *self.state.write().await = CompilationState::Idle;
                Ok(artifact)
            }
            Err(e) => {
                error!("Compilation error: {}", e);
                *self.state.write().await = CompilationState::Error(e.to_string());
                Err(e)
            }
        }
    }

    async fn run(&self, source: &str) -> Result<Arc<CompiledArtifact>> {
        self.session.ensure_ready().await?;
        self.session.write_source_file(source).await?;

        info!("Running component compiler...");
        let SpawnedProcess { mut output, exit } = self
            .session
            .spawn_process(
                &self.options.node_bin,
                std::slice::from_ref(&self.options.driver_script),
            )
            .await?;

        let captured = read_with_timeout(&mut output, self.options.read_timeout).await;
        if !captured.stderr.trim().is_empty() {
            debug!("Compiler stderr: {}", captured.stderr.trim());
        }

        let exit_code = exit.code().await?;
        info!("Compilation exit code: {}", exit_code);

        if exit_code != 0 {
            return Err(CompilationError::BuildFailed {
                exit_code,
                reason: BuildFailure::find(&captured.stderr).map(|f| f.error),
            });
        }

        let stdout = captured.stdout.trim();
        if stdout.is_empty() {
            return Err(CompilationError::EmptyOutput { exit_code });
        }

        let payload = BuildPayload::parse(stdout)
            .map_err(|e| CompilationError::MalformedPayload(e.to_string()))?;
        Ok(Arc::new(payload.into_artifact()))
    }
}
