// ABOUTME: Local sandbox provider backed by a private directory per boot
// ABOUTME: Resolves sandbox paths inside that directory and runs tokio child processes

use super::{
    ProcessIo, Result, SandboxEnvironment, SandboxError, SandboxProvider, SpawnOptions,
    SpawnedProcess, StreamType,
};
use crate::providers::OutputChunk;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const READ_BUFFER_SIZE: usize = 8 * 1024;

pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    /// Environments are created as uniquely named directories under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl SandboxProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn boot(&self) -> Result<Arc<dyn SandboxEnvironment>> {
        let dir = self.root.join(format!("sandbox-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            SandboxError::Setup(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        info!("Booted local sandbox at {}", dir.display());
        Ok(Arc::new(LocalEnvironment { root: dir }))
    }
}

pub struct LocalEnvironment {
    root: PathBuf,
}

impl LocalEnvironment {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an absolute or relative sandbox path into the environment directory.
    /// Parent-directory components are rejected so nothing escapes the root.
    fn resolve(&self, sandbox_path: &str) -> Result<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(sandbox_path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(SandboxError::InvalidPath(sandbox_path.to_string()))
                }
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl SandboxEnvironment for LocalEnvironment {
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<()> {
        let target = self.resolve(path)?;
        let result = if recursive {
            tokio::fs::create_dir_all(&target).await
        } else {
            tokio::fs::create_dir(&target).await
        };
        result.map_err(|e| SandboxError::Filesystem(format!("mkdir {}: {}", path, e)))
    }

    async fn write_file(&self, path: &str, contents: &str) -> Result<()> {
        let target = self.resolve(path)?;
        tokio::fs::write(&target, contents)
            .await
            .map_err(|e| SandboxError::Filesystem(format!("write {}: {}", path, e)))
    }

    async fn spawn(
        &self,
        command: &str,
        args: &[String],
        options: SpawnOptions,
    ) -> Result<SpawnedProcess> {
        let cwd = match &options.cwd {
            Some(cwd) => self.resolve(cwd)?,
            None => self.root.clone(),
        };

        debug!("Spawning '{} {}' in {}", command, args.join(" "), cwd.display());

        let mut cmd = Command::new(command);
        cmd.args(args)
            .current_dir(&cwd)
            .envs(&options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            SandboxError::Process(format!("Failed to spawn process '{}': {}", command, e))
        })?;

        let (ProcessIo { output, exit }, process) = SpawnedProcess::channel();

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward(stdout, StreamType::Stdout, output.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward(stderr, StreamType::Stderr, output.clone()));
        }
        drop(output);

        let command = command.to_string();
        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code().map(i64::from).unwrap_or(-1),
                Err(e) => {
                    warn!("Failed to wait for '{}': {}", command, e);
                    -1
                }
            };
            debug!("Process '{}' exited with code {}", command, code);
            let _ = exit.send(code);
        });

        Ok(process)
    }

    async fn teardown(&self) -> Result<()> {
        info!("Removing local sandbox at {}", self.root.display());
        tokio::fs::remove_dir_all(&self.root)
            .await
            .map_err(|e| SandboxError::Filesystem(format!("teardown: {}", e)))
    }
}

/// Copy a pipe into the output channel chunk by chunk. Keeps draining after
/// the receiver is gone so the child never blocks on a full pipe.
async fn forward<R>(mut pipe: R, stream: StreamType, tx: mpsc::UnboundedSender<OutputChunk>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let _ = tx.send(OutputChunk::new(stream, &buf[..n]));
            }
            Err(e) => {
                warn!("Error reading {:?} pipe: {}", stream, e);
                break;
            }
        }
    }
}
