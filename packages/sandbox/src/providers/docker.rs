// ABOUTME: Docker sandbox provider, one long-lived container per boot
// ABOUTME: Uses bollard for container lifecycle, exec-based spawn and tar uploads

use super::{
    OutputChunk, ProcessIo, Result, SandboxEnvironment, SandboxError, SandboxProvider,
    SpawnOptions, SpawnedProcess, StreamType,
};
use async_trait::async_trait;
use bollard::{
    container::{
        Config, CreateContainerOptions, LogOutput, RemoveContainerOptions, StartContainerOptions,
        UploadToContainerOptions,
    },
    exec::{CreateExecOptions, StartExecResults},
    image::CreateImageOptions,
    Docker,
};
use futures::StreamExt;
use std::future::Future;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

const LABEL_PREFIX: &str = "playground.sandbox";

pub struct DockerProvider {
    client: Docker,
    image: String,
    /// Timeout for image pull operations (default: 10 minutes)
    pull_timeout: Duration,
}

impl DockerProvider {
    /// Connect to the local Docker daemon
    pub fn new(image: impl Into<String>) -> Result<Self> {
        let client = Docker::connect_with_defaults()
            .map_err(|e| SandboxError::NotAvailable(format!("Docker connection error: {}", e)))?;
        Ok(Self::with_client(client, image))
    }

    pub fn with_client(client: Docker, image: impl Into<String>) -> Self {
        Self {
            client,
            image: image.into(),
            pull_timeout: Duration::from_secs(600),
        }
    }

    pub fn with_pull_timeout(mut self, timeout: Duration) -> Self {
        self.pull_timeout = timeout;
        self
    }

    /// Container kept idle so processes can be exec'd into it
    fn container_config(&self, name: &str) -> Config<String> {
        let labels = HashMap::from([
            (format!("{}.managed", LABEL_PREFIX), "true".to_string()),
            (format!("{}.name", LABEL_PREFIX), name.to_string()),
        ]);

        Config {
            image: Some(self.image.clone()),
            cmd: Some(vec!["sleep".to_string(), "infinity".to_string()]),
            labels: Some(labels),
            ..Default::default()
        }
    }

    async fn image_exists(&self) -> Result<bool> {
        match self.client.inspect_image(&self.image).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(SandboxError::Container(e.to_string())),
        }
    }

    async fn pull_image(&self) -> Result<()> {
        info!(
            "Pulling image: {} (timeout: {:?})",
            self.image, self.pull_timeout
        );

        let options = CreateImageOptions {
            from_image: self.image.clone(),
            ..Default::default()
        };
        let stream = self.client.create_image(Some(options), None, None);

        let result = tokio::time::timeout(self.pull_timeout, async {
            let mut stream = stream;
            while let Some(result) = stream.next().await {
                match result {
                    Ok(info) => {
                        if let Some(status) = &info.status {
                            debug!("Pull status: {}", status);
                        }
                        if let Some(error) = info.error {
                            return Err(SandboxError::Container(format!(
                                "Failed to pull image {}: {}",
                                self.image, error
                            )));
                        }
                    }
                    Err(e) => {
                        return Err(SandboxError::Container(format!(
                            "Failed to pull image {}: {}",
                            self.image, e
                        )));
                    }
                }
            }
            Ok(())
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(SandboxError::Container(format!(
                "Timeout pulling image {} after {:?}",
                self.image, self.pull_timeout
            ))),
        }
    }
}

#[async_trait]
impl SandboxProvider for DockerProvider {
    fn name(&self) -> &str {
        "docker"
    }

    async fn boot(&self) -> Result<Arc<dyn SandboxEnvironment>> {
        if !self.image_exists().await? {
            self.pull_image().await?;
        }

        let name = format!("playground-{}", Uuid::new_v4());
        info!("Creating sandbox container: {}", name);

        let options = CreateContainerOptions {
            name: name.clone(),
            platform: None,
        };
        let container = self
            .client
            .create_container(Some(options), self.container_config(&name))
            .await
            .map_err(|e| SandboxError::Container(e.to_string()))?;

        let environment = DockerEnvironment {
            client: self.client.clone(),
            container_id: container.id,
        };

        let start = async {
            self.client
                .start_container(
                    &environment.container_id,
                    None::<StartContainerOptions<String>>,
                )
                .await
                .map_err(|e| SandboxError::Container(e.to_string()))
        };
        undo_on_error(start, environment.teardown()).await?;

        debug!("Started sandbox container: {}", environment.container_id);
        Ok(Arc::new(environment))
    }
}

/// Await `step`; when it fails, await `undo` before returning the step's error
async fn undo_on_error<T>(
    step: impl Future<Output = Result<T>>,
    undo: impl Future<Output = Result<()>>,
) -> Result<T> {
    match step.await {
        Ok(value) => Ok(value),
        Err(e) => {
            error!("Sandbox container step failed, cleaning up: {}", e);
            if let Err(cleanup) = undo.await {
                error!("Failed to remove sandbox container: {}", cleanup);
            }
            Err(e)
        }
    }
}

pub struct DockerEnvironment {
    client: Docker,
    container_id: String,
}

impl DockerEnvironment {
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    async fn start(
        &self,
        command: Vec<String>,
        options: SpawnOptions,
    ) -> Result<(String, StartExecResults)> {
        let env: Vec<String> = options
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let exec_config = CreateExecOptions {
            cmd: Some(command),
            env: if env.is_empty() { None } else { Some(env) },
            working_dir: options.cwd,
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let exec = self
            .client
            .create_exec(&self.container_id, exec_config)
            .await
            .map_err(|e| SandboxError::Process(e.to_string()))?;

        let started = self
            .client
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| SandboxError::Process(e.to_string()))?;

        Ok((exec.id, started))
    }

    /// Run a short helper command to completion and require exit code 0
    async fn run_checked(&self, command: Vec<String>) -> Result<()> {
        let description = command.join(" ");
        let process = self
            .spawn(&command[0], &command[1..], SpawnOptions::default())
            .await?;
        let SpawnedProcess { mut output, exit } = process;
        let mut stderr = String::new();
        while let Some(chunk) = output.receiver.recv().await {
            if chunk.stream == StreamType::Stderr {
                stderr.push_str(&chunk.text());
            }
        }

        match exit.code().await? {
            0 => Ok(()),
            code => Err(SandboxError::Filesystem(format!(
                "'{}' exited with code {}: {}",
                description,
                code,
                stderr.trim()
            ))),
        }
    }
}

#[async_trait]
impl SandboxEnvironment for DockerEnvironment {
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<()> {
        let mut command = vec!["mkdir".to_string()];
        if recursive {
            command.push("-p".to_string());
        }
        command.push(path.to_string());
        self.run_checked(command).await
    }

    async fn write_file(&self, path: &str, contents: &str) -> Result<()> {
        let (dir, file_name) = match path.rsplit_once('/') {
            Some(("", name)) => ("/", name),
            Some((dir, name)) => (dir, name),
            None => (".", path),
        };
        if file_name.is_empty() {
            return Err(SandboxError::InvalidPath(path.to_string()));
        }

        let tar_data = single_file_archive(file_name, contents.as_bytes())
            .map_err(|e| SandboxError::Filesystem(e.to_string()))?;

        let options = UploadToContainerOptions {
            path: dir.to_string(),
            ..Default::default()
        };

        self.client
            .upload_to_container(&self.container_id, Some(options), tar_data.into())
            .await
            .map_err(|e| SandboxError::Filesystem(e.to_string()))
    }

    async fn spawn(
        &self,
        command: &str,
        args: &[String],
        options: SpawnOptions,
    ) -> Result<SpawnedProcess> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(command.to_string());
        argv.extend(args.iter().cloned());

        debug!("Exec in {}: {:?}", self.container_id, argv);
        let (exec_id, started) = self.start(argv, options).await?;

        let mut output = match started {
            StartExecResults::Attached { output, .. } => output,
            StartExecResults::Detached => {
                return Err(SandboxError::Process(
                    "Exec was detached unexpectedly".to_string(),
                ))
            }
        };

        let (ProcessIo { output: tx, exit }, process) = SpawnedProcess::channel();
        let client = self.client.clone();

        tokio::spawn(async move {
            while let Some(msg) = output.next().await {
                let chunk = match msg {
                    Ok(LogOutput::StdOut { message }) | Ok(LogOutput::Console { message }) => {
                        OutputChunk::stdout(message.to_vec())
                    }
                    Ok(LogOutput::StdErr { message }) => OutputChunk::stderr(message.to_vec()),
                    Ok(_) => continue,
                    Err(e) => {
                        error!("Error streaming exec output: {}", e);
                        break;
                    }
                };
                let _ = tx.send(chunk);
            }
            drop(tx);

            let code = match client.inspect_exec(&exec_id).await {
                Ok(inspect) => inspect.exit_code.unwrap_or(-1),
                Err(e) => {
                    error!("Failed to inspect exec {}: {}", exec_id, e);
                    -1
                }
            };
            let _ = exit.send(code);
        });

        Ok(process)
    }

    async fn teardown(&self) -> Result<()> {
        info!("Removing sandbox container: {}", self.container_id);

        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };

        self.client
            .remove_container(&self.container_id, Some(options))
            .await
            .map_err(|e| SandboxError::Container(e.to_string()))
    }
}

fn single_file_archive(name: &str, contents: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(chrono::Utc::now().timestamp().max(0) as u64);

    let mut archive = tar::Builder::new(Vec::new());
    archive.append_data(&mut header, name, contents)?;
    archive.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_single_file_archive_contains_file() {
        let data = single_file_archive("component.vue", b"<template></template>").unwrap();
        let mut archive = tar::Archive::new(data.as_slice());
        let mut entries = archive.entries().unwrap();

        let mut entry = entries.next().unwrap().unwrap();
        assert_eq!(
            entry.path().unwrap().to_string_lossy(),
            "component.vue".to_string()
        );
        let mut body = String::new();
        entry.read_to_string(&mut body).unwrap();
        assert_eq!(body, "<template></template>");
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn test_failed_start_removes_container() {
        let removed = std::sync::atomic::AtomicBool::new(false);
        let remove = async {
            removed.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        };

        let result: Result<()> = undo_on_error(
            async { Err(SandboxError::Container("port is already allocated".to_string())) },
            remove,
        )
        .await;

        assert!(matches!(result, Err(SandboxError::Container(m)) if m.contains("allocated")));
        assert!(removed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_started_container_is_kept() {
        let removed = std::sync::atomic::AtomicBool::new(false);
        let remove = async {
            removed.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        };

        assert_eq!(undo_on_error(async { Ok(7) }, remove).await.unwrap(), 7);
        assert!(!removed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cleanup_failure_keeps_start_error() {
        let result: Result<()> = undo_on_error(
            async { Err(SandboxError::Container("no such image".to_string())) },
            async { Err(SandboxError::Container("daemon gone".to_string())) },
        )
        .await;

        assert!(matches!(result, Err(SandboxError::Container(m)) if m == "no such image"));
    }

    #[tokio::test]
    async fn test_container_config_is_labelled_and_idle() {
        // Building the config needs a client handle but no running daemon
        let Ok(client) = Docker::connect_with_local_defaults() else {
            println!("Skipping test: Docker client could not be configured");
            return;
        };
        let provider = DockerProvider::with_client(client, "node:20-alpine");

        let config = provider.container_config("playground-test");
        assert_eq!(config.image, Some("node:20-alpine".to_string()));
        assert_eq!(
            config.cmd,
            Some(vec!["sleep".to_string(), "infinity".to_string()])
        );
        let labels = config.labels.unwrap();
        assert_eq!(
            labels.get("playground.sandbox.managed"),
            Some(&"true".to_string())
        );
    }
}
