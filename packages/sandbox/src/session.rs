// ABOUTME: Sandbox lifecycle manager: boots and provisions one environment per session
// ABOUTME: Concurrent callers share a single in-flight boot future instead of booting twice

use crate::layout::ProjectLayout;
use crate::providers::{
    Result, SandboxEnvironment, SandboxError, SandboxProvider, SpawnOptions, SpawnedProcess,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStatus {
    Uninitialized,
    Booting,
    Ready,
    Failed,
}

type BootFuture = Shared<BoxFuture<'static, Result<Arc<dyn SandboxEnvironment>>>>;

struct SessionState {
    status: BootStatus,
    environment: Option<Arc<dyn SandboxEnvironment>>,
    /// Boot currently running, tagged with its generation
    in_flight: Option<(u64, BootFuture)>,
    generation: u64,
    last_error: Option<String>,
}

/// Owns the sandbox for the lifetime of the hosting process.
///
/// The first [`ensure_ready`](Self::ensure_ready) boots and provisions the
/// environment; callers arriving while that boot runs await the same shared
/// future, so at most one install sequence is ever in progress. A failed boot
/// leaves nothing behind and the next call starts over.
pub struct SandboxSession {
    provider: Arc<dyn SandboxProvider>,
    layout: Arc<ProjectLayout>,
    state: RwLock<SessionState>,
}

impl SandboxSession {
    pub fn new(provider: Arc<dyn SandboxProvider>, layout: ProjectLayout) -> Self {
        Self {
            provider,
            layout: Arc::new(layout),
            state: RwLock::new(SessionState {
                status: BootStatus::Uninitialized,
                environment: None,
                in_flight: None,
                generation: 0,
                last_error: None,
            }),
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub async fn status(&self) -> BootStatus {
        self.state.read().await.status
    }

    pub async fn is_booting(&self) -> bool {
        self.status().await == BootStatus::Booting
    }

    /// Message of the most recent failed boot, cleared when a new boot starts
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    /// Boot the sandbox if needed and return the ready environment
    pub async fn ensure_ready(&self) -> Result<Arc<dyn SandboxEnvironment>> {
        let (generation, boot) = {
            let mut state = self.state.write().await;
            if let Some(environment) = &state.environment {
                return Ok(environment.clone());
            }

            match &state.in_flight {
                Some((generation, boot)) => {
                    debug!("Sandbox boot already in progress, waiting for it");
                    (*generation, boot.clone())
                }
                None => {
                    state.generation += 1;
                    state.status = BootStatus::Booting;
                    state.last_error = None;

                    let generation = state.generation;
                    let boot = boot_sequence(self.provider.clone(), self.layout.clone())
                        .boxed()
                        .shared();
                    state.in_flight = Some((generation, boot.clone()));
                    (generation, boot)
                }
            }
        };

        let result = boot.await;

        let mut state = self.state.write().await;
        let current = state.in_flight.as_ref().map(|(g, _)| *g) == Some(generation);
        if !current {
            // Shut down while booting; `shutdown` owns the environment now
            return match result {
                Ok(_) => Err(SandboxError::NotAvailable(
                    "Sandbox was shut down while booting".to_string(),
                )),
                Err(e) => Err(e),
            };
        }

        state.in_flight = None;
        match &result {
            Ok(environment) => {
                state.environment = Some(environment.clone());
                state.status = BootStatus::Ready;
            }
            Err(e) => {
                state.status = BootStatus::Failed;
                state.last_error = Some(e.to_string());
            }
        }

        result
    }

    async fn environment(&self) -> Result<Arc<dyn SandboxEnvironment>> {
        self.state
            .read()
            .await
            .environment
            .clone()
            .ok_or_else(|| SandboxError::NotAvailable("Sandbox not initialized".to_string()))
    }

    /// Overwrite the component source file
    pub async fn write_source_file(&self, source: &str) -> Result<()> {
        let environment = self.environment().await?;
        environment
            .write_file(&self.layout.source_path(), source)
            .await
    }

    /// Run a process in the project directory
    pub async fn spawn_process(&self, command: &str, args: &[String]) -> Result<SpawnedProcess> {
        let environment = self.environment().await?;
        environment
            .spawn(
                command,
                args,
                SpawnOptions::in_dir(self.layout.project_dir.clone()),
            )
            .await
    }

    /// Release the environment. The next `ensure_ready` boots a new one.
    ///
    /// A boot still in flight is awaited and its environment torn down;
    /// callers waiting on that boot get [`SandboxError::NotAvailable`].
    pub async fn shutdown(&self) -> Result<()> {
        let (environment, in_flight) = {
            let mut state = self.state.write().await;
            state.status = BootStatus::Uninitialized;
            (state.environment.take(), state.in_flight.take())
        };

        let environment = match (environment, in_flight) {
            (Some(environment), _) => Some(environment),
            (None, Some((_, boot))) => {
                debug!("Waiting for in-flight boot before shutting down");
                boot.await.ok()
            }
            (None, None) => None,
        };

        match environment {
            Some(environment) => {
                info!("Shutting down {} sandbox", self.provider.name());
                environment.teardown().await
            }
            None => Ok(()),
        }
    }
}

async fn boot_sequence(
    provider: Arc<dyn SandboxProvider>,
    layout: Arc<ProjectLayout>,
) -> Result<Arc<dyn SandboxEnvironment>> {
    info!("Booting {} sandbox...", provider.name());
    let environment = provider
        .boot()
        .await
        .map_err(|e| setup_error("boot", e))?;

    if let Err(e) = provision(environment.as_ref(), &layout).await {
        error!("Sandbox setup failed: {}", e);
        if let Err(cleanup) = environment.teardown().await {
            warn!("Failed to tear down half-provisioned sandbox: {}", cleanup);
        }
        return Err(e);
    }

    info!("Sandbox ready");
    Ok(environment)
}

async fn provision(environment: &dyn SandboxEnvironment, layout: &ProjectLayout) -> Result<()> {
    environment
        .mkdir(&layout.project_dir, true)
        .await
        .map_err(|e| setup_error("create project directory", e))?;

    for file in &layout.files {
        environment
            .write_file(&layout.path_of(&file.name), &file.contents)
            .await
            .map_err(|e| setup_error(&format!("write {}", file.name), e))?;
    }

    info!("Installing dependencies ({})...", layout.install);
    let SpawnedProcess { mut output, exit } = environment
        .spawn(
            &layout.install.program,
            &layout.install.args,
            SpawnOptions::in_dir(layout.project_dir.clone()),
        )
        .await
        .map_err(|e| setup_error("spawn install", e))?;

    tokio::spawn(async move {
        while let Some(chunk) = output.receiver.recv().await {
            debug!("[install] {}", chunk.text().trim_end());
        }
    });

    let exit_code = exit
        .code()
        .await
        .map_err(|e| setup_error("install", e))?;
    if exit_code != 0 {
        return Err(SandboxError::Setup(format!(
            "Failed to install dependencies (exit code {})",
            exit_code
        )));
    }

    info!("Dependencies installed successfully");
    Ok(())
}

fn setup_error(step: &str, error: SandboxError) -> SandboxError {
    match error {
        SandboxError::Setup(_) => error,
        other => SandboxError::Setup(format!("{}: {}", step, other)),
    }
}
