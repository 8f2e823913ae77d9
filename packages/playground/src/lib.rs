// ABOUTME: Playground facade wiring sandbox, compiler, input store and mounter together
// ABOUTME: Compile and mount, then remount whenever an input value changes

pub mod error;

pub use error::{PlaygroundError, Result};
pub use playground_compiler as compiler;
pub use playground_config as config;
pub use playground_core as model;
pub use playground_render as render;
pub use playground_sandbox as sandbox;

use playground_compiler::{project_layout, CompilerOptions, ComponentCompiler};
use playground_config::{PlaygroundConfig, SandboxKind};
use playground_core::{CompiledArtifact, InputValueStore};
use playground_render::{HostServices, MountTarget, Mounter, ScriptEngine};
use playground_sandbox::{DockerProvider, LocalProvider, SandboxProvider, SandboxSession};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Sandbox backend selected by `config.sandbox`
pub fn select_provider(config: &PlaygroundConfig) -> Result<Arc<dyn SandboxProvider>> {
    let provider: Arc<dyn SandboxProvider> = match config.sandbox {
        SandboxKind::Local => Arc::new(LocalProvider::new(config.sandbox_root.clone())),
        SandboxKind::Docker => Arc::new(DockerProvider::new(config.docker_image.clone())?),
    };
    info!("Using {} sandbox provider", provider.name());
    Ok(provider)
}

/// One editing session: a sandbox, the latest artifact, its input values and
/// the mounted instance.
pub struct Playground<E: ScriptEngine> {
    compiler: ComponentCompiler,
    store: InputValueStore,
    mounter: Mounter<E>,
    target: Option<Arc<dyn MountTarget>>,
    host: Option<Arc<dyn HostServices>>,
}

impl<E: ScriptEngine> Playground<E> {
    pub fn new(config: &PlaygroundConfig, engine: E) -> Result<Self> {
        let provider = select_provider(config)?;
        Ok(Self::with_provider(config, provider, engine))
    }

    pub fn with_provider(
        config: &PlaygroundConfig,
        provider: Arc<dyn SandboxProvider>,
        engine: E,
    ) -> Self {
        let session = Arc::new(SandboxSession::new(provider, project_layout(config)));
        Self {
            compiler: ComponentCompiler::new(session, CompilerOptions::from_config(config)),
            store: InputValueStore::new(),
            mounter: Mounter::new(engine),
            target: None,
            host: None,
        }
    }

    pub fn attach_target(&mut self, target: Arc<dyn MountTarget>) {
        self.target = Some(target);
    }

    pub fn set_host_services(&mut self, host: Option<Arc<dyn HostServices>>) {
        self.host = host;
    }

    pub fn compiler(&self) -> &ComponentCompiler {
        &self.compiler
    }

    pub fn inputs(&self) -> &InputValueStore {
        &self.store
    }

    pub fn mounter(&self) -> &Mounter<E> {
        &self.mounter
    }

    /// Boot the sandbox ahead of the first compile
    pub async fn warm_up(&self) -> Result<()> {
        self.compiler.session().ensure_ready().await?;
        Ok(())
    }

    /// Compile `source`, install its input schema and mount it.
    /// A failed compile leaves the previous artifact, inputs and mount alone.
    pub async fn compile_and_mount(&mut self, source: &str) -> Result<Arc<CompiledArtifact>> {
        let artifact = self.compiler.compile(source).await?;
        self.store.update_schema(Some(&artifact));
        self.mount(&artifact)?;
        Ok(artifact)
    }

    pub async fn set_input(&mut self, name: &str, value: Value) -> Result<()> {
        self.store.update_value(name, value);
        self.remount().await
    }

    pub async fn reset_inputs(&mut self) -> Result<()> {
        self.store.reset_values();
        self.remount().await
    }

    pub fn unmount(&mut self) {
        self.mounter.unmount();
    }

    /// Forget the artifact and inputs and unmount
    pub async fn reset(&mut self) {
        self.mounter.unmount();
        self.compiler.reset().await;
        self.store.update_schema(None);
    }

    /// Unmount and release the sandbox
    pub async fn shutdown(&mut self) -> Result<()> {
        self.mounter.unmount();
        self.compiler.session().shutdown().await?;
        Ok(())
    }

    async fn remount(&mut self) -> Result<()> {
        match self.compiler.compiled().await {
            Some(artifact) => self.mount(&artifact),
            None => Ok(()),
        }
    }

    fn mount(&mut self, artifact: &CompiledArtifact) -> Result<()> {
        self.mounter.mount(
            Some(artifact),
            self.target.clone(),
            self.store.values(),
            self.host.clone(),
        )?;
        Ok(())
    }
}
