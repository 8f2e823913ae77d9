// ABOUTME: Render synthesizer: turns a compiled artifact into a live mounted instance
// ABOUTME: Keeps at most one instance alive and renders mount failures inline

use crate::definition::definition_expression;
use crate::engine::{
    EngineInstance, InstanceSpec, MergedSetup, ScriptEngine, HOST_SERVICES_GLOBAL,
    INPUT_VALUES_RESOURCE,
};
use crate::error::{RenderError, Result};
use crate::host::HostServices;
use crate::source::RenderSource;
use crate::target::{error_markup, MountTarget};
use playground_core::{CompiledArtifact, InputValues};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Mounts compiled artifacts through a [`ScriptEngine`].
///
/// Every mount first unmounts the previous instance, so at most one instance
/// is ever alive. Taking `&mut self` rules out overlapping mounts.
pub struct Mounter<E: ScriptEngine> {
    engine: E,
    current: Option<E::Instance>,
    mount_error: Option<String>,
}

impl<E: ScriptEngine> Mounter<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            current: None,
            mount_error: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn is_mounted(&self) -> bool {
        self.current.is_some()
    }

    /// Message of the last failed mount; cleared by the next successful one
    pub fn mount_error(&self) -> Option<&str> {
        self.mount_error.as_deref()
    }

    pub fn mount(
        &mut self,
        artifact: Option<&CompiledArtifact>,
        target: Option<Arc<dyn MountTarget>>,
        values: &InputValues,
        host: Option<Arc<dyn HostServices>>,
    ) -> Result<()> {
        self.unmount();

        if let Some(target) = &target {
            target.clear();
        }

        let (Some(artifact), Some(target)) = (artifact, target) else {
            debug!("No compiled component or mount target available");
            return Ok(());
        };

        info!("Mounting component...");
        match self.build_and_mount(artifact, target.clone(), values, host) {
            Ok(instance) => {
                self.current = Some(instance);
                self.mount_error = None;
                info!("Component mounted successfully");
                Ok(())
            }
            Err(e) => {
                error!("Mounting error: {}", e);
                let message = e.to_string();
                target.set_markup(&error_markup(&message));
                self.mount_error = Some(message);
                Err(e)
            }
        }
    }

    fn build_and_mount(
        &self,
        artifact: &CompiledArtifact,
        target: Arc<dyn MountTarget>,
        values: &InputValues,
        host: Option<Arc<dyn HostServices>>,
    ) -> Result<E::Instance> {
        let definition = self
            .engine
            .evaluate_definition(&definition_expression(&artifact.behavior_code))?;

        let source = RenderSource::for_artifact(artifact)?;
        let render = self.engine.compile_render(&source)?;

        let spec = InstanceSpec {
            definition,
            render,
            setup: MergedSetup::new(values.clone()),
            globals: host
                .map(|host| vec![(HOST_SERVICES_GLOBAL.to_string(), host)])
                .unwrap_or_default(),
            provides: vec![(INPUT_VALUES_RESOURCE.to_string(), values.clone())],
        };

        let mut instance = self.engine.instantiate(spec)?;
        if let Err(e) = instance.mount(target) {
            instance.unmount();
            return Err(match e {
                RenderError::Mount(_) => e,
                other => RenderError::Mount(other.to_string()),
            });
        }
        Ok(instance)
    }

    pub fn unmount(&mut self) {
        if let Some(mut instance) = self.current.take() {
            instance.unmount();
            debug!("Component unmounted");
        }
    }
}

impl<E: ScriptEngine> Drop for Mounter<E> {
    fn drop(&mut self) {
        self.unmount();
    }
}
