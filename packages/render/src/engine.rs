// ABOUTME: Script engine boundary used to evaluate definitions and run component instances
// ABOUTME: Instance specs carry the merged setup, host globals and provided input values

use crate::error::Result;
use crate::host::HostServices;
use crate::source::RenderSource;
use crate::target::MountTarget;
use playground_core::InputValues;
use std::sync::Arc;

/// Global property under which host services are visible to components
pub const HOST_SERVICES_GLOBAL: &str = "$mvt";

/// Resource name under which the current input values are provided
pub const INPUT_VALUES_RESOURCE: &str = "props";

/// Embedded engine that runs compiled component code.
///
/// Implementations evaluate code with only the rendering primitives in scope;
/// no ambient host access is granted beyond what an [`InstanceSpec`] injects.
pub trait ScriptEngine {
    /// Evaluated component definition (state, methods, lifecycle)
    type Definition;
    /// Compiled render procedure
    type Render;
    type Instance: EngineInstance;

    fn evaluate_definition(&self, expression: &str) -> Result<Self::Definition>;

    fn compile_render(&self, source: &RenderSource) -> Result<Self::Render>;

    /// Build an unmounted instance. The engine runs the definition's own setup
    /// (if any) and passes its bindings through [`MergedSetup::merge`].
    fn instantiate(
        &self,
        spec: InstanceSpec<Self::Definition, Self::Render>,
    ) -> Result<Self::Instance>;
}

pub trait EngineInstance {
    fn mount(&mut self, target: Arc<dyn MountTarget>) -> Result<()>;

    /// Tear the instance down and release its target. Called at most once.
    fn unmount(&mut self);
}

/// Everything needed to build one instance
pub struct InstanceSpec<D, R> {
    pub definition: D,
    /// Replaces any render procedure the definition carries
    pub render: R,
    pub setup: MergedSetup,
    /// Global properties, e.g. host services as `$mvt`
    pub globals: Vec<(String, Arc<dyn HostServices>)>,
    /// Provided resources, e.g. input values as `props`
    pub provides: Vec<(String, InputValues)>,
}

/// Setup wrapper: input values override whatever the original setup returned
#[derive(Debug, Clone, PartialEq)]
pub struct MergedSetup {
    inputs: InputValues,
}

impl MergedSetup {
    pub fn new(inputs: InputValues) -> Self {
        Self { inputs }
    }

    /// Values passed as props to the original setup
    pub fn inputs(&self) -> &InputValues {
        &self.inputs
    }

    /// Bindings of the original setup, overlaid key by key with the inputs.
    /// An undefined input still shadows a binding of the same name.
    pub fn merge(&self, original: Option<InputValues>) -> InputValues {
        let mut bindings = original.unwrap_or_default();
        for (name, value) in self.inputs.iter() {
            match value {
                Some(value) => bindings.set(name, value.clone()),
                None => bindings.set_undefined(name),
            }
        }
        bindings
    }
}
