// ABOUTME: Render synthesis and mounting for compiled components
// ABOUTME: Script engine seam, render source synthesis, mount targets and host services

pub mod definition;
pub mod engine;
pub mod error;
pub mod extract;
pub mod host;
pub mod js;
pub mod primitives;
pub mod source;
pub mod synthesizer;
pub mod target;

pub use definition::definition_expression;
pub use engine::{
    EngineInstance, InstanceSpec, MergedSetup, ScriptEngine, HOST_SERVICES_GLOBAL,
    INPUT_VALUES_RESOURCE,
};
pub use error::{RenderError, Result};
pub use extract::extract_render;
pub use host::{HostServices, HostUser, MemoryHostServices};
pub use js::{EngineLimits, JsDefinition, JsEngine, JsInstance, JsRender};
pub use primitives::{Primitive, PRIMITIVES_BINDING, RENDER_PRIMITIVES};
pub use source::{RenderSource, RENDER_PARAMS};
pub use synthesizer::Mounter;
pub use target::{error_markup, BufferTarget, MountTarget};
