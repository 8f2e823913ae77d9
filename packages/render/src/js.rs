// ABOUTME: Embedded JavaScript engine that runs compiled components in isolated contexts
// ABOUTME: Each instance gets its own boa context holding only the primitives and injected services

use crate::engine::{EngineInstance, InstanceSpec, ScriptEngine};
use crate::error::{RenderError, Result};
use crate::host::HostServices;
use crate::source::RenderSource;
use crate::target::MountTarget;
use boa_engine::job::SimpleJobQueue;
use boa_engine::{Context, JsResult, Source};
use futures::executor::block_on;
use playground_core::InputValues;
use serde::Deserialize;
use serde_json::{json, Value};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Instance runtime: primitives table, markup renderer, lifecycle and host bridge
const RUNTIME: &str = include_str!("../assets/runtime.js");

/// Execution limits applied to every context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    pub loop_iterations: u64,
    pub recursion: usize,
    /// Rounds of host-service requests served after each lifecycle step
    pub host_rounds: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            loop_iterations: 1_000_000,
            recursion: 512,
            host_rounds: 32,
        }
    }
}

/// [`ScriptEngine`] backed by boa.
///
/// Definitions and render procedures are checked in throwaway contexts. Each
/// instance then owns a fresh context with no I/O globals: compiled code sees
/// the rendering primitives, the globals and resources named in its
/// [`InstanceSpec`], and nothing else.
#[derive(Debug, Clone, Default)]
pub struct JsEngine {
    limits: EngineLimits,
}

#[derive(Debug, Clone)]
pub struct JsDefinition {
    expression: String,
}

#[derive(Debug, Clone)]
pub struct JsRender {
    factory: String,
}

impl JsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: EngineLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> EngineLimits {
        self.limits
    }

    fn context(&self) -> Result<Context> {
        let mut context = Context::builder()
            .job_queue(Rc::new(SimpleJobQueue::new()))
            .build()
            .map_err(|e| RenderError::Engine(e.to_string()))?;
        let limits = context.runtime_limits_mut();
        limits.set_loop_iteration_limit(self.limits.loop_iterations);
        limits.set_recursion_limit(self.limits.recursion);
        Ok(context)
    }
}

impl ScriptEngine for JsEngine {
    type Definition = JsDefinition;
    type Render = JsRender;
    type Instance = JsInstance;

    fn evaluate_definition(&self, expression: &str) -> Result<JsDefinition> {
        let mut context = self.context()?;
        let check = format!(
            "(function () {{ const definition = (\n{}\n); return definition !== null && typeof definition === 'object'; }})()",
            expression
        );
        let is_object =
            eval_to_string(&mut context, &check).map_err(|e| RenderError::Definition(e.to_string()))?;
        if is_object != "true" {
            return Err(RenderError::Definition(
                "Component definition must be an object".to_string(),
            ));
        }

        Ok(JsDefinition {
            expression: expression.to_string(),
        })
    }

    fn compile_render(&self, source: &RenderSource) -> Result<JsRender> {
        let factory = format!(
            "(function ({}) {{\nreturn function ({}) {{\n{}\n}};\n}})",
            source.primitives_binding,
            source.params.join(", "),
            source.code
        );

        let mut context = self.context()?;
        context
            .eval(Source::from_bytes(&factory))
            .map_err(|e| RenderError::Engine(e.to_string()))?;

        Ok(JsRender { factory })
    }

    fn instantiate(&self, spec: InstanceSpec<JsDefinition, JsRender>) -> Result<JsInstance> {
        let mut instance = JsInstance {
            context: self.context()?,
            hosts: Vec::new(),
            host_rounds: self.limits.host_rounds,
            target: None,
        };
        instance.run(RUNTIME)?;

        for (name, host) in spec.globals {
            let user = host.current_user();
            instance.run(&format!(
                "__runtime.defineGlobal({}, {})",
                js_string(&name),
                json!({ "id": user.id, "name": user.name })
            ))?;
            instance.hosts.push((name, host));
        }

        for (name, values) in &spec.provides {
            instance.run(&format!(
                "__runtime.provide({}, {})",
                js_string(name),
                object_literal(values)
            ))?;
        }

        instance.run(&format!(
            "__runtime.load(\n{}\n, {})",
            spec.definition.expression, spec.render.factory
        ))?;

        let original = instance.run(&format!(
            "__runtime.runSetup({})",
            object_literal(spec.setup.inputs())
        ))?;
        instance.serve_host_requests()?;

        let bindings = spec.setup.merge(parse_bindings(&original)?);
        instance.run(&format!("__runtime.create({})", object_literal(&bindings)))?;
        instance.serve_host_requests()?;

        debug!("Created instance with {} bindings", bindings.len());
        Ok(instance)
    }
}

/// A component instance living in its own context
pub struct JsInstance {
    context: Context,
    hosts: Vec<(String, Arc<dyn HostServices>)>,
    host_rounds: usize,
    target: Option<Arc<dyn MountTarget>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum HostOp {
    Get,
    Set,
}

#[derive(Debug, Deserialize)]
struct HostRequest {
    id: u64,
    host: String,
    op: HostOp,
    key: String,
    value: Option<String>,
}

impl JsInstance {
    fn run(&mut self, code: &str) -> Result<String> {
        eval_to_string(&mut self.context, code).map_err(|e| RenderError::Engine(e.to_string()))
    }

    /// Serve queued host-service calls and run the jobs they unblock
    fn serve_host_requests(&mut self) -> Result<()> {
        for _ in 0..self.host_rounds {
            let _ = self.context.run_jobs();

            let raw = self.run("__runtime.takeHostRequests()")?;
            let requests: Vec<HostRequest> = serde_json::from_str(&raw)
                .map_err(|e| RenderError::Engine(format!("Malformed host request: {}", e)))?;
            if requests.is_empty() {
                return Ok(());
            }

            for request in requests {
                let (ok, value) = self.serve(&request);
                self.run(&format!(
                    "__runtime.settleHostRequest({}, {}, {})",
                    request.id, ok, value
                ))?;
            }
        }

        warn!(
            "Host request limit of {} rounds reached; later requests stay pending",
            self.host_rounds
        );
        Ok(())
    }

    /// Outcome of one request as (fulfilled, JS literal)
    fn serve(&self, request: &HostRequest) -> (bool, String) {
        let Some((_, host)) = self.hosts.iter().find(|(name, _)| *name == request.host) else {
            return (
                false,
                js_string(&format!("Unknown host services '{}'", request.host)),
            );
        };

        match request.op {
            HostOp::Get => {
                let value = block_on(host.get_item(&request.key));
                (true, value.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string()))
            }
            HostOp::Set => {
                let value = match request.value.as_deref().map(serde_json::from_str::<Value>) {
                    Some(Ok(value)) => value,
                    Some(Err(e)) => return (false, js_string(&e.to_string())),
                    None => Value::Null,
                };
                match block_on(host.set_item(&request.key, &value)) {
                    Ok(()) => (true, "undefined".to_string()),
                    Err(e) => (false, js_string(&e.to_string())),
                }
            }
        }
    }
}

impl EngineInstance for JsInstance {
    fn mount(&mut self, target: Arc<dyn MountTarget>) -> Result<()> {
        let markup = self.run("__runtime.mount()")?;
        target.set_markup(&markup);
        self.target = Some(target);
        self.serve_host_requests()
    }

    fn unmount(&mut self) {
        if let Err(e) = self.run("__runtime.unmount()") {
            warn!("Unmount hook failed: {}", e);
        }
        if let Err(e) = self.serve_host_requests() {
            warn!("Host request after unmount failed: {}", e);
        }
        if let Some(target) = self.target.take() {
            target.clear();
        }
    }
}

fn eval_to_string(context: &mut Context, code: &str) -> JsResult<String> {
    let value = context.eval(Source::from_bytes(code))?;
    Ok(value.to_string(context)?.to_std_string_escaped())
}

fn js_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Object literal with one property per entry; undefined entries stay present
fn object_literal(values: &InputValues) -> String {
    let properties: Vec<String> = values
        .iter()
        .map(|(name, value)| {
            let value = value
                .map(Value::to_string)
                .unwrap_or_else(|| "undefined".to_string());
            format!("{}: {}", js_string(name), value)
        })
        .collect();
    format!("{{{}}}", properties.join(", "))
}

/// Data bindings returned by the component's own setup, if any
fn parse_bindings(raw: &str) -> Result<Option<InputValues>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| RenderError::Engine(format!("Unreadable setup bindings: {}", e)))?;

    Ok(match value {
        Value::Object(map) => {
            let mut bindings = InputValues::new();
            for (name, value) in map {
                bindings.set(name, value);
            }
            Some(bindings)
        }
        _ => None,
    })
}
