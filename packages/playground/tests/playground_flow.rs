// ABOUTME: End-to-end playground flow against an in-memory sandbox, a JSON engine and the JS engine
// ABOUTME: Compile, derive inputs, mount, edit inputs and shut down

use async_trait::async_trait;
use playground::compiler::CompilationError;
use playground::config::{PlaygroundConfig, SandboxKind};
use playground::model::{InputValues, SAMPLE_COMPONENT};
use playground::render::{
    BufferTarget, EngineInstance, InstanceSpec, JsEngine, MemoryHostServices, MountTarget,
    RenderError, RenderSource, ScriptEngine,
};
use playground::sandbox::{
    OutputChunk, ProcessIo, SandboxEnvironment, SandboxError, SandboxProvider, SpawnOptions,
    SpawnedProcess,
};
use playground::{Playground, PlaygroundError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const PAYLOAD: &str = r#"{"version":2,"script":"export default { name: 'MetricCard' }","template":"export function render(_ctx, _cache) {\n  return null\n}","hasTemplate":true,"propsSchema":null,"props":{"title":{"$ctor":"String"},"max":{"type":{"$ctor":"Number"},"default":5,"mvt":{"max":10}}}}"#;

/// Sandbox whose build driver prints `payload` unless the source contains "BROKEN"
struct InMemoryEnvironment {
    payload: String,
    source: Mutex<String>,
    torn_down: AtomicUsize,
}

impl InMemoryEnvironment {
    fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            source: Mutex::new(String::new()),
            torn_down: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SandboxEnvironment for InMemoryEnvironment {
    async fn mkdir(&self, _path: &str, _recursive: bool) -> Result<(), SandboxError> {
        Ok(())
    }

    async fn write_file(&self, path: &str, contents: &str) -> Result<(), SandboxError> {
        if path.ends_with("component.vue") {
            *self.source.lock().unwrap() = contents.to_string();
        }
        Ok(())
    }

    async fn spawn(
        &self,
        command: &str,
        _args: &[String],
        _options: SpawnOptions,
    ) -> Result<SpawnedProcess, SandboxError> {
        let (ProcessIo { output, exit }, process) = SpawnedProcess::channel();
        let broken = self.source.lock().unwrap().contains("BROKEN");

        if command == "node" {
            if broken {
                let _ = output.send(OutputChunk::stderr("{\"error\":\"Invalid end tag.\"}"));
                let _ = exit.send(1);
            } else {
                let _ = output.send(OutputChunk::stdout(self.payload.clone()));
                let _ = exit.send(0);
            }
        } else {
            let _ = exit.send(0);
        }
        Ok(process)
    }

    async fn teardown(&self) -> Result<(), SandboxError> {
        self.torn_down.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct InMemoryProvider {
    environment: Arc<InMemoryEnvironment>,
    boots: AtomicUsize,
}

#[async_trait]
impl SandboxProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn boot(&self) -> Result<Arc<dyn SandboxEnvironment>, SandboxError> {
        self.boots.fetch_add(1, Ordering::SeqCst);
        Ok(self.environment.clone())
    }
}

/// Renders the merged bindings as JSON into the target
struct JsonEngine;

struct JsonInstance {
    bindings: InputValues,
    target: Option<Arc<dyn MountTarget>>,
}

impl ScriptEngine for JsonEngine {
    type Definition = ();
    type Render = ();
    type Instance = JsonInstance;

    fn evaluate_definition(&self, _expression: &str) -> Result<(), RenderError> {
        Ok(())
    }

    fn compile_render(&self, _source: &RenderSource) -> Result<(), RenderError> {
        Ok(())
    }

    fn instantiate(&self, spec: InstanceSpec<(), ()>) -> Result<JsonInstance, RenderError> {
        Ok(JsonInstance {
            bindings: spec.setup.merge(None),
            target: None,
        })
    }
}

impl EngineInstance for JsonInstance {
    fn mount(&mut self, target: Arc<dyn MountTarget>) -> Result<(), RenderError> {
        target.set_markup(&serde_json::to_string(&self.bindings).unwrap());
        self.target = Some(target);
        Ok(())
    }

    fn unmount(&mut self) {
        if let Some(target) = self.target.take() {
            target.clear();
        }
    }
}

fn provider(payload: impl Into<String>) -> Arc<InMemoryProvider> {
    Arc::new(InMemoryProvider {
        environment: Arc::new(InMemoryEnvironment::new(payload)),
        boots: AtomicUsize::new(0),
    })
}

fn setup() -> (
    Playground<JsonEngine>,
    Arc<InMemoryProvider>,
    Arc<BufferTarget>,
) {
    let provider = provider(PAYLOAD);
    let mut playground =
        Playground::with_provider(&PlaygroundConfig::default(), provider.clone(), JsonEngine);
    let target = Arc::new(BufferTarget::new());
    playground.attach_target(target.clone());
    (playground, provider, target)
}

#[tokio::test]
async fn test_compile_mount_and_edit_inputs() {
    let (mut playground, provider, target) = setup();

    let artifact = playground.compile_and_mount(SAMPLE_COMPONENT).await.unwrap();
    assert!(artifact.has_inputs());
    assert_eq!(
        playground.inputs().values().keys().collect::<Vec<_>>(),
        vec!["title", "max"]
    );
    assert_eq!(target.markup(), r#"{"max":5}"#);

    playground.set_input("title", json!("Revenue")).await.unwrap();
    assert_eq!(target.markup(), r#"{"title":"Revenue","max":5}"#);

    playground.set_input("max", json!(9)).await.unwrap();
    playground.reset_inputs().await.unwrap();
    assert_eq!(target.markup(), r#"{"max":5}"#);

    // Second compile reuses the booted sandbox
    playground.compile_and_mount(SAMPLE_COMPONENT).await.unwrap();
    assert_eq!(provider.boots.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_compile_keeps_previous_mount() {
    let (mut playground, _, target) = setup();
    playground.compile_and_mount(SAMPLE_COMPONENT).await.unwrap();
    playground.set_input("title", json!("Kept")).await.unwrap();

    let err = playground
        .compile_and_mount("<template>BROKEN</div>")
        .await
        .unwrap_err();
    match err {
        PlaygroundError::Compilation(CompilationError::BuildFailed { reason, .. }) => {
            assert_eq!(reason.as_deref(), Some("Invalid end tag."));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(playground.mounter().is_mounted());
    assert_eq!(target.markup(), r#"{"title":"Kept","max":5}"#);
    assert!(playground.compiler().compilation_error().await.is_some());
}

#[tokio::test]
async fn test_set_input_before_compile_does_not_mount() {
    let (mut playground, _, target) = setup();
    playground.set_input("title", json!("x")).await.unwrap();
    assert_eq!(target.markup(), "");
    assert!(!playground.mounter().is_mounted());
}

#[tokio::test]
async fn test_reset_and_shutdown() {
    let (mut playground, provider, target) = setup();
    playground.compile_and_mount(SAMPLE_COMPONENT).await.unwrap();

    playground.reset().await;
    assert!(!playground.mounter().is_mounted());
    assert!(playground.inputs().schema().is_none());
    assert_eq!(target.markup(), "");

    playground.shutdown().await.unwrap();
    assert_eq!(provider.environment.torn_down.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_local_provider_selected_from_config() {
    let temp = tempfile::tempdir().unwrap();
    let config = PlaygroundConfig {
        sandbox: SandboxKind::Local,
        sandbox_root: temp.path().to_path_buf(),
        ..Default::default()
    };

    let provider = playground::select_provider(&config).unwrap();
    assert_eq!(provider.name(), "local");
    assert!(Playground::new(&config, JsonEngine).is_ok());
}

/// Payload for a component declaring `title: String` and
/// `max: { type: Number, default: 5, mvt: { max: 10 } }`, rendered as a card
fn metric_card_payload() -> String {
    json!({
        "version": 2,
        "script": "export default {\n  props: {\n    title: String,\n    max: { type: Number, default: 5, mvt: { max: 10 } }\n  }\n}",
        "template": "",
        "hasTemplate": true,
        "propsSchema": null,
        "props": {
            "title": { "$ctor": "String" },
            "max": { "type": { "$ctor": "Number" }, "default": 5, "mvt": { "max": 10 } }
        },
        "render": {
            "params": ["_ctx", "_cache"],
            "hoisted": "const _hoisted_1 = { class: \"metric-card\" }",
            "body": "\n  return (_openBlock(), _createElementBlock(\"div\", _hoisted_1, [\n    _createElementVNode(\"h3\", null, _toDisplayString(_ctx.title), 1 /* TEXT */),\n    _createElementVNode(\"p\", null, \"Max: \" + _toDisplayString(_ctx.max), 1 /* TEXT */)\n  ]))\n"
        }
    })
    .to_string()
}

#[tokio::test]
async fn test_declared_inputs_render_through_js_engine() {
    let mut playground = Playground::with_provider(
        &PlaygroundConfig::default(),
        provider(metric_card_payload()),
        JsEngine::new(),
    );
    let target = Arc::new(BufferTarget::new());
    playground.attach_target(target.clone());
    playground.set_host_services(Some(Arc::new(MemoryHostServices::new())));

    let artifact = playground.compile_and_mount(SAMPLE_COMPONENT).await.unwrap();

    let schema = artifact.schema.as_ref().unwrap();
    assert_eq!(schema.properties.len(), 2);
    let max = schema.properties.get("max").unwrap();
    assert_eq!(max.maximum, Some(json!(10)));
    assert_eq!(max.default, Some(json!(5)));

    let values = playground.inputs().values();
    assert_eq!(values.keys().collect::<Vec<_>>(), vec!["title", "max"]);
    assert!(values.contains_key("title"));
    assert_eq!(values.get("title"), None);
    assert_eq!(values.get("max"), Some(&json!(5)));

    assert!(playground.mounter().is_mounted());
    assert_eq!(playground.mounter().mount_error(), None);
    assert_eq!(
        target.markup(),
        "<div class=\"metric-card\"><h3></h3><p>Max: 5</p></div>"
    );

    playground.set_input("title", json!("Revenue")).await.unwrap();
    assert_eq!(
        target.markup(),
        "<div class=\"metric-card\"><h3>Revenue</h3><p>Max: 5</p></div>"
    );

    playground.shutdown().await.unwrap();
    assert!(!playground.mounter().is_mounted());
    assert_eq!(target.markup(), "");
}
