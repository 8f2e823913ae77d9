// ABOUTME: Mounting real compiled components through the embedded JavaScript engine
// ABOUTME: Rendered markup, setup merging, injected services, lifecycle hooks and isolation

use playground_core::{CompiledArtifact, InputValues, RenderParts};
use playground_render::{
    BufferTarget, HostServices, JsEngine, MemoryHostServices, MountTarget, Mounter, RenderError,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

const COUNTER_SCRIPT: &str = r#"export default {
  props: {
    title: { type: String, default: 'My Counter' },
    startValue: { type: Number, default: 0 }
  },
  data() {
    return {
      count: this.startValue
    }
  },
  methods: {
    async increment() {
      this.count++
      await $mvt.store.setItem('count', this.count)
    }
  }
}"#;

const COUNTER_TEMPLATE: &str = r#"import { toDisplayString as _toDisplayString, createElementVNode as _createElementVNode, openBlock as _openBlock, createElementBlock as _createElementBlock } from "vue"

const _hoisted_1 = { class: "metric-card" }

export function render(_ctx, _cache) {
  return (_openBlock(), _createElementBlock("div", _hoisted_1, [
    _createElementVNode("h3", null, _toDisplayString(_ctx.title), 1 /* TEXT */),
    _createElementVNode("p", null, "Count: " + _toDisplayString(_ctx.count), 1 /* TEXT */),
    _createElementVNode("button", {
      onClick: _cache[0] || (_cache[0] = (...args) => (_ctx.increment && _ctx.increment(...args)))
    }, "+1")
  ]))
}"#;

/// Artifact whose render procedure is `body`, split the way the build driver does
fn component(script: &str, body: &str) -> CompiledArtifact {
    CompiledArtifact::new(script, "", true, None).with_render(RenderParts {
        params: vec!["_ctx".to_string(), "_cache".to_string()],
        hoisted: String::new(),
        body: format!("\n  return {}\n", body),
    })
}

fn values(entries: &[(&str, serde_json::Value)]) -> InputValues {
    let mut values = InputValues::new();
    for (name, value) in entries {
        values.set(*name, value.clone());
    }
    values
}

fn mount(
    mounter: &mut Mounter<JsEngine>,
    artifact: &CompiledArtifact,
    inputs: &InputValues,
    host: Option<Arc<dyn HostServices>>,
) -> (Arc<BufferTarget>, Result<(), RenderError>) {
    let target = Arc::new(BufferTarget::new());
    let result = mounter.mount(Some(artifact), Some(target.clone()), inputs, host);
    (target, result)
}

#[test]
fn test_renders_counter_from_template_text() {
    let mut mounter = Mounter::new(JsEngine::new());
    let artifact = CompiledArtifact::new(COUNTER_SCRIPT, COUNTER_TEMPLATE, true, None);

    let (target, result) = mount(
        &mut mounter,
        &artifact,
        &values(&[("title", json!("My Counter")), ("startValue", json!(3))]),
        None,
    );

    result.unwrap();
    assert!(mounter.is_mounted());
    assert_eq!(
        target.markup(),
        "<div class=\"metric-card\"><h3>My Counter</h3><p>Count: 3</p><button>+1</button></div>"
    );
}

#[test]
fn test_setup_runs_with_inputs_and_inputs_win() {
    let mut mounter = Mounter::new(JsEngine::new());
    let artifact = component(
        r#"export default {
  setup(props) {
    return {
      title: 'from setup',
      greeting: 'hello ' + props.title,
      shout: () => 'HEY'
    }
  }
}"#,
        r#"(_openBlock(), _createElementBlock("p", null, _toDisplayString(_ctx.title) + "|" + _toDisplayString(_ctx.greeting) + "|" + _toDisplayString(_ctx.shout()), 1 /* TEXT */))"#,
    );

    let (target, result) = mount(
        &mut mounter,
        &artifact,
        &values(&[("title", json!("from inputs"))]),
        None,
    );

    result.unwrap();
    assert_eq!(target.markup(), "<p>from inputs|hello from inputs|HEY</p>");
}

#[test]
fn test_undefined_input_shadows_setup_binding() {
    let mut mounter = Mounter::new(JsEngine::new());
    let artifact = component(
        "export default { setup() { return { title: 'from setup' } } }",
        r#"_createElementBlock("p", null, _toDisplayString(_ctx.title))"#,
    );
    let mut inputs = InputValues::new();
    inputs.set_undefined("title");

    let (target, result) = mount(&mut mounter, &artifact, &inputs, None);

    result.unwrap();
    assert_eq!(target.markup(), "<p></p>");
}

#[test]
fn test_input_values_are_provided_as_props() {
    let mut mounter = Mounter::new(JsEngine::new());
    let artifact = component(
        "export default { inject: ['props'] }",
        r#"_createElementBlock("span", null, _toDisplayString(_ctx.props.max))"#,
    );

    let (target, result) = mount(&mut mounter, &artifact, &values(&[("max", json!(5))]), None);

    result.unwrap();
    assert_eq!(target.markup(), "<span>5</span>");
}

#[test]
fn test_lists_fragments_and_attributes() {
    let mut mounter = Mounter::new(JsEngine::new());
    let artifact = component(
        r#"export default {
  computed: {
    total() { return this.items.length }
  }
}"#,
        r#"(_openBlock(), _createElementBlock(_Fragment, null, [
    _createElementVNode("ul", { class: { active: _ctx.active, hidden: false }, "data-note": _ctx.note }, [
      (_openBlock(true), _createElementBlock(_Fragment, null, _renderList(_ctx.items, (item) => {
        return (_openBlock(), _createElementBlock("li", { key: item }, _toDisplayString(item), 1 /* TEXT */))
      }), 128 /* KEYED_FRAGMENT */))
    ], 2 /* CLASS */),
    _createCommentVNode("v-if", true),
    _createTextVNode(" total " + _toDisplayString(_ctx.total)),
    _createElementVNode("input", { disabled: true, value: "x" })
  ], 64 /* STABLE_FRAGMENT */))"#,
    );

    let (target, result) = mount(
        &mut mounter,
        &artifact,
        &values(&[
            ("items", json!(["a", "<b>"])),
            ("active", json!(true)),
            ("note", json!("say \"hi\"")),
        ]),
        None,
    );

    result.unwrap();
    assert_eq!(
        target.markup(),
        "<ul class=\"active\" data-note=\"say &quot;hi&quot;\"><li>a</li><li>&lt;b&gt;</li></ul><!--v-if--> total 2<input disabled value=\"x\">"
    );
}

#[tokio::test]
async fn test_host_services_are_reachable_as_mvt() {
    let host = Arc::new(MemoryHostServices::new());
    host.set_item("visits", &json!(2)).await.unwrap();

    let mut mounter = Mounter::new(JsEngine::new());
    let artifact = component(
        r#"export default {
  mounted() {
    $mvt.store.setItem('mounted', { ok: true })
    $mvt.store.getItem('visits').then((n) => $mvt.store.setItem('visits', n + 1))
  }
}"#,
        r#"_createElementBlock("p", null, _toDisplayString(_ctx.$mvt.currentUser().name))"#,
    );

    let (target, result) = mount(&mut mounter, &artifact, &InputValues::new(), Some(host.clone()));

    result.unwrap();
    assert_eq!(target.markup(), "<p>Test User</p>");
    assert_eq!(host.get_item("mounted").await, Some(json!({ "ok": true })));
    assert_eq!(host.get_item("visits").await, Some(json!(3)));
}

#[tokio::test]
async fn test_unmount_runs_hooks_and_clears_target() {
    let host = Arc::new(MemoryHostServices::new());
    let mut mounter = Mounter::new(JsEngine::new());
    let artifact = component(
        "export default { unmounted() { $mvt.store.setItem('unmounted', true) } }",
        r#"_createElementBlock("p", null, "live")"#,
    );

    let (target, result) = mount(&mut mounter, &artifact, &InputValues::new(), Some(host.clone()));
    result.unwrap();
    assert_eq!(target.markup(), "<p>live</p>");

    mounter.unmount();
    assert!(!mounter.is_mounted());
    assert_eq!(target.markup(), "");
    assert_eq!(host.get_item("unmounted").await, Some(json!(true)));
}

#[test]
fn test_render_failure_is_shown_inline() {
    let mut mounter = Mounter::new(JsEngine::new());
    let artifact = component(
        "export default {}",
        r#"_createElementBlock("p", null, _toDisplayString(_ctx.missing.field))"#,
    );

    let (target, result) = mount(&mut mounter, &artifact, &InputValues::new(), None);

    let err = result.unwrap_err();
    assert!(matches!(err, RenderError::Mount(_)));
    assert!(target.markup().contains("<strong>Mount Error:</strong>"));
    assert!(!mounter.is_mounted());
    assert!(mounter.mount_error().is_some());
}

#[test]
fn test_definition_syntax_error_is_reported() {
    let mut mounter = Mounter::new(JsEngine::new());
    let artifact = component("export default { data() { return { }", "null");

    let (target, result) = mount(&mut mounter, &artifact, &InputValues::new(), None);

    assert!(matches!(result, Err(RenderError::Definition(_))));
    assert!(target.markup().contains("Invalid component definition"));
}

#[test]
fn test_compiled_code_has_no_ambient_host_access() {
    let mut mounter = Mounter::new(JsEngine::new());
    let global_reader = component(
        "export default {}",
        r#"_createElementBlock("p", null, [typeof require, typeof process, typeof fetch, typeof console, typeof $mvt].join(","))"#,
    );

    let (target, result) = mount(&mut mounter, &global_reader, &InputValues::new(), None);

    result.unwrap();
    assert_eq!(
        target.markup(),
        "<p>undefined,undefined,undefined,undefined,undefined</p>"
    );
}

#[test]
fn test_instances_do_not_share_globals() {
    let mut mounter = Mounter::new(JsEngine::new());
    let leaky = component(
        "export default { mounted() { globalThis.leaked = 1 } }",
        r#"_createElementBlock("p", null, "first")"#,
    );
    let reader = component(
        "export default {}",
        r#"_createElementBlock("p", null, typeof globalThis.leaked)"#,
    );

    let (_, first) = mount(&mut mounter, &leaky, &InputValues::new(), None);
    first.unwrap();
    let (target, second) = mount(&mut mounter, &reader, &InputValues::new(), None);
    second.unwrap();

    assert_eq!(target.markup(), "<p>undefined</p>");
}

#[test]
fn test_remount_reflects_new_inputs() {
    let mut mounter = Mounter::new(JsEngine::new());
    let artifact = CompiledArtifact::new(COUNTER_SCRIPT, COUNTER_TEMPLATE, true, None);
    let target: Arc<dyn MountTarget> = Arc::new(BufferTarget::new());

    mounter
        .mount(
            Some(&artifact),
            Some(target.clone()),
            &values(&[("title", json!("One"))]),
            None,
        )
        .unwrap();
    mounter
        .mount(
            Some(&artifact),
            Some(target.clone()),
            &values(&[("title", json!("Two"))]),
            None,
        )
        .unwrap();

    assert!(target.markup().contains("<h3>Two</h3>"));
    assert!(!target.markup().contains("One"));
}
