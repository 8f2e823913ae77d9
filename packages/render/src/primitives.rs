// ABOUTME: Rendering primitives exposed to synthesized render procedures
// ABOUTME: Maps the compiler's short aliases onto the engine's primitives table

/// Name the engine binds its primitives table to inside a render procedure
pub const PRIMITIVES_BINDING: &str = "__primitives";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    /// Alias used by compiled render code, e.g. `_openBlock`
    pub alias: &'static str,
    /// Entry in the engine's primitives table, e.g. `openBlock`
    pub name: &'static str,
}

const fn primitive(alias: &'static str, name: &'static str) -> Primitive {
    Primitive { alias, name }
}

pub const RENDER_PRIMITIVES: [Primitive; 11] = [
    primitive("_openBlock", "openBlock"),
    primitive("_createElementBlock", "createElementBlock"),
    primitive("_createElementVNode", "createElementVNode"),
    primitive("_toDisplayString", "toDisplayString"),
    primitive("_createTextVNode", "createTextVNode"),
    primitive("_Fragment", "Fragment"),
    primitive("_createVNode", "createVNode"),
    primitive("_withCtx", "withCtx"),
    primitive("_renderList", "renderList"),
    primitive("_createBlock", "createBlock"),
    primitive("_createCommentVNode", "createCommentVNode"),
];

/// One `const` binding per primitive, in table order
pub fn prelude() -> String {
    RENDER_PRIMITIVES
        .iter()
        .map(|p| format!("const {} = {}.{};\n", p.alias, PRIMITIVES_BINDING, p.name))
        .collect()
}
