// ABOUTME: Project skeleton provisioned into the sandbox for compiling components
// ABOUTME: Embeds the build driver script and renders the dependency manifest

use playground_config::PlaygroundConfig;
use playground_sandbox::{CommandLine, ProjectFile, ProjectLayout};
use serde_json::json;

pub const PROJECT_DIR: &str = "/project";
pub const SOURCE_FILE: &str = "component.vue";
pub const MANIFEST_FILE: &str = "package.json";
pub const DRIVER_FILE: &str = "build.js";

/// Node script that compiles `component.vue` and prints the wire payload
pub const BUILD_DRIVER: &str = include_str!("../assets/build.js");

/// `package.json` pinning the component compiler to `version`
pub fn dependency_manifest(version: &str) -> String {
    let manifest = json!({
        "name": "component-compiler",
        "type": "module",
        "dependencies": {
            "@vue/compiler-sfc": version
        }
    });
    serde_json::to_string_pretty(&manifest).unwrap_or_else(|_| manifest.to_string())
}

pub fn project_layout(config: &PlaygroundConfig) -> ProjectLayout {
    ProjectLayout {
        project_dir: PROJECT_DIR.to_string(),
        files: vec![
            ProjectFile::new(MANIFEST_FILE, dependency_manifest(&config.compiler_version)),
            ProjectFile::new(DRIVER_FILE, BUILD_DRIVER),
        ],
        source_file: SOURCE_FILE.to_string(),
        install: CommandLine::new(config.npm_bin.clone(), &["install"]),
    }
}
