// ABOUTME: Resolved playground configuration loaded from the environment
// ABOUTME: Selects the sandbox backend, toolchain binaries and compile timeout

use crate::constants::*;
use crate::env::{env_string, env_string_or_default, parse_env_or_default_with_validation};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid sandbox provider: {0} (expected 'local' or 'docker')")]
    InvalidSandboxProvider(String),
}

/// Which sandbox backend hosts the compiler toolchain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxKind {
    /// Private working directory per boot, processes run on the host
    Local,
    /// One container per boot
    Docker,
}

impl FromStr for SandboxKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(SandboxKind::Local),
            "docker" => Ok(SandboxKind::Docker),
            _ => Err(ConfigError::InvalidSandboxProvider(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaygroundConfig {
    pub sandbox: SandboxKind,
    /// Parent directory for local sandbox environments
    pub sandbox_root: PathBuf,
    pub docker_image: String,
    pub node_bin: String,
    pub npm_bin: String,
    /// Version requirement written into the sandbox dependency manifest
    pub compiler_version: String,
    pub compile_timeout: Duration,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            sandbox: SandboxKind::Local,
            sandbox_root: default_sandbox_root(),
            docker_image: DEFAULT_DOCKER_IMAGE.to_string(),
            node_bin: DEFAULT_NODE_BIN.to_string(),
            npm_bin: DEFAULT_NPM_BIN.to_string(),
            compiler_version: DEFAULT_COMPILER_VERSION.to_string(),
            compile_timeout: Duration::from_millis(DEFAULT_COMPILE_TIMEOUT_MS),
        }
    }
}

impl PlaygroundConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let sandbox = match env_string(PLAYGROUND_SANDBOX_PROVIDER) {
            Some(raw) => raw.parse::<SandboxKind>()?,
            None => SandboxKind::Local,
        };

        let sandbox_root = env_string(PLAYGROUND_SANDBOX_ROOT)
            .map(PathBuf::from)
            .unwrap_or_else(default_sandbox_root);

        let timeout_ms = parse_env_or_default_with_validation(
            PLAYGROUND_COMPILE_TIMEOUT_MS,
            DEFAULT_COMPILE_TIMEOUT_MS,
            |v| v > 0 && v <= MAX_COMPILE_TIMEOUT_MS,
        );

        Ok(Self {
            sandbox,
            sandbox_root,
            docker_image: env_string_or_default(PLAYGROUND_DOCKER_IMAGE, DEFAULT_DOCKER_IMAGE),
            node_bin: env_string_or_default(PLAYGROUND_NODE_BIN, DEFAULT_NODE_BIN),
            npm_bin: env_string_or_default(PLAYGROUND_NPM_BIN, DEFAULT_NPM_BIN),
            compiler_version: env_string_or_default(
                PLAYGROUND_COMPILER_VERSION,
                DEFAULT_COMPILER_VERSION,
            ),
            compile_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

fn default_sandbox_root() -> PathBuf {
    std::env::temp_dir().join("playground-sandboxes")
}
