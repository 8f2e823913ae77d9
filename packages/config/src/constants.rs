// ABOUTME: Environment variable name constants and built-in defaults
// ABOUTME: Centralized definitions of all environment variable names used by the playground

// Sandbox Configuration
pub const PLAYGROUND_SANDBOX_PROVIDER: &str = "PLAYGROUND_SANDBOX_PROVIDER";
pub const PLAYGROUND_SANDBOX_ROOT: &str = "PLAYGROUND_SANDBOX_ROOT";
pub const PLAYGROUND_DOCKER_IMAGE: &str = "PLAYGROUND_DOCKER_IMAGE";

// Toolchain Configuration
pub const PLAYGROUND_NODE_BIN: &str = "PLAYGROUND_NODE_BIN";
pub const PLAYGROUND_NPM_BIN: &str = "PLAYGROUND_NPM_BIN";
pub const PLAYGROUND_COMPILER_VERSION: &str = "PLAYGROUND_COMPILER_VERSION";

// Compilation Configuration
pub const PLAYGROUND_COMPILE_TIMEOUT_MS: &str = "PLAYGROUND_COMPILE_TIMEOUT_MS";

// Defaults
pub const DEFAULT_COMPILE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_DOCKER_IMAGE: &str = "node:20-alpine";
pub const DEFAULT_NODE_BIN: &str = "node";
pub const DEFAULT_NPM_BIN: &str = "npm";
pub const DEFAULT_COMPILER_VERSION: &str = "^3.4.0";

/// Upper bound accepted for the compile read timeout (5 minutes)
pub const MAX_COMPILE_TIMEOUT_MS: u64 = 300_000;
