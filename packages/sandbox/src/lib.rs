// ABOUTME: Sandbox boundary and lifecycle management for the component playground
// ABOUTME: Providers boot isolated environments; the session provisions and shares one of them

pub mod layout;
pub mod providers;
pub mod session;

pub use layout::{CommandLine, ProjectFile, ProjectLayout};
pub use providers::{
    DockerProvider, ExitHandle, LocalProvider, OutputChunk, OutputStream, ProcessIo, Result,
    SandboxEnvironment, SandboxError, SandboxProvider, SpawnOptions, SpawnedProcess, StreamType,
};
pub use session::{BootStatus, SandboxSession};
