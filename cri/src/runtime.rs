//! The runtime operations the check drives.
//!
//! `RuntimeClient` implements this over gRPC; tests substitute in-memory
//! runtimes.

use std::fmt;

use async_trait::async_trait;

use cri_envcheck_core::error::Result;
use cri_envcheck_core::exec::ExecOutput;

use crate::cri_api::{ContainerConfig, PodSandboxConfig, VersionResponse};

/// Opaque pod sandbox id returned by `RunPodSandbox`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SandboxHandle(String);

impl SandboxHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SandboxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque container id returned by `CreateContainer`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// CRI RuntimeService calls used by the check.
#[async_trait]
pub trait RuntimeApi: Send + Sync {
    /// Version handshake.
    async fn version(&self) -> Result<VersionResponse>;

    async fn run_pod_sandbox(&self, config: PodSandboxConfig) -> Result<SandboxHandle>;

    async fn remove_pod_sandbox(&self, sandbox: &SandboxHandle) -> Result<()>;

    async fn create_container(
        &self,
        sandbox: &SandboxHandle,
        config: ContainerConfig,
        sandbox_config: PodSandboxConfig,
    ) -> Result<ContainerHandle>;

    async fn start_container(&self, container: &ContainerHandle) -> Result<()>;

    async fn remove_container(&self, container: &ContainerHandle) -> Result<()>;

    /// Run `cmd` in the container and wait for it to exit.
    ///
    /// A non-zero exit is reported in the output, not as an error.
    async fn exec_sync(&self, container: &ContainerHandle, cmd: Vec<String>)
        -> Result<ExecOutput>;
}
