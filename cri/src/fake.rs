//! In-memory runtime that records every call, for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tonic::Status;

use cri_envcheck_core::error::Result;
use cri_envcheck_core::exec::ExecOutput;

use crate::cri_api::{ContainerConfig, KeyValue, PodSandboxConfig, VersionResponse};
use crate::runtime::{ContainerHandle, RuntimeApi, SandboxHandle};

pub const SANDBOX_ID: &str = "sb-1";
pub const CONTAINER_ID: &str = "ctr-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rpc {
    Version,
    RunPodSandbox,
    RemovePodSandbox,
    CreateContainer,
    StartContainer,
    RemoveContainer,
    ExecSync,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Version,
    RunPodSandbox,
    RemovePodSandbox(String),
    CreateContainer(String),
    StartContainer(String),
    RemoveContainer(String),
    ExecSync(String, Vec<String>),
}

impl Call {
    pub fn rpc(&self) -> Rpc {
        match self {
            Call::Version => Rpc::Version,
            Call::RunPodSandbox => Rpc::RunPodSandbox,
            Call::RemovePodSandbox(_) => Rpc::RemovePodSandbox,
            Call::CreateContainer(_) => Rpc::CreateContainer,
            Call::StartContainer(_) => Rpc::StartContainer,
            Call::RemoveContainer(_) => Rpc::RemoveContainer,
            Call::ExecSync(..) => Rpc::ExecSync,
        }
    }
}

/// Accepts every call unless told otherwise with `failing` or `hanging`.
#[derive(Default)]
pub struct FakeRuntime {
    calls: Mutex<Vec<Call>>,
    envs: Mutex<Vec<KeyValue>>,
    failing: HashSet<Rpc>,
    hanging: HashSet<Rpc>,
    exit_code: i32,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject `rpc` with an internal status.
    pub fn failing(mut self, rpc: Rpc) -> Self {
        self.failing.insert(rpc);
        self
    }

    /// Never answer `rpc`.
    pub fn hanging(mut self, rpc: Rpc) -> Self {
        self.hanging.insert(rpc);
        self
    }

    /// Exit code reported by ExecSync.
    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, rpc: Rpc) -> usize {
        self.calls().iter().filter(|c| c.rpc() == rpc).count()
    }

    async fn record(&self, call: Call) -> Result<()> {
        let rpc = call.rpc();
        self.calls.lock().unwrap().push(call);
        if self.hanging.contains(&rpc) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(&rpc) {
            return Err(Status::internal(format!("{:?} rejected by fake runtime", rpc)).into());
        }
        Ok(())
    }
}

#[async_trait]
impl RuntimeApi for FakeRuntime {
    async fn version(&self) -> Result<VersionResponse> {
        self.record(Call::Version).await?;
        Ok(VersionResponse {
            version: "0.1.0".to_string(),
            runtime_name: "fake".to_string(),
            runtime_version: "0.0.0".to_string(),
            runtime_api_version: "v1".to_string(),
        })
    }

    async fn run_pod_sandbox(&self, _config: PodSandboxConfig) -> Result<SandboxHandle> {
        self.record(Call::RunPodSandbox).await?;
        Ok(SandboxHandle::new(SANDBOX_ID))
    }

    async fn remove_pod_sandbox(&self, sandbox: &SandboxHandle) -> Result<()> {
        self.record(Call::RemovePodSandbox(sandbox.to_string()))
            .await
    }

    async fn create_container(
        &self,
        sandbox: &SandboxHandle,
        config: ContainerConfig,
        _sandbox_config: PodSandboxConfig,
    ) -> Result<ContainerHandle> {
        self.record(Call::CreateContainer(sandbox.to_string()))
            .await?;
        *self.envs.lock().unwrap() = config.envs;
        Ok(ContainerHandle::new(CONTAINER_ID))
    }

    async fn start_container(&self, container: &ContainerHandle) -> Result<()> {
        self.record(Call::StartContainer(container.to_string()))
            .await
    }

    async fn remove_container(&self, container: &ContainerHandle) -> Result<()> {
        self.record(Call::RemoveContainer(container.to_string()))
            .await
    }

    async fn exec_sync(
        &self,
        container: &ContainerHandle,
        cmd: Vec<String>,
    ) -> Result<ExecOutput> {
        self.record(Call::ExecSync(container.to_string(), cmd))
            .await?;
        // env | grep ASCII | wc -l
        let count = self
            .envs
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.key.contains("ASCII"))
            .count();
        Ok(ExecOutput {
            stdout: format!("{}\n", count).into_bytes(),
            stderr: vec![],
            exit_code: self.exit_code,
        })
    }
}
