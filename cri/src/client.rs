//! gRPC client for the CRI RuntimeService.
//!
//! Dials the runtime over its Unix socket with a bounded connect timeout,
//! checks `Version`, and then serves every lifecycle call through a single
//! shared channel.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UnixStream;
use tokio::time::Instant;
use tonic::transport::{Channel, Endpoint, Uri};
use tonic::{Response, Status};
use tower::service_fn;

use cri_envcheck_core::config::CheckConfig;
use cri_envcheck_core::error::{CheckError, Result};
use cri_envcheck_core::exec::ExecOutput;

use crate::cri_api::runtime_service_client::RuntimeServiceClient;
use crate::cri_api::*;
use crate::endpoint::RuntimeAddress;
use crate::runtime::{ContainerHandle, RuntimeApi, SandboxHandle};

/// Version string sent with the handshake, as kubelet does.
const KUBE_RUNTIME_API_VERSION: &str = "0.1.0";

/// API version a CRI v1 runtime reports.
pub const EXPECTED_RUNTIME_API_VERSION: &str = "v1";

/// Placeholder authority; the connector ignores it and dials the socket.
const UDS_PLACEHOLDER_URI: &str = "http://[::]:50051";

/// Connected CRI runtime client.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    inner: RuntimeServiceClient<Channel>,
    address: RuntimeAddress,
    rpc_timeout: Option<Duration>,
}

impl RuntimeClient {
    /// Connect to the runtime named by `config.endpoint`.
    ///
    /// Fails if the endpoint cannot be resolved or the socket cannot be
    /// dialed within `config.connect_timeout`. A failed version handshake is
    /// logged but does not fail the connection.
    pub async fn connect(config: &CheckConfig) -> Result<Self> {
        config.validate()?;
        let address = RuntimeAddress::parse(&config.endpoint)?;
        let socket_path = address.socket_path().to_path_buf();

        tracing::debug!(
            address = %address,
            timeout_ms = config.connect_timeout.as_millis() as u64,
            "Connecting to runtime"
        );

        let endpoint = Endpoint::from_static(UDS_PLACEHOLDER_URI)
            .connect_timeout(config.connect_timeout);
        let connect = endpoint.connect_with_connector(service_fn(move |_: Uri| {
            UnixStream::connect(socket_path.clone())
        }));

        // One deadline covers both the dial and the version handshake
        let deadline = Instant::now() + config.connect_timeout;
        let channel = tokio::time::timeout_at(deadline, connect)
            .await
            .map_err(|_| {
                CheckError::ConnectionError(format!(
                    "timed out after {:?} dialing {}",
                    config.connect_timeout, address
                ))
            })?
            .map_err(|e| CheckError::ConnectionError(format!("{}: {}", address, e)))?;

        let inner = RuntimeServiceClient::new(channel)
            .max_decoding_message_size(config.max_recv_msg_size);

        let client = Self {
            inner,
            address,
            rpc_timeout: config.rpc_timeout,
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        handshake(&client, &client.address, remaining).await;

        Ok(client)
    }

    /// Resolved address this client is connected to.
    pub fn address(&self) -> &RuntimeAddress {
        &self.address
    }

    /// Await an RPC under the per-call deadline.
    async fn call<T, F>(&self, rpc: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<Response<T>, Status>>,
    {
        let response = match self.rpc_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                CheckError::TimeoutError(format!("{} did not complete within {:?}", rpc, limit))
            })??,
            None => fut.await?,
        };
        Ok(response.into_inner())
    }
}

#[async_trait]
impl RuntimeApi for RuntimeClient {
    async fn version(&self) -> Result<VersionResponse> {
        let mut client = self.inner.clone();
        let request = VersionRequest {
            version: KUBE_RUNTIME_API_VERSION.to_string(),
        };
        self.call("Version", client.version(request)).await
    }

    async fn run_pod_sandbox(&self, config: PodSandboxConfig) -> Result<SandboxHandle> {
        let mut client = self.inner.clone();
        let request = RunPodSandboxRequest {
            config: Some(config),
            runtime_handler: String::new(),
        };
        let response = self
            .call("RunPodSandbox", client.run_pod_sandbox(request))
            .await?;
        Ok(SandboxHandle::new(response.pod_sandbox_id))
    }

    async fn remove_pod_sandbox(&self, sandbox: &SandboxHandle) -> Result<()> {
        let mut client = self.inner.clone();
        let request = RemovePodSandboxRequest {
            pod_sandbox_id: sandbox.as_str().to_string(),
        };
        self.call("RemovePodSandbox", client.remove_pod_sandbox(request))
            .await?;
        Ok(())
    }

    async fn create_container(
        &self,
        sandbox: &SandboxHandle,
        config: ContainerConfig,
        sandbox_config: PodSandboxConfig,
    ) -> Result<ContainerHandle> {
        let mut client = self.inner.clone();
        let request = CreateContainerRequest {
            pod_sandbox_id: sandbox.as_str().to_string(),
            config: Some(config),
            sandbox_config: Some(sandbox_config),
        };
        let response = self
            .call("CreateContainer", client.create_container(request))
            .await?;
        Ok(ContainerHandle::new(response.container_id))
    }

    async fn start_container(&self, container: &ContainerHandle) -> Result<()> {
        let mut client = self.inner.clone();
        let request = StartContainerRequest {
            container_id: container.as_str().to_string(),
        };
        self.call("StartContainer", client.start_container(request))
            .await?;
        Ok(())
    }

    async fn remove_container(&self, container: &ContainerHandle) -> Result<()> {
        let mut client = self.inner.clone();
        let request = RemoveContainerRequest {
            container_id: container.as_str().to_string(),
        };
        self.call("RemoveContainer", client.remove_container(request))
            .await?;
        Ok(())
    }

    async fn exec_sync(
        &self,
        container: &ContainerHandle,
        cmd: Vec<String>,
    ) -> Result<ExecOutput> {
        let mut client = self.inner.clone();
        // timeout 0: the runtime lets the command run to completion
        let request = ExecSyncRequest {
            container_id: container.as_str().to_string(),
            cmd,
            timeout: 0,
        };
        let response = self.call("ExecSync", client.exec_sync(request)).await?;
        Ok(ExecOutput {
            stdout: response.stdout,
            stderr: response.stderr,
            exit_code: response.exit_code,
        })
    }
}

/// Handshake with the runtime within `limit`.
///
/// Failures are logged only; an incompatible runtime surfaces later as a
/// failing lifecycle step. Returns the version when the runtime answered.
pub(crate) async fn handshake<R: RuntimeApi + ?Sized>(
    runtime: &R,
    endpoint: &RuntimeAddress,
    limit: Duration,
) -> Option<VersionResponse> {
    match tokio::time::timeout(limit, runtime.version()).await {
        Ok(Ok(version)) => {
            tracing::info!(
                runtime_name = %version.runtime_name,
                runtime_version = %version.runtime_version,
                runtime_api_version = %version.runtime_api_version,
                "Connected to runtime"
            );
            if version.runtime_api_version != EXPECTED_RUNTIME_API_VERSION {
                tracing::warn!(
                    endpoint = %endpoint,
                    runtime_api_version = %version.runtime_api_version,
                    expected = EXPECTED_RUNTIME_API_VERSION,
                    "Runtime reports an unexpected CRI API version"
                );
            }
            Some(version)
        }
        Ok(Err(e)) => {
            tracing::error!(
                endpoint = %endpoint,
                error = %e,
                "Validate CRI v1 runtime API failed"
            );
            None
        }
        Err(_) => {
            tracing::error!(
                endpoint = %endpoint,
                timeout_ms = limit.as_millis() as u64,
                "Validate CRI v1 runtime API timed out"
            );
            None
        }
    }
}
