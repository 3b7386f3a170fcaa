use std::time::Duration;

use crate::error::{CheckError, Result};
use crate::exec::MAX_OUTPUT_BYTES;

/// Default CRI endpoint (containerd).
pub const DEFAULT_ENDPOINT: &str = "unix:///run/containerd/containerd.sock";

/// Bound on dialing the runtime and answering the version handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline attached to each lifecycle RPC.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(120);

/// Run configuration, built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Runtime endpoint, e.g. `unix:///run/containerd/containerd.sock`
    pub endpoint: String,

    /// Timeout for the initial connection and version handshake
    pub connect_timeout: Duration,

    /// Per-call deadline for lifecycle RPCs (`None` waits forever)
    pub rpc_timeout: Option<Duration>,

    /// Largest gRPC message accepted from the runtime
    pub max_recv_msg_size: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            rpc_timeout: Some(DEFAULT_RPC_TIMEOUT),
            max_recv_msg_size: MAX_OUTPUT_BYTES,
        }
    }
}

impl CheckConfig {
    /// Default configuration pointed at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Reject values that would make every call fail immediately.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(CheckError::ConfigError(
                "endpoint must not be empty".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(CheckError::ConfigError(
                "connect timeout must be greater than zero".to_string(),
            ));
        }
        if self.rpc_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CheckError::ConfigError(
                "rpc timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_recv_msg_size == 0 {
            return Err(CheckError::ConfigError(
                "max receive message size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
