//! Runtime endpoint resolution.
//!
//! Turns the `--endpoint` string into a socket address the connector can
//! dial. Only Unix domain sockets are supported, matching kubelet.

use std::fmt;
use std::path::{Path, PathBuf};

use cri_envcheck_core::error::{CheckError, Result};

const UNIX_SCHEME: &str = "unix";

/// A resolved runtime address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeAddress {
    /// Unix domain socket at an absolute path.
    Unix(PathBuf),
}

impl RuntimeAddress {
    /// Resolve an endpoint string.
    ///
    /// Accepts `unix:///path/to.sock`. A bare absolute path is treated as a
    /// Unix socket with a deprecation warning.
    pub fn parse(endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(invalid(endpoint, "endpoint is empty"));
        }

        let path = match endpoint.split_once("://") {
            Some((scheme, rest)) => {
                if scheme != UNIX_SCHEME {
                    return Err(invalid(
                        endpoint,
                        &format!(
                            "protocol {:?} not supported, only unix socket endpoints are",
                            scheme
                        ),
                    ));
                }
                rest
            }
            None => {
                tracing::warn!(
                    endpoint = %endpoint,
                    "Endpoint has no scheme, assuming unix socket (deprecated)"
                );
                endpoint
            }
        };

        if path.is_empty() {
            return Err(invalid(endpoint, "socket path is empty"));
        }
        if !Path::new(path).is_absolute() {
            return Err(invalid(endpoint, "socket path must be absolute"));
        }

        Ok(RuntimeAddress::Unix(PathBuf::from(path)))
    }

    /// Socket path to dial.
    pub fn socket_path(&self) -> &Path {
        match self {
            RuntimeAddress::Unix(path) => path,
        }
    }
}

impl fmt::Display for RuntimeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeAddress::Unix(path) => write!(f, "{}://{}", UNIX_SCHEME, path.display()),
        }
    }
}

fn invalid(endpoint: &str, message: &str) -> CheckError {
    CheckError::EndpointError {
        endpoint: endpoint.to_string(),
        message: message.to_string(),
    }
}
