//! cri-envcheck - drive a CRI runtime through a full container lifecycle.
//!
//! Creates a pod sandbox and a container carrying 94 generated environment
//! variables, starts it, counts the variables from inside the container,
//! and removes everything it created on every exit path.

pub mod client;
pub mod config_factory;
pub mod endpoint;
pub mod error;
pub mod lifecycle;
pub mod runtime;
pub mod teardown;

#[cfg(test)]
mod fake;

pub use client::RuntimeClient;
pub use lifecycle::{Lifecycle, LifecycleState, Step};
pub use runtime::{ContainerHandle, RuntimeApi, SandboxHandle};
pub use teardown::{Cleanup, Teardown, TeardownSummary};

/// Generated CRI v1 protobuf types.
pub mod cri_api {
    tonic::include_proto!("runtime.v1");
}
