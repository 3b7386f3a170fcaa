//! Reverse-order cleanup of created runtime resources.
//!
//! Each successful creation registers its removal immediately. Draining
//! pops obligations last-in-first-out, so the container is always removed
//! before the sandbox that owns it. A failed removal is logged and the
//! remaining obligations still run.

use cri_envcheck_core::error::Result;

use crate::error::cleanup_failure;
use crate::runtime::{ContainerHandle, RuntimeApi, SandboxHandle};

/// A pending removal for a resource the runtime confirmed it created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleanup {
    RemoveContainer(ContainerHandle),
    RemovePodSandbox(SandboxHandle),
}

impl Cleanup {
    /// Resource kind, as used in log lines and errors.
    pub fn resource(&self) -> &'static str {
        match self {
            Cleanup::RemoveContainer(_) => "container",
            Cleanup::RemovePodSandbox(_) => "pod sandbox",
        }
    }

    /// Runtime id of the resource.
    pub fn id(&self) -> &str {
        match self {
            Cleanup::RemoveContainer(handle) => handle.as_str(),
            Cleanup::RemovePodSandbox(handle) => handle.as_str(),
        }
    }

    async fn execute<R: RuntimeApi + ?Sized>(&self, runtime: &R) -> Result<()> {
        match self {
            Cleanup::RemoveContainer(handle) => runtime.remove_container(handle).await,
            Cleanup::RemovePodSandbox(handle) => runtime.remove_pod_sandbox(handle).await,
        }
    }
}

/// Outcome of draining a [`Teardown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownSummary {
    /// Removal calls issued.
    pub attempted: usize,
    /// Removal calls that failed.
    pub failed: usize,
}

impl TeardownSummary {
    /// Every attempted removal succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// LIFO stack of cleanup obligations.
#[derive(Debug, Default)]
pub struct Teardown {
    obligations: Vec<Cleanup>,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a removal. Call only after the creation call succeeded.
    pub fn register(&mut self, cleanup: Cleanup) {
        tracing::debug!(
            resource = cleanup.resource(),
            id = %cleanup.id(),
            "Registered cleanup"
        );
        self.obligations.push(cleanup);
    }

    /// Execute every obligation in reverse registration order.
    ///
    /// Each obligation is attempted exactly once; failures never stop the
    /// drain.
    pub async fn run_all<R: RuntimeApi + ?Sized>(&mut self, runtime: &R) -> TeardownSummary {
        let mut summary = TeardownSummary::default();

        while let Some(cleanup) = self.obligations.pop() {
            summary.attempted += 1;
            match cleanup.execute(runtime).await {
                Ok(()) => {
                    tracing::info!(
                        resource = cleanup.resource(),
                        id = %cleanup.id(),
                        "Removed"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    let err = cleanup_failure(cleanup.resource(), e);
                    tracing::error!(id = %cleanup.id(), error = %err, "Cleanup failed");
                }
            }
        }

        summary
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        if !self.obligations.is_empty() {
            let leaked: Vec<String> = self
                .obligations
                .iter()
                .map(|c| format!("{} {}", c.resource(), c.id()))
                .collect();
            tracing::error!(
                leaked = ?leaked,
                "Teardown dropped with cleanup obligations that never ran"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{Call, FakeRuntime};

    fn sandbox(id: &str) -> Cleanup {
        Cleanup::RemovePodSandbox(SandboxHandle::new(id))
    }

    fn container(id: &str) -> Cleanup {
        Cleanup::RemoveContainer(ContainerHandle::new(id))
    }

    #[tokio::test]
    async fn test_run_all_reverses_registration_order() {
        let runtime = FakeRuntime::new();
        let mut teardown = Teardown::new();
        teardown.register(sandbox("sb-1"));
        teardown.register(container("ctr-1"));

        let summary = teardown.run_all(&runtime).await;

        assert_eq!(summary, TeardownSummary { attempted: 2, failed: 0 });
        assert!(summary.is_clean());
        assert_eq!(
            runtime.calls(),
            vec![
                Call::RemoveContainer("ctr-1".to_string()),
                Call::RemovePodSandbox("sb-1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_removal_does_not_stop_drain() {
        let runtime = FakeRuntime::new().failing(crate::fake::Rpc::RemoveContainer);
        let mut teardown = Teardown::new();
        teardown.register(sandbox("sb-1"));
        teardown.register(container("ctr-1"));

        let summary = teardown.run_all(&runtime).await;

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_clean());
        assert_eq!(runtime.count(crate::fake::Rpc::RemovePodSandbox), 1);
    }

    #[tokio::test]
    async fn test_run_all_is_exactly_once() {
        let runtime = FakeRuntime::new();
        let mut teardown = Teardown::new();
        teardown.register(sandbox("sb-1"));

        teardown.run_all(&runtime).await;
        let second = teardown.run_all(&runtime).await;

        assert_eq!(second.attempted, 0);
        assert_eq!(runtime.count(crate::fake::Rpc::RemovePodSandbox), 1);
    }

    #[tokio::test]
    async fn test_empty_teardown_issues_no_calls() {
        let runtime = FakeRuntime::new();
        let mut teardown = Teardown::new();

        let summary = teardown.run_all(&runtime).await;

        assert_eq!(summary, TeardownSummary::default());
        assert!(runtime.calls().is_empty());
    }

    #[test]
    fn test_cleanup_names_resource_and_id() {
        assert_eq!(sandbox("sb-1").resource(), "pod sandbox");
        assert_eq!(container("ctr-1").resource(), "container");
        assert_eq!(container("ctr-1").id(), "ctr-1");
    }
}
