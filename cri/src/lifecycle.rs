//! Check run orchestration.
//!
//! Drives the runtime through a fixed sequence:
//! run sandbox → create container → start container → exec → report.
//!
//! Forward steps are fail-fast: the first failure aborts the run and nothing
//! further is attempted. Cleanup is unconditional: every resource the runtime
//! confirmed it created is removed, in reverse order, on every exit path.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use cri_envcheck_core::error::{CheckError, Result};
use cri_envcheck_core::exec::ExecOutput;

use crate::config_factory::{self, EXPECTED_ENV_COUNT};
use crate::error::step_failure;
use crate::runtime::RuntimeApi;
use crate::teardown::{Cleanup, Teardown, TeardownSummary};

/// Lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing created yet
    Idle,

    /// Pod sandbox running, cleanup registered
    SandboxCreated,

    /// Container created, cleanup registered
    ContainerCreated,

    /// Container running, ready for exec
    ContainerStarted,

    /// Diagnostic command returned
    Executed,

    /// Result reported and teardown drained
    Done,

    /// A forward step failed or was interrupted (absorbing)
    Failed,
}

/// Forward-path step, used to name failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    RunPodSandbox,
    CreateContainer,
    StartContainer,
    ExecSync,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::RunPodSandbox => "run pod sandbox",
            Step::CreateContainer => "create container",
            Step::StartContainer => "start container",
            Step::ExecSync => "exec sync",
        };
        f.write_str(name)
    }
}

impl Step {
    /// Whether the step asks the runtime to create a resource.
    pub fn creates_resource(&self) -> bool {
        matches!(self, Step::RunPodSandbox | Step::CreateContainer)
    }

    /// Step the run is waiting on while in `state`.
    fn pending_in(state: LifecycleState) -> Option<Step> {
        match state {
            LifecycleState::Idle => Some(Step::RunPodSandbox),
            LifecycleState::SandboxCreated => Some(Step::CreateContainer),
            LifecycleState::ContainerCreated => Some(Step::StartContainer),
            LifecycleState::ContainerStarted => Some(Step::ExecSync),
            _ => None,
        }
    }
}

/// One check run against a runtime.
pub struct Lifecycle<'a, R: RuntimeApi + ?Sized> {
    runtime: &'a R,
    state: LifecycleState,
    teardown: Teardown,
    command: Vec<String>,
    teardown_summary: Option<TeardownSummary>,
    abandoned: Option<Step>,
}

impl<'a, R: RuntimeApi + ?Sized> Lifecycle<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self {
            runtime,
            state: LifecycleState::Idle,
            teardown: Teardown::new(),
            command: config_factory::diagnostic_command(),
            teardown_summary: None,
            abandoned: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Result of the teardown drain, once the run has finished.
    pub fn teardown_summary(&self) -> Option<TeardownSummary> {
        self.teardown_summary
    }

    /// Creation call left in flight by an interrupt.
    ///
    /// The runtime may still complete it, leaving a resource this run holds
    /// no handle for and never removes.
    pub fn abandoned_creation(&self) -> Option<Step> {
        self.abandoned
    }

    /// Run the full sequence with no external cancellation.
    pub async fn run(&mut self) -> Result<ExecOutput> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run the full sequence, aborting the forward path if `shutdown`
    /// completes first. Teardown runs either way.
    pub async fn run_until<S>(&mut self, shutdown: S) -> Result<ExecOutput>
    where
        S: Future<Output = ()>,
    {
        if self.state != LifecycleState::Idle {
            return Err(CheckError::ConfigError(format!(
                "lifecycle already ran (state {:?})",
                self.state
            )));
        }

        tokio::pin!(shutdown);
        let outcome = self.advance(shutdown).await;

        let summary = self.teardown.run_all(self.runtime).await;
        if !summary.is_clean() {
            tracing::warn!(
                attempted = summary.attempted,
                failed = summary.failed,
                "Teardown finished with errors"
            );
        }
        self.teardown_summary = Some(summary);

        match outcome {
            Ok(output) => {
                self.report(&output);
                self.state = LifecycleState::Done;
                Ok(output)
            }
            Err(e) => {
                if let CheckError::Interrupted { .. } = e {
                    self.abandoned = Step::pending_in(self.state).filter(Step::creates_resource);
                }
                self.state = LifecycleState::Failed;
                Err(e)
            }
        }
    }

    async fn advance<S>(&mut self, mut shutdown: Pin<&mut S>) -> Result<ExecOutput>
    where
        S: Future<Output = ()>,
    {
        let runtime = self.runtime;
        let sandbox_config = config_factory::pod_sandbox_config();

        let sandbox = guarded(
            Step::RunPodSandbox,
            shutdown.as_mut(),
            runtime.run_pod_sandbox(sandbox_config.clone()),
        )
        .await?;
        self.teardown
            .register(Cleanup::RemovePodSandbox(sandbox.clone()));
        self.state = LifecycleState::SandboxCreated;
        tracing::info!(sandbox_id = %sandbox, "Pod sandbox created");

        let container = guarded(
            Step::CreateContainer,
            shutdown.as_mut(),
            runtime.create_container(&sandbox, config_factory::container_config(), sandbox_config),
        )
        .await?;
        self.teardown
            .register(Cleanup::RemoveContainer(container.clone()));
        self.state = LifecycleState::ContainerCreated;
        tracing::info!(
            sandbox_id = %sandbox,
            container_id = %container,
            envs = EXPECTED_ENV_COUNT,
            "Container created"
        );

        guarded(
            Step::StartContainer,
            shutdown.as_mut(),
            runtime.start_container(&container),
        )
        .await?;
        self.state = LifecycleState::ContainerStarted;
        tracing::info!(container_id = %container, "Container started");

        let output = guarded(
            Step::ExecSync,
            shutdown.as_mut(),
            runtime.exec_sync(&container, self.command.clone()),
        )
        .await?;
        self.state = LifecycleState::Executed;

        if !output.success() {
            tracing::warn!(
                container_id = %container,
                exit_code = output.exit_code,
                stderr = %output.stderr_trimmed(),
                "Diagnostic command exited non-zero"
            );
        }

        Ok(output)
    }

    fn report(&self, output: &ExecOutput) {
        match output.count() {
            Some(count) if count == EXPECTED_ENV_COUNT => {
                tracing::info!(count, "All injected environment variables are set");
            }
            Some(count) => {
                tracing::warn!(
                    count,
                    expected = EXPECTED_ENV_COUNT,
                    "Environment variable count does not match"
                );
            }
            None => {
                tracing::warn!(
                    stdout = %output.stdout_trimmed(),
                    "Diagnostic output is not a count"
                );
            }
        }
    }
}

/// Await one forward step, racing it against shutdown.
async fn guarded<T, F, S>(step: Step, shutdown: Pin<&mut S>, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
    S: Future<Output = ()>,
{
    let result = tokio::select! {
        biased;
        _ = shutdown => {
            if step.creates_resource() {
                tracing::warn!(
                    step = %step,
                    "Abandoned in-flight creation; the runtime may still create a resource that will not be removed"
                );
            }
            Err(CheckError::Interrupted { step: step.to_string() })
        }
        result = call => result.map_err(|e| step_failure(step, e)),
    };

    if let Err(ref e) = result {
        tracing::error!(step = %step, error = %e, "Lifecycle step failed");
    }
    result
}
