//! CRI-specific error conversions.
//!
//! Runtime calls fail with a raw gRPC status or a deadline; these helpers
//! attach the lifecycle step so the reported error names what was attempted.

use cri_envcheck_core::error::CheckError;
use tonic::Status;

use crate::lifecycle::Step;

/// Render a runtime error without the generic `gRPC error:` prefix.
fn describe(err: &CheckError) -> String {
    match err {
        CheckError::GrpcError(status) => status_message(status),
        other => other.to_string(),
    }
}

/// `code = Unavailable desc = ...`, close to what runtimes log themselves.
pub fn status_message(status: &Status) -> String {
    format!("code = {:?} desc = {}", status.code(), status.message())
}

/// Convert a failed forward-path call into the error kind for its step.
pub fn step_failure(step: Step, err: CheckError) -> CheckError {
    if let CheckError::Interrupted { .. } = err {
        return err;
    }

    let message = describe(&err);
    match step {
        Step::RunPodSandbox => CheckError::CreationError {
            resource: "pod sandbox".to_string(),
            message,
        },
        Step::CreateContainer => CheckError::CreationError {
            resource: "container".to_string(),
            message,
        },
        Step::StartContainer => CheckError::StartError(message),
        Step::ExecSync => CheckError::ExecutionError(message),
    }
}

/// Convert a failed removal into a (non-fatal) cleanup error.
pub fn cleanup_failure(resource: &str, err: CheckError) -> CheckError {
    CheckError::CleanupError {
        resource: resource.to_string(),
        message: describe(&err),
    }
}
