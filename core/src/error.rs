use thiserror::Error;

/// Errors raised while driving a CRI runtime through the check lifecycle.
#[derive(Error, Debug)]
pub enum CheckError {
    /// Endpoint string could not be resolved to a socket address
    #[error("Invalid runtime endpoint {endpoint:?}: {message}")]
    EndpointError { endpoint: String, message: String },

    /// Dialing the runtime failed or timed out
    #[error("Connect remote runtime failed: {0}")]
    ConnectionError(String),

    /// RunPodSandbox or CreateContainer failed
    #[error("Create {resource} failed: {message}")]
    CreationError { resource: String, message: String },

    /// StartContainer failed
    #[error("Start container failed: {0}")]
    StartError(String),

    /// ExecSync could not be dispatched
    #[error("Exec command in container failed: {0}")]
    ExecutionError(String),

    /// Removing a resource failed (logged, never fatal)
    #[error("Remove {resource} failed: {message}")]
    CleanupError { resource: String, message: String },

    /// Per-call deadline expired
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// A shutdown signal arrived while a step was in flight
    #[error("Interrupted during {step}")]
    Interrupted { step: String },

    /// gRPC communication error
    #[error("gRPC error: {0}")]
    GrpcError(#[from] tonic::Status),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for check operations
pub type Result<T> = std::result::Result<T, CheckError>;
