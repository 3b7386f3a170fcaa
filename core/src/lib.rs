//! cri-envcheck core - shared types for driving a CRI runtime.
//!
//! Holds the error taxonomy, run configuration and exec output types
//! used by the client and orchestration crate.

pub mod config;
pub mod error;
pub mod exec;

// Re-export commonly used types
pub use config::CheckConfig;
pub use error::{CheckError, Result};
pub use exec::ExecOutput;

/// cri-envcheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
