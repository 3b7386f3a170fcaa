//! Exec result types.
//!
//! Captured output of the diagnostic command run inside the container.

/// Maximum output size accepted from the runtime: 16 MiB.
pub const MAX_OUTPUT_BYTES: usize = 16 * 1024 * 1024;

/// Output from an executed command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// Captured stdout bytes.
    pub stdout: Vec<u8>,
    /// Captured stderr bytes.
    pub stderr: Vec<u8>,
    /// Process exit code.
    pub exit_code: i32,
}

impl ExecOutput {
    /// Whether the command itself exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout decoded lossily with surrounding whitespace removed.
    pub fn stdout_trimmed(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    /// Stderr decoded lossily with surrounding whitespace removed.
    pub fn stderr_trimmed(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Stdout parsed as a single count, as printed by `wc -l`.
    pub fn count(&self) -> Option<usize> {
        self.stdout_trimmed().parse().ok()
    }
}
