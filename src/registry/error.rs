// ABOUTME: Registry client error types with SNAFU pattern.
// ABOUTME: Separates a missing CLI, a rejected call, an unreadable response, and local file failures.

use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistryError {
    #[snafu(display("failed to start {program}: {source}"))]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("{operation} failed: {stderr}"))]
    Rejected {
        operation: &'static str,
        stderr: String,
    },

    #[snafu(display("unexpected response from {operation}: {source}"))]
    Response {
        operation: &'static str,
        source: serde_json::Error,
    },

    #[snafu(display("failed to write registry config {}: {source}", path.display()))]
    WriteConfig {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryErrorKind {
    /// The registry CLI is not installed or could not be executed.
    ToolUnavailable,
    /// The registry service refused the request.
    Rejected,
    /// The CLI answered with something other than the expected JSON.
    MalformedResponse,
    /// A local file could not be written.
    Filesystem,
}

impl RegistryError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RegistryErrorKind {
        match self {
            RegistryError::Spawn { .. } => RegistryErrorKind::ToolUnavailable,
            RegistryError::Rejected { .. } => RegistryErrorKind::Rejected,
            RegistryError::Response { .. } => RegistryErrorKind::MalformedResponse,
            RegistryError::WriteConfig { .. } => RegistryErrorKind::Filesystem,
        }
    }

    /// Whether the service rejected the call because the resource already exists.
    pub fn is_conflict(&self) -> bool {
        match self {
            RegistryError::Rejected { stderr, .. } => {
                let stderr = stderr.to_lowercase();
                stderr.contains("conflictexception") || stderr.contains("already exists")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_detection_reads_stderr() {
        let err = RegistryError::Rejected {
            operation: "create-domain",
            stderr: "An error occurred (ConflictException) when calling the CreateDomain operation"
                .to_string(),
        };
        assert!(err.is_conflict());
        assert_eq!(err.kind(), RegistryErrorKind::Rejected);

        let err = RegistryError::Rejected {
            operation: "create-domain",
            stderr: "An error occurred (AccessDeniedException)".to_string(),
        };
        assert!(!err.is_conflict());
    }
}
