// ABOUTME: Error types for a single module deployment.
// ABOUTME: Distinguishes a tool that could not start from one that ran and failed.

use super::outcome::DeployFailure;

/// Errors from invoking the external deployment tool for one module.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The tool could not be started (missing binary, bad working directory).
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    /// The tool ran and reported failure.
    #[error("{tool} exited with {status}")]
    ToolFailed {
        tool: String,
        status: String,
        output: String,
    },
}

impl DeployError {
    /// Raw tool output captured before the failure, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            DeployError::Spawn { .. } => None,
            DeployError::ToolFailed { output, .. } => Some(output),
        }
    }

    /// Convert into a reportable, categorized failure.
    pub fn to_failure(&self) -> DeployFailure {
        let message = match self.output().and_then(last_error_line) {
            Some(line) => format!("{self}: {line}"),
            None => self.to_string(),
        };
        DeployFailure::new(message, self.output())
    }
}

/// The most informative line of tool output: the last one mentioning an error,
/// else the last non-empty line.
fn last_error_line(output: &str) -> Option<&str> {
    let lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
    lines
        .clone()
        .filter(|l| l.to_lowercase().contains("error"))
        .last()
        .or_else(|| lines.last())
}
