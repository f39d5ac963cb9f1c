// ABOUTME: Revision-control capability used by production-like change detection.
// ABOUTME: Git implementation runs git subprocesses with an explicit working directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum RevisionError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },
}

/// Access to source revision history.
///
/// Injected into the decision policy instead of reaching into ambient
/// repository state, so revision-based detection can be tested without a
/// real checkout.
#[async_trait]
pub trait RevisionControl: Send + Sync {
    /// Identifier of the current revision, or `None` when there is no usable history.
    async fn current_revision(&self) -> Option<String>;

    /// Paths under `scope` that differ between two revisions.
    async fn changed_files(
        &self,
        from: &str,
        to: &str,
        scope: &Path,
    ) -> Result<Vec<String>, RevisionError>;
}

/// Git-backed revision history rooted at a working tree.
#[derive(Debug, Clone)]
pub struct GitRevisions {
    repo_dir: PathBuf,
}

impl GitRevisions {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<String, RevisionError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(RevisionError::Command {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Pathspec for `scope`, relative to the repository directory when possible.
    fn pathspec(&self, scope: &Path) -> String {
        let relative = scope.strip_prefix(&self.repo_dir).unwrap_or(scope);
        let spec = relative.to_string_lossy();
        if spec.is_empty() {
            ".".to_string()
        } else {
            spec.into_owned()
        }
    }
}

#[async_trait]
impl RevisionControl for GitRevisions {
    async fn current_revision(&self) -> Option<String> {
        match self.git(&["rev-parse", "HEAD"]).await {
            Ok(out) => {
                let revision = out.trim();
                (!revision.is_empty()).then(|| revision.to_string())
            }
            Err(e) => {
                tracing::debug!("No current revision: {}", e);
                None
            }
        }
    }

    async fn changed_files(
        &self,
        from: &str,
        to: &str,
        scope: &Path,
    ) -> Result<Vec<String>, RevisionError> {
        let pathspec = self.pathspec(scope);
        let out = self
            .git(&["diff", "--name-only", from, to, "--", &pathspec])
            .await?;

        Ok(out
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}
