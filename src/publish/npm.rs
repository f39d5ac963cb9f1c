// ABOUTME: Publisher backed by `npm publish` with a scratch, auto-deleted user config.
// ABOUTME: Registry "version exists" conflicts are reported as AlreadyExists.

use async_trait::async_trait;
use std::io::Write;
use std::process::Stdio;
use tokio::process::Command;

use super::{Package, PublishError, PublishStatus, Publisher};
use crate::registry::auth_prefix;

/// Output fragments npm prints when the version is already published.
const CONFLICT_MARKERS: &[&str] = &[
    "e409",
    "epublishconflict",
    "cannot publish over",
    "already exists",
    "previously published",
];

#[derive(Debug, Clone)]
pub struct NpmPublisher {
    program: String,
}

impl Default for NpmPublisher {
    fn default() -> Self {
        Self {
            program: "npm".to_string(),
        }
    }
}

impl NpmPublisher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// User config for one publish: the registry, optionally scoped, and its token.
fn user_config(package: &Package, registry_url: &str, token: &str) -> String {
    let url = format!("{}/", registry_url.trim_end_matches('/'));
    let prefix = auth_prefix(registry_url);
    let mut text = format!("registry={url}\n");
    if let Some((scope, _)) = package.name.split_once('/')
        && scope.starts_with('@')
    {
        text.push_str(&format!("{scope}:registry={url}\n"));
    }
    text.push_str(&format!("{prefix}:_authToken={token}\n"));
    text
}

fn is_conflict(output: &str) -> bool {
    let output = output.to_lowercase();
    CONFLICT_MARKERS.iter().any(|m| output.contains(m))
}

#[async_trait]
impl Publisher for NpmPublisher {
    async fn publish(
        &self,
        package: &Package,
        registry_url: &str,
        token: &str,
    ) -> Result<PublishStatus, PublishError> {
        // Removed when dropped, including on early return.
        let mut config = tempfile::NamedTempFile::new().map_err(PublishError::Credentials)?;
        config
            .write_all(user_config(package, registry_url, token).as_bytes())
            .map_err(PublishError::Credentials)?;

        tracing::debug!("Publishing {} from {}", package.name, package.path.display());

        let output = Command::new(&self.program)
            .arg("publish")
            .arg("--userconfig")
            .arg(config.path())
            .arg("--registry")
            .arg(registry_url)
            .current_dir(&package.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| PublishError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(PublishStatus::Published);
        }

        let text = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        if is_conflict(&text) {
            return Ok(PublishStatus::AlreadyExists);
        }

        let message = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .unwrap_or("no output")
            .to_string();
        Err(PublishError::Failed {
            package: package.name.clone(),
            message: format!("{} exited with {}: {}", self.program, output.status, message),
        })
    }
}
