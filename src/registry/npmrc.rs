// ABOUTME: Writes a consumer project's package-manager registry config.
// ABOUTME: Backs up any existing file, writes atomically, and restricts permissions to the owner.

use chrono::Utc;
use snafu::ResultExt;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::RegistryError;
use super::error::WriteConfigSnafu;

pub const REGISTRY_CONFIG_FILE: &str = ".npmrc";

/// Where the config was written and where the previous one was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenConfig {
    pub path: PathBuf,
    pub backup: Option<PathBuf>,
}

/// Registry URL with exactly one trailing slash.
fn normalized(url: &str) -> String {
    format!("{}/", url.trim().trim_end_matches('/'))
}

/// Scheme-less prefix that keys per-registry settings, e.g. `//host/npm/repo/`.
pub fn auth_prefix(registry_url: &str) -> String {
    let url = normalized(registry_url);
    match url.split_once("://") {
        Some((_, rest)) => format!("//{rest}"),
        None => format!("//{}", url.trim_start_matches('/')),
    }
}

/// Config text routing `namespace` to the registry and authenticating with `token`.
pub fn render_registry_config(registry_url: &str, token: &str, namespace: &str) -> String {
    let url = normalized(registry_url);
    let prefix = auth_prefix(registry_url);
    let scope = format!("@{}", namespace.trim_start_matches('@'));
    format!(
        "{scope}:registry={url}\n{prefix}:_authToken={token}\n{prefix}:always-auth=true\n"
    )
}

/// Write `<target_dir>/.npmrc`, first copying any existing file to a timestamped backup.
pub fn write_registry_config(
    target_dir: &Path,
    registry_url: &str,
    token: &str,
    namespace: &str,
) -> Result<WrittenConfig, RegistryError> {
    let path = target_dir.join(REGISTRY_CONFIG_FILE);
    let context = || WriteConfigSnafu { path: path.clone() };

    let backup = if path.exists() {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
        let backup = target_dir.join(format!("{REGISTRY_CONFIG_FILE}.backup-{stamp}"));
        std::fs::copy(&path, &backup).with_context(|_| context())?;
        tracing::info!("Backed up {} to {}", path.display(), backup.display());
        Some(backup)
    } else {
        None
    };

    let content = render_registry_config(registry_url, token, namespace);
    let mut tmp = tempfile::NamedTempFile::new_in(target_dir).with_context(|_| context())?;
    tmp.write_all(content.as_bytes()).with_context(|_| context())?;
    restrict_permissions(tmp.path()).with_context(|_| context())?;
    tmp.persist(&path)
        .map_err(|e| e.error)
        .with_context(|_| context())?;

    Ok(WrittenConfig { path, backup })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
