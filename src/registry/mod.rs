// ABOUTME: Private package registry collaborators: provisioning, credentials, client config.
// ABOUTME: Traits at the seams; the concrete client drives the AWS CLI and never speaks HTTP itself.

mod codeartifact;
mod error;
mod npmrc;

pub use codeartifact::{AwsCodeArtifact, MAX_TOKEN_TTL, MIN_TOKEN_TTL};
pub use error::{RegistryError, RegistryErrorKind};
pub use npmrc::{REGISTRY_CONFIG_FILE, WrittenConfig, auth_prefix, render_registry_config, write_registry_config};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

use crate::config::RegistryConfig;

/// Outcome of an idempotent "ensure" call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

impl fmt::Display for Provisioned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provisioned::Created => f.write_str("created"),
            Provisioned::AlreadyExists => f.write_str("already exists"),
        }
    }
}

/// Short-lived registry credential.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Creates registry resources. Every call is idempotent.
#[async_trait]
pub trait RegistryProvisioner: Send + Sync {
    async fn ensure_domain(&self, domain: &str) -> Result<Provisioned, RegistryError>;

    async fn ensure_repository(
        &self,
        domain: &str,
        repository: &str,
    ) -> Result<Provisioned, RegistryError>;

    async fn ensure_external_connection(
        &self,
        domain: &str,
        repository: &str,
        upstream: &str,
    ) -> Result<Provisioned, RegistryError>;
}

/// Issues credentials and resolves the registry endpoint.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn authorization_token(
        &self,
        domain: &str,
        ttl: Duration,
    ) -> Result<AuthToken, RegistryError>;

    async fn registry_endpoint(
        &self,
        domain: &str,
        repository: &str,
        format: &str,
    ) -> Result<String, RegistryError>;
}

/// Make sure the domain, the repository, and the upstream connection (when one
/// is configured) exist, in that order. Returns what each step found.
pub async fn ensure_registry(
    provisioner: &dyn RegistryProvisioner,
    config: &RegistryConfig,
) -> Result<Vec<(String, Provisioned)>, RegistryError> {
    let mut steps = Vec::with_capacity(3);

    let status = provisioner.ensure_domain(&config.domain).await?;
    steps.push((format!("domain {}", config.domain), status));

    let status = provisioner
        .ensure_repository(&config.domain, &config.repository)
        .await?;
    steps.push((format!("repository {}", config.repository), status));

    if let Some(upstream) = &config.upstream {
        let status = provisioner
            .ensure_external_connection(&config.domain, &config.repository, upstream)
            .await?;
        steps.push((format!("upstream {upstream}"), status));
    }

    Ok(steps)
}
