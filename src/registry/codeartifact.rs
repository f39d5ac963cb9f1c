// ABOUTME: Registry provisioning and credentials via the `aws codeartifact` CLI.
// ABOUTME: Conflicts on create calls are reported as AlreadyExists; responses are parsed as JSON.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use snafu::ResultExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::error::{ResponseSnafu, SpawnSnafu};
use super::{AuthToken, Provisioned, RegistryError, RegistryProvisioner, TokenIssuer};
use crate::config::EnvSnapshot;

/// Shortest token lifetime the service accepts.
pub const MIN_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);
/// Longest token lifetime the service accepts.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Client for a CodeArtifact domain, driven through the AWS CLI.
#[derive(Debug, Clone)]
pub struct AwsCodeArtifact {
    program: String,
    env: EnvSnapshot,
    domain_owner: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    authorization_token: String,
    #[serde(default)]
    expiration: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointResponse {
    repository_endpoint: String,
}

impl AwsCodeArtifact {
    pub fn new(env: EnvSnapshot) -> Self {
        Self {
            program: "aws".to_string(),
            env,
            domain_owner: None,
        }
    }

    /// Use a different CLI binary.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Account that owns the domain, when it differs from the caller's.
    pub fn domain_owner(mut self, owner: Option<String>) -> Self {
        self.domain_owner = owner;
        self
    }

    fn args(&self, operation: &str, domain: &str, extra: &[(&str, &str)]) -> Vec<String> {
        let mut args = vec![
            "codeartifact".to_string(),
            operation.to_string(),
            "--domain".to_string(),
            domain.to_string(),
        ];
        if let Some(owner) = &self.domain_owner
            && operation != "create-domain"
        {
            args.push("--domain-owner".to_string());
            args.push(owner.clone());
        }
        for (flag, value) in extra {
            args.push(format!("--{flag}"));
            args.push(value.to_string());
        }
        args.push("--output".to_string());
        args.push("json".to_string());
        args
    }

    async fn call(&self, operation: &'static str, args: Vec<String>) -> Result<String, RegistryError> {
        tracing::debug!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .envs(self.env.child_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context(SpawnSnafu {
                program: self.program.clone(),
            })?;

        if !output.status.success() {
            return Err(RegistryError::Rejected {
                operation,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn ensure(
        &self,
        operation: &'static str,
        args: Vec<String>,
    ) -> Result<Provisioned, RegistryError> {
        match self.call(operation, args).await {
            Ok(_) => Ok(Provisioned::Created),
            Err(e) if e.is_conflict() => Ok(Provisioned::AlreadyExists),
            Err(e) => Err(e),
        }
    }
}

/// Clamp a requested lifetime into the range the service accepts.
fn clamp_ttl(ttl: Duration) -> Duration {
    ttl.clamp(MIN_TOKEN_TTL, MAX_TOKEN_TTL)
}

fn parse_token(json: &str, now: DateTime<Utc>, ttl: Duration) -> Result<AuthToken, RegistryError> {
    let response: TokenResponse = serde_json::from_str(json).context(ResponseSnafu {
        operation: "get-authorization-token",
    })?;

    let expires_at = response
        .expiration
        .as_deref()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| now + chrono::Duration::seconds(ttl.as_secs() as i64));

    Ok(AuthToken {
        token: response.authorization_token,
        expires_at,
    })
}

fn parse_endpoint(json: &str) -> Result<String, RegistryError> {
    let response: EndpointResponse = serde_json::from_str(json).context(ResponseSnafu {
        operation: "get-repository-endpoint",
    })?;
    Ok(response.repository_endpoint)
}

#[async_trait]
impl RegistryProvisioner for AwsCodeArtifact {
    async fn ensure_domain(&self, domain: &str) -> Result<Provisioned, RegistryError> {
        self.ensure("create-domain", self.args("create-domain", domain, &[]))
            .await
    }

    async fn ensure_repository(
        &self,
        domain: &str,
        repository: &str,
    ) -> Result<Provisioned, RegistryError> {
        let args = self.args("create-repository", domain, &[("repository", repository)]);
        self.ensure("create-repository", args).await
    }

    async fn ensure_external_connection(
        &self,
        domain: &str,
        repository: &str,
        upstream: &str,
    ) -> Result<Provisioned, RegistryError> {
        let args = self.args(
            "associate-external-connection",
            domain,
            &[("repository", repository), ("external-connection", upstream)],
        );
        self.ensure("associate-external-connection", args).await
    }
}

#[async_trait]
impl TokenIssuer for AwsCodeArtifact {
    async fn authorization_token(
        &self,
        domain: &str,
        ttl: Duration,
    ) -> Result<AuthToken, RegistryError> {
        let ttl = clamp_ttl(ttl);
        let seconds = ttl.as_secs().to_string();
        let args = self.args(
            "get-authorization-token",
            domain,
            &[("duration-seconds", seconds.as_str())],
        );
        let json = self.call("get-authorization-token", args).await?;
        parse_token(&json, Utc::now(), ttl)
    }

    async fn registry_endpoint(
        &self,
        domain: &str,
        repository: &str,
        format: &str,
    ) -> Result<String, RegistryError> {
        let args = self.args(
            "get-repository-endpoint",
            domain,
            &[("repository", repository), ("format", format)],
        );
        let json = self.call("get-repository-endpoint", args).await?;
        parse_endpoint(&json)
    }
}
