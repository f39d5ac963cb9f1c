// ABOUTME: Pre-flight checks that gate a deployment run.
// ABOUTME: Credentials, region, tool access key, stage, tool presence, optional login; in that order.

use async_trait::async_trait;
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

use crate::config::{Config, CredentialPolicy, EnvSnapshot, env};
use crate::diagnostics::{Diagnostics, Warning};
use crate::types::StageName;

/// An unmet prerequisite. Each variant names what is missing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PrerequisiteError {
    #[error("{present} is set but {missing} is not; access keys must be provided as a pair")]
    IncompleteKeyPair {
        present: &'static str,
        missing: &'static str,
    },

    #[error("no credentials for stage {stage}: set {} and {}{}", env::ACCESS_KEY_ID, env::SECRET_ACCESS_KEY, profile_hint(policy))]
    MissingCredentials {
        stage: StageName,
        policy: CredentialPolicy,
    },

    #[error("stage {stage} requires explicit access keys; {} alone is not accepted", env::PROFILE)]
    ProfileNotAllowed { stage: StageName },

    #[error("no region configured: set {} or {}", env::REGION, env::DEFAULT_REGION)]
    MissingRegion,

    #[error("{} is required by the deployment tool", env::TOOL_ACCESS_KEY)]
    MissingToolAccessKey,

    #[error("unknown stage {stage} (configured: {known})")]
    UnknownStage { stage: StageName, known: String },

    #[error("deployment tool {tool} is not available: {reason}")]
    ToolUnavailable { tool: String, reason: String },
}

fn profile_hint(policy: &CredentialPolicy) -> String {
    match policy {
        CredentialPolicy::Keys => String::new(),
        CredentialPolicy::KeysOrProfile => format!(", or {}", env::PROFILE),
    }
}

/// Errors from probing the deployment tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("{tool} {action} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        action: &'static str,
        status: String,
        stderr: String,
    },
}

/// Read-only questions asked of the deployment tool before a run.
#[async_trait]
pub trait ToolProbe: Send + Sync {
    /// Tool name for messages.
    fn name(&self) -> &str;

    /// Raw output of the tool's version command.
    async fn version(&self) -> Result<String, ToolError>;

    /// Authenticate the tool's own session.
    async fn login(&self) -> Result<(), ToolError>;
}

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid version regex"));

/// First `major.minor.patch` in `text`, if any.
pub fn parse_version(text: &str) -> Option<Version> {
    let caps = VERSION.captures(text)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

/// Runs the ordered prerequisite checks for one stage.
pub struct Validator<'a> {
    config: &'a Config,
    env: &'a EnvSnapshot,
    tool: &'a dyn ToolProbe,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a Config, env: &'a EnvSnapshot, tool: &'a dyn ToolProbe) -> Self {
        Self { config, env, tool }
    }

    /// Check everything needed to deploy to `stage`, stopping at the first unmet
    /// prerequisite. An outdated tool version or a failed login only warns.
    pub async fn validate(
        &self,
        stage: &StageName,
        diag: &mut Diagnostics,
    ) -> Result<(), PrerequisiteError> {
        self.check_credentials(stage)?;
        self.check_region()?;
        self.check_tool_access_key()?;
        self.check_stage(stage)?;
        self.check_tool(diag).await?;
        self.login(diag).await;
        Ok(())
    }

    fn check_credentials(&self, stage: &StageName) -> Result<(), PrerequisiteError> {
        // Unknown stages are reported later, once credentials look sane.
        let policy = self
            .config
            .stage(stage)
            .map(|s| s.credentials)
            .unwrap_or(CredentialPolicy::KeysOrProfile);

        let snapshot = self.env;
        match (&snapshot.access_key_id, &snapshot.secret_access_key) {
            (Some(_), Some(_)) => return Ok(()),
            (Some(_), None) => {
                return Err(PrerequisiteError::IncompleteKeyPair {
                    present: env::ACCESS_KEY_ID,
                    missing: env::SECRET_ACCESS_KEY,
                });
            }
            (None, Some(_)) => {
                return Err(PrerequisiteError::IncompleteKeyPair {
                    present: env::SECRET_ACCESS_KEY,
                    missing: env::ACCESS_KEY_ID,
                });
            }
            (None, None) => {}
        }

        match (policy, &snapshot.profile) {
            (CredentialPolicy::KeysOrProfile, Some(_)) => Ok(()),
            (CredentialPolicy::Keys, Some(_)) => Err(PrerequisiteError::ProfileNotAllowed {
                stage: stage.clone(),
            }),
            (policy, None) => Err(PrerequisiteError::MissingCredentials {
                stage: stage.clone(),
                policy,
            }),
        }
    }

    fn check_region(&self) -> Result<(), PrerequisiteError> {
        match self.env.region {
            Some(_) => Ok(()),
            None => Err(PrerequisiteError::MissingRegion),
        }
    }

    fn check_tool_access_key(&self) -> Result<(), PrerequisiteError> {
        if self.config.tool.require_access_key && self.env.tool_access_key.is_none() {
            return Err(PrerequisiteError::MissingToolAccessKey);
        }
        Ok(())
    }

    fn check_stage(&self, stage: &StageName) -> Result<(), PrerequisiteError> {
        if self.config.stage(stage).is_some() {
            return Ok(());
        }
        let known = self
            .config
            .stages
            .keys()
            .map(StageName::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Err(PrerequisiteError::UnknownStage {
            stage: stage.clone(),
            known,
        })
    }

    async fn check_tool(&self, diag: &mut Diagnostics) -> Result<(), PrerequisiteError> {
        let output = self
            .tool
            .version()
            .await
            .map_err(|e| PrerequisiteError::ToolUnavailable {
                tool: self.tool.name().to_string(),
                reason: e.to_string(),
            })?;

        let minimum = &self.config.tool.min_version;
        match parse_version(&output) {
            Some(version) if version < *minimum => diag.warn(Warning::tool_version(format!(
                "{} {} is older than the supported minimum {}",
                self.tool.name(),
                version,
                minimum
            ))),
            Some(version) => tracing::debug!("{} version {}", self.tool.name(), version),
            None => diag.warn(Warning::tool_version(format!(
                "Could not determine {} version from {:?}",
                self.tool.name(),
                output.trim()
            ))),
        }

        Ok(())
    }

    async fn login(&self, diag: &mut Diagnostics) {
        if !self.config.tool.login {
            return;
        }
        if let Err(e) = self.tool.login().await {
            diag.warn(Warning::tool_login(format!(
                "{} login failed, continuing with any existing session: {e}",
                self.tool.name()
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_versions_out_of_banner_text() {
        assert_eq!(
            parse_version("Serverless ϟ Framework 4.4.18"),
            Some(Version::new(4, 4, 18))
        );
        assert_eq!(
            parse_version("Framework Core: 3.38.0\nPlugin: 7.2.0"),
            Some(Version::new(3, 38, 0))
        );
        assert_eq!(parse_version("no version here"), None);
    }

    #[test]
    fn missing_credentials_message_mentions_profile_only_when_allowed() {
        let stage = StageName::new("prod").unwrap();
        let keys = PrerequisiteError::MissingCredentials {
            stage: stage.clone(),
            policy: CredentialPolicy::Keys,
        };
        assert!(!keys.to_string().contains(env::PROFILE));

        let either = PrerequisiteError::MissingCredentials {
            stage,
            policy: CredentialPolicy::KeysOrProfile,
        };
        assert!(either.to_string().contains(env::PROFILE));
    }
}
