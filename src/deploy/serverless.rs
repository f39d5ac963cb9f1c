// ABOUTME: Deploy action that shells out to the serverless CLI for one module.
// ABOUTME: Runs in the module directory with credentials passed explicitly to the child.

use async_trait::async_trait;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;

use super::endpoints::extract_endpoints;
use super::error::DeployError;
use crate::config::EnvSnapshot;
use crate::discovery::Module;
use crate::types::StageName;
use crate::validate::{ToolError, ToolProbe};

/// What a successful deployment reported.
#[derive(Debug, Clone, Default)]
pub struct DeployReceipt {
    pub endpoints: Vec<String>,
    /// Combined stdout and stderr of the tool.
    pub output: String,
}

/// Deploys one module to one stage.
#[async_trait]
pub trait Deployer: Send + Sync {
    async fn deploy(&self, module: &Module, stage: &StageName) -> Result<DeployReceipt, DeployError>;
}

/// [`Deployer`] backed by `<command> deploy --stage <stage> --region <region>`.
#[derive(Debug, Clone)]
pub struct ServerlessDeployer {
    command: String,
    env: EnvSnapshot,
}

impl ServerlessDeployer {
    pub fn new(command: impl Into<String>, env: EnvSnapshot) -> Self {
        Self {
            command: command.into(),
            env,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn deploy_args(&self, stage: &StageName) -> Vec<String> {
        let mut args = vec![
            "deploy".to_string(),
            "--stage".to_string(),
            stage.to_string(),
        ];
        if let Some(region) = &self.env.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        args
    }

    async fn run(&self, args: &[String], dir: Option<&Path>) -> std::io::Result<Output> {
        let mut cmd = Command::new(&self.command);
        cmd.args(args)
            .envs(self.env.child_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        cmd.output().await
    }

    fn probe_failed(&self, action: &'static str, output: &Output) -> ToolError {
        ToolError::Failed {
            tool: self.command.clone(),
            action,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

fn combined(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }
    text
}

#[async_trait]
impl Deployer for ServerlessDeployer {
    async fn deploy(&self, module: &Module, stage: &StageName) -> Result<DeployReceipt, DeployError> {
        let args = self.deploy_args(stage);
        tracing::debug!(
            "{}: running {} {} in {}",
            module.name,
            self.command,
            args.join(" "),
            module.path.display()
        );

        let output = self
            .run(&args, Some(&module.path))
            .await
            .map_err(|source| DeployError::Spawn {
                tool: self.command.clone(),
                source,
            })?;
        let text = combined(&output);

        if !output.status.success() {
            return Err(DeployError::ToolFailed {
                tool: self.command.clone(),
                status: output.status.to_string(),
                output: text,
            });
        }

        Ok(DeployReceipt {
            endpoints: extract_endpoints(&text),
            output: text,
        })
    }
}

#[async_trait]
impl ToolProbe for ServerlessDeployer {
    fn name(&self) -> &str {
        &self.command
    }

    async fn version(&self) -> Result<String, ToolError> {
        let output = self
            .run(&["--version".to_string()], None)
            .await
            .map_err(|source| ToolError::Spawn {
                tool: self.command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(self.probe_failed("--version", &output));
        }
        Ok(combined(&output))
    }

    async fn login(&self) -> Result<(), ToolError> {
        let output = self
            .run(&["login".to_string()], None)
            .await
            .map_err(|source| ToolError::Spawn {
                tool: self.command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(self.probe_failed("login", &output));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_is_passed_when_known() {
        let env = EnvSnapshot {
            region: Some("eu-west-1".to_string()),
            ..Default::default()
        };
        let deployer = ServerlessDeployer::new("serverless", env);

        assert_eq!(
            deployer.deploy_args(&StageName::new("prod").unwrap()),
            vec!["deploy", "--stage", "prod", "--region", "eu-west-1"]
        );
    }

    #[test]
    fn region_is_omitted_when_unknown() {
        let deployer = ServerlessDeployer::new("serverless", EnvSnapshot::default());
        assert_eq!(
            deployer.deploy_args(&StageName::new("dev").unwrap()),
            vec!["deploy", "--stage", "dev"]
        );
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let deployer = ServerlessDeployer::new(
            "deckhand-test-no-such-binary",
            EnvSnapshot::default(),
        );
        let module = Module::new(
            crate::types::ModuleName::new("orders").unwrap(),
            std::env::temp_dir(),
        );

        let err = deployer
            .deploy(&module, &StageName::new("dev").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Spawn { .. }));
    }
}
