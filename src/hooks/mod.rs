// ABOUTME: Workspace lifecycle scripts under .deckhand/hooks, run around a deployment.
// ABOUTME: pre-deploy gates the run; post-deploy or on-error reports on its result.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::report::{RunStatus, Summary};
use crate::types::{ModuleName, StageName};

const HOOKS_DIR: &str = ".deckhand/hooks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookPoint {
    PreDeploy,
    PostDeploy,
    OnError,
}

impl HookPoint {
    pub const ALL: [HookPoint; 3] = [HookPoint::PreDeploy, HookPoint::PostDeploy, HookPoint::OnError];

    pub fn script_name(self) -> &'static str {
        match self {
            HookPoint::PreDeploy => "pre-deploy",
            HookPoint::PostDeploy => "post-deploy",
            HookPoint::OnError => "on-error",
        }
    }

    /// The point that reports on a finished run.
    pub fn after(status: RunStatus) -> Self {
        match status {
            RunStatus::Succeeded => HookPoint::PostDeploy,
            RunStatus::SomeFailed => HookPoint::OnError,
        }
    }
}

/// What a hook script learns about the run, exported as `DECKHAND_*` variables.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub stage: StageName,
    pub targets: Vec<ModuleName>,
    pub revision: Option<String>,
    pub failed: Vec<ModuleName>,
}

impl HookContext {
    pub fn new(stage: StageName, targets: Vec<ModuleName>, revision: Option<String>) -> Self {
        Self {
            stage,
            targets,
            revision,
            failed: Vec::new(),
        }
    }

    pub fn with_failed(mut self, failed: Vec<ModuleName>) -> Self {
        self.failed = failed;
        self
    }

    pub fn env(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![
            ("DECKHAND_STAGE", self.stage.to_string()),
            ("DECKHAND_MODULES", comma_list(&self.targets)),
        ];
        if let Some(revision) = &self.revision {
            vars.push(("DECKHAND_REVISION", revision.clone()));
        }
        if !self.failed.is_empty() {
            vars.push(("DECKHAND_FAILED", comma_list(&self.failed)));
        }
        vars
    }
}

fn comma_list(names: &[ModuleName]) -> String {
    names
        .iter()
        .map(ModuleName::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug)]
pub enum HookOutcome {
    Passed { stdout: String },
    Failed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The script exists but could not be started (not executable, bad interpreter).
    NotStarted { reason: String },
}

impl HookOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, HookOutcome::Passed { .. })
    }

    pub fn stdout(&self) -> &str {
        match self {
            HookOutcome::Passed { stdout } | HookOutcome::Failed { stdout, .. } => stdout.as_str(),
            HookOutcome::NotStarted { .. } => "",
        }
    }

    /// One-line account of a failure, `None` when the hook passed.
    pub fn failure(&self, point: HookPoint) -> Option<String> {
        let name = point.script_name();
        match self {
            HookOutcome::Passed { .. } => None,
            HookOutcome::Failed {
                exit_code, stderr, ..
            } => {
                let status = exit_code
                    .map(|c| format!("exited with status {c}"))
                    .unwrap_or_else(|| "was killed by a signal".to_string());
                let detail = stderr.trim();
                Some(if detail.is_empty() {
                    format!("{name} hook {status}")
                } else {
                    format!("{name} hook {status}: {detail}")
                })
            }
            HookOutcome::NotStarted { reason } => {
                Some(format!("{name} hook could not be started: {reason}"))
            }
        }
    }
}

/// The hook scripts present in a workspace, found once at construction.
#[derive(Debug)]
pub struct Hooks {
    workspace: PathBuf,
    scripts: BTreeMap<HookPoint, PathBuf>,
}

impl Hooks {
    pub fn discover(workspace: &Path) -> Self {
        let dir = workspace.join(HOOKS_DIR);
        let scripts = HookPoint::ALL
            .into_iter()
            .map(|point| (point, dir.join(point.script_name())))
            .filter(|(_, path)| path.is_file())
            .collect::<BTreeMap<_, _>>();
        if !scripts.is_empty() {
            tracing::debug!(count = scripts.len(), dir = %dir.display(), "found hook scripts");
        }
        Self {
            workspace: workspace.to_path_buf(),
            scripts,
        }
    }

    pub fn has(&self, point: HookPoint) -> bool {
        self.scripts.contains_key(&point)
    }

    /// Run the script for `point` from the workspace root. `None` when absent.
    pub async fn run(&self, point: HookPoint, context: &HookContext) -> Option<HookOutcome> {
        let script = self.scripts.get(&point)?;
        tracing::info!(hook = point.script_name(), "running hook");

        let output = Command::new(script)
            .current_dir(&self.workspace)
            .envs(context.env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let outcome = match output {
            Err(e) => HookOutcome::NotStarted {
                reason: e.to_string(),
            },
            Ok(out) => {
                let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
                if out.status.success() {
                    HookOutcome::Passed { stdout }
                } else {
                    HookOutcome::Failed {
                        exit_code: out.status.code(),
                        stdout,
                        stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                    }
                }
            }
        };
        match outcome.failure(point) {
            Some(message) => tracing::warn!("{message}"),
            None => tracing::info!(hook = point.script_name(), "hook passed"),
        }
        Some(outcome)
    }

    /// Runs pre-deploy; a failing script stops the run before anything deploys.
    pub async fn before_deploy(&self, context: &HookContext) -> Result<()> {
        match self.run(HookPoint::PreDeploy, context).await {
            Some(outcome) => match outcome.failure(HookPoint::PreDeploy) {
                Some(message) => Err(Error::Hook(message)),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }

    /// Runs post-deploy or on-error for a run that attempted something.
    /// A failing script only adds a warning.
    pub async fn after_deploy(&self, summary: &Summary, context: HookContext, diag: &mut Diagnostics) {
        if summary.outcomes.is_empty() {
            return;
        }
        let status = summary.status();
        let point = HookPoint::after(status);
        let context = match status {
            RunStatus::Succeeded => context,
            RunStatus::SomeFailed => {
                context.with_failed(summary.failed().map(|o| o.module.clone()).collect())
            }
        };
        if let Some(message) = self
            .run(point, &context)
            .await
            .and_then(|outcome| outcome.failure(point))
        {
            diag.warn(Warning::hook(message));
        }
    }
}
