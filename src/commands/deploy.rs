// ABOUTME: Deploy command implementation.
// ABOUTME: Validates prerequisites, plans, runs hooks around the batched deploy, and reports.

use crate::cli::DeployArgs;
use deckhand::config::{Config, EnvSnapshot};
use deckhand::deploy::{BatchExecutor, DeploymentManager, ServerlessDeployer};
use deckhand::diagnostics::Diagnostics;
use deckhand::discovery;
use deckhand::error::{Error, Result};
use deckhand::fingerprint::GitRevisions;
use deckhand::hooks::{HookContext, Hooks};
use deckhand::output::Output;
use deckhand::report::RunStatus;
use deckhand::state::StateStore;
use deckhand::types::{ModuleName, StageName};
use deckhand::validate::Validator;
use std::path::Path;

/// Deploy the workspace's changed modules to one stage.
pub async fn deploy(workspace: &Path, args: DeployArgs, mut output: Output) -> Result<RunStatus> {
    output.start_timer();
    let config = Config::discover_or_default(workspace)?;
    let stage = match args.stage.as_deref() {
        Some(name) => StageName::new(name)?,
        None => config.default_stage.clone(),
    };

    let env = EnvSnapshot::from_process();
    let deployer = ServerlessDeployer::new(config.tool.command.clone(), env.clone());
    let mut diag = Diagnostics::default();

    Validator::new(&config, &env, &deployer)
        .validate(&stage, &mut diag)
        .await?;
    let stage_config = config.stage(&stage).copied().unwrap_or_default();

    let modules = discovery::discover(workspace, &config.discovery);
    if modules.is_empty() {
        return Err(Error::NoModules(workspace.to_path_buf()));
    }
    output.progress(&format!(
        "Found {} module(s); checking for changes against stage {}",
        modules.len(),
        stage
    ));

    let revisions = GitRevisions::new(workspace);
    let manager = DeploymentManager::new(
        stage.clone(),
        stage_config,
        StateStore::new(config.state_path(workspace)),
        &revisions,
        &deployer,
        BatchExecutor::new(args.concurrency, config.pacing),
    )
    .exclusions(config.exclusions()?)
    .force(args.force)
    .deployed_by(gethostname::gethostname().into_string().ok());

    let plan = manager.plan(modules, &mut diag).await;

    let hooks = Hooks::discover(workspace);
    let targets: Vec<ModuleName> = plan.targets.iter().map(|t| t.module.name.clone()).collect();
    let context = HookContext::new(stage.clone(), targets, plan.revision.clone());

    if !plan.is_empty() {
        hooks.before_deploy(&context).await?;
    }

    let summary = manager.execute(plan, &output, &mut diag).await;
    hooks.after_deploy(&summary, context, &mut diag).await;

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
    output.summary(&summary);

    Ok(summary.status())
}
