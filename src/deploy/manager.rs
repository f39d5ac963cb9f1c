// ABOUTME: Orchestrates one incremental deployment run for a stage.
// ABOUTME: Loads state, decides per module, deploys changed modules in paced batches, records successes.

use chrono::Utc;
use std::time::Instant;

use super::decision::{DecisionPolicy, DecisionReason};
use super::executor::BatchExecutor;
use super::outcome::{DeployOutcome, DeploySuccess, OutcomeResult};
use super::serverless::Deployer;
use crate::config::StageConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::discovery::Module;
use crate::fingerprint::{self, ExclusionList, Fingerprint, RevisionControl};
use crate::output::Output;
use crate::report::Summary;
use crate::state::{StageState, StateStore};
use crate::types::{ModuleName, StageName};

/// Verdict for one discovered module.
#[derive(Debug, Clone)]
pub struct ModuleDecision {
    pub module: ModuleName,
    pub deploy: bool,
    pub reason: DecisionReason,
}

/// A module selected for deployment, with the provenance to record on success.
#[derive(Debug, Clone)]
pub struct DeployTarget {
    pub module: Module,
    pub fingerprint: String,
    pub revision: Option<String>,
}

/// Result of the decision phase; nothing has been deployed yet.
#[derive(Debug, Clone)]
pub struct Plan {
    pub state: StageState,
    pub decisions: Vec<ModuleDecision>,
    pub targets: Vec<DeployTarget>,
    pub revision: Option<String>,
}

impl Plan {
    pub fn unchanged(&self) -> Vec<ModuleName> {
        self.decisions
            .iter()
            .filter(|d| !d.deploy)
            .map(|d| d.module.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Incremental deployer for one stage.
pub struct DeploymentManager<'a> {
    stage: StageName,
    stage_config: StageConfig,
    exclusions: ExclusionList,
    store: StateStore,
    revisions: &'a dyn RevisionControl,
    deployer: &'a dyn Deployer,
    executor: BatchExecutor,
    force: bool,
    deployed_by: Option<String>,
}

impl<'a> DeploymentManager<'a> {
    pub fn new(
        stage: StageName,
        stage_config: StageConfig,
        store: StateStore,
        revisions: &'a dyn RevisionControl,
        deployer: &'a dyn Deployer,
        executor: BatchExecutor,
    ) -> Self {
        Self {
            stage,
            stage_config,
            exclusions: ExclusionList::default(),
            store,
            revisions,
            deployer,
            executor,
            force: false,
            deployed_by: None,
        }
    }

    pub fn exclusions(mut self, exclusions: ExclusionList) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Identity written into each new record.
    pub fn deployed_by(mut self, host: Option<String>) -> Self {
        self.deployed_by = host;
        self
    }

    pub fn stage(&self) -> &StageName {
        &self.stage
    }

    /// Decide which modules need deploying. Reads state but changes nothing.
    pub async fn plan(&self, modules: Vec<Module>, diag: &mut Diagnostics) -> Plan {
        let state = self.store.load(&self.stage, diag);
        let revision = self.revisions.current_revision().await;
        let policy = DecisionPolicy::new(
            self.stage_config.detection,
            revision.clone(),
            self.revisions,
            &self.exclusions,
        )
        .force(self.force);

        let mut decisions = Vec::with_capacity(modules.len());
        let mut targets = Vec::new();

        for module in modules {
            let decision = policy.decide(&module, state.get(&module.name)).await;
            tracing::info!(
                "{}: {} ({})",
                module.name,
                if decision.deploy { "deploy" } else { "skip" },
                decision.reason
            );

            decisions.push(ModuleDecision {
                module: module.name.clone(),
                deploy: decision.deploy,
                reason: decision.reason,
            });

            if decision.deploy {
                let fingerprint = match decision.fingerprint {
                    Some(fp) => fp,
                    None => fingerprint::compute(&module.path, &self.exclusions).await,
                };
                self.note_partial(&module, &fingerprint, diag);
                targets.push(DeployTarget {
                    module,
                    fingerprint: fingerprint.digest,
                    revision: revision.clone(),
                });
            }
        }

        Plan {
            state,
            decisions,
            targets,
            revision,
        }
    }

    fn note_partial(&self, module: &Module, fingerprint: &Fingerprint, diag: &mut Diagnostics) {
        if fingerprint.is_partial() {
            diag.warn(Warning::fingerprint_skipped(format!(
                "{}: {} unreadable path(s) left out of the content fingerprint",
                module.name,
                fingerprint.skipped.len()
            )));
        }
    }

    /// Deploy the plan's targets and persist records for the ones that succeed.
    ///
    /// State is written once, after every batch has settled, and only when at
    /// least one module succeeded.
    pub async fn execute(&self, plan: Plan, output: &Output, diag: &mut Diagnostics) -> Summary {
        let started = Instant::now();
        let unchanged = plan.unchanged();

        if !plan.targets.is_empty() {
            output.progress(&format!(
                "Deploying {} module(s) to {} in batches of {}",
                plan.targets.len(),
                self.stage,
                self.executor.concurrency()
            ));
        }

        let outcomes = self
            .executor
            .run(plan.targets, |target| self.deploy_one(target, output))
            .await;

        let summary =
            Summary::from_outcomes(self.stage.clone(), outcomes, unchanged, started.elapsed());

        if summary.succeeded().next().is_some() {
            let mut state = plan.state;
            summary.merge_into(&mut state, self.deployed_by.as_deref());
            self.store.save(&self.stage, &state, diag);
        }

        summary
    }

    /// Plan and execute in one step.
    pub async fn run(&self, modules: Vec<Module>, output: &Output, diag: &mut Diagnostics) -> Summary {
        let plan = self.plan(modules, diag).await;
        self.execute(plan, output, diag).await
    }

    async fn deploy_one(&self, target: DeployTarget, output: &Output) -> DeployOutcome {
        let started = Instant::now();
        let name = target.module.name.clone();
        output.progress(&format!("  → Deploying {name}..."));

        let result = match self.deployer.deploy(&target.module, &self.stage).await {
            Ok(receipt) => {
                output.progress(&format!(
                    "  ✓ {name} deployed ({} endpoint(s))",
                    receipt.endpoints.len()
                ));
                OutcomeResult::Deployed(DeploySuccess {
                    endpoints: receipt.endpoints,
                    source_revision: target.revision,
                    content_fingerprint: Some(target.fingerprint),
                    deployed_at: Utc::now(),
                })
            }
            Err(e) => {
                tracing::debug!("{}: deploy failed: {}", name, e);
                let failure = e.to_failure();
                output.progress(&format!("  ✗ {name} failed [{}]", failure.category));
                OutcomeResult::Failed(failure)
            }
        };

        DeployOutcome {
            module: name,
            stage: self.stage.clone(),
            duration: started.elapsed(),
            result,
        }
    }
}
