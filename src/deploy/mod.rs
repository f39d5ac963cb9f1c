// ABOUTME: Incremental deployment: per-module decisions, batched execution, and outcomes.
// ABOUTME: DeploymentManager ties change detection, the deploy action, and state together.

mod decision;
mod endpoints;
mod error;
mod executor;
mod failure;
mod manager;
mod outcome;
mod serverless;

pub use decision::{Decision, DecisionPolicy, DecisionReason};
pub use endpoints::extract_endpoints;
pub use error::DeployError;
pub use executor::{BatchExecutor, DEFAULT_PACING};
pub use failure::FailureCategory;
pub use manager::{DeployTarget, DeploymentManager, ModuleDecision, Plan};
pub use outcome::{DeployFailure, DeployOutcome, DeploySuccess, OUTPUT_EXCERPT_LIMIT, OutcomeResult};
pub use serverless::{DeployReceipt, Deployer, ServerlessDeployer};
