// ABOUTME: Aggregates per-module outcomes into a run summary.
// ABOUTME: Renders the human report, the JSON view, records for persistence, and the run status.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use crate::deploy::{DeployOutcome, FailureCategory};
use crate::state::{DeploymentRecord, StageState};
use crate::types::{ModuleName, StageName};

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    /// Every attempted module deployed, or nothing needed deploying.
    Succeeded,
    /// At least one module failed.
    SomeFailed,
}

impl RunStatus {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Succeeded => 0,
            RunStatus::SomeFailed => 1,
        }
    }
}

/// Everything that happened in one run against one stage.
#[derive(Debug, Clone)]
pub struct Summary {
    pub stage: StageName,
    pub outcomes: Vec<DeployOutcome>,
    /// Modules skipped because nothing changed.
    pub unchanged: Vec<ModuleName>,
    pub elapsed: Duration,
}

impl Summary {
    pub fn from_outcomes(
        stage: StageName,
        outcomes: Vec<DeployOutcome>,
        unchanged: Vec<ModuleName>,
        elapsed: Duration,
    ) -> Self {
        Self {
            stage,
            outcomes,
            unchanged,
            elapsed,
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &DeployOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &DeployOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn endpoint_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.endpoints().len()).sum()
    }

    pub fn failures_by_category(&self) -> BTreeMap<FailureCategory, usize> {
        let mut counts = BTreeMap::new();
        for failure in self.outcomes.iter().filter_map(DeployOutcome::failure) {
            *counts.entry(failure.category).or_insert(0) += 1;
        }
        counts
    }

    pub fn status(&self) -> RunStatus {
        if self.failed().next().is_some() {
            RunStatus::SomeFailed
        } else {
            RunStatus::Succeeded
        }
    }

    /// New records for modules that deployed successfully. Failed modules get
    /// none, so their previous record stays in place.
    pub fn records(&self, deployed_by: Option<&str>) -> Vec<(ModuleName, DeploymentRecord)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| {
                let success = outcome.success()?;
                Some((
                    outcome.module.clone(),
                    DeploymentRecord {
                        deployed_at: success.deployed_at,
                        source_revision: success.source_revision.clone(),
                        content_fingerprint: success.content_fingerprint.clone(),
                        stage: outcome.stage.clone(),
                        deployed_by: deployed_by.map(String::from),
                    },
                ))
            })
            .collect()
    }

    /// Overlay this run's successful records onto `state`.
    pub fn merge_into(&self, state: &mut StageState, deployed_by: Option<&str>) -> usize {
        let records = self.records(deployed_by);
        let count = records.len();
        state.extend(records);
        count
    }

    /// Human-readable report. Always succeeds, including for an empty run.
    pub fn render(&self) -> String {
        let mut out = String::new();

        if self.outcomes.is_empty() {
            if self.unchanged.is_empty() {
                let _ = writeln!(out, "No modules to deploy for stage {}", self.stage);
            } else {
                let _ = writeln!(
                    out,
                    "Nothing to deploy for stage {}: {} module(s) unchanged",
                    self.stage,
                    self.unchanged.len()
                );
            }
            return out;
        }

        let _ = writeln!(out, "Deployment summary for stage {}", self.stage);

        for outcome in self.succeeded() {
            let version = outcome
                .success()
                .and_then(|s| s.short_version())
                .map(|v| format!(" @ {v}"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  ✓ {}{} ({:.1}s)",
                outcome.module,
                version,
                outcome.duration.as_secs_f64()
            );
            for endpoint in outcome.endpoints() {
                let _ = writeln!(out, "      {endpoint}");
            }
        }

        for outcome in self.failed() {
            if let Some(failure) = outcome.failure() {
                let _ = writeln!(
                    out,
                    "  ✗ {} ({:.1}s) [{}] {}",
                    outcome.module,
                    outcome.duration.as_secs_f64(),
                    failure.category,
                    failure.message
                );
                let _ = writeln!(out, "      hint: {}", failure.category.hint());
            }
        }

        if !self.unchanged.is_empty() {
            let names: Vec<&str> = self.unchanged.iter().map(ModuleName::as_str).collect();
            let _ = writeln!(out, "  unchanged: {}", names.join(", "));
        }

        let _ = writeln!(
            out,
            "Deployed {}, failed {}, unchanged {} in {:.1}s; {} endpoint(s)",
            self.succeeded().count(),
            self.failed().count(),
            self.unchanged.len(),
            self.elapsed.as_secs_f64(),
            self.endpoint_count()
        );

        let by_category = self.failures_by_category();
        if !by_category.is_empty() {
            let parts: Vec<String> = by_category
                .iter()
                .map(|(category, count)| format!("{category} {count}"))
                .collect();
            let _ = writeln!(out, "Failures by category: {}", parts.join(", "));
        }

        out
    }

    /// Machine-readable view for `--json` output.
    pub fn json(&self) -> SummaryJson<'_> {
        SummaryJson {
            event: "summary",
            stage: &self.stage,
            status: self.status(),
            succeeded: self.succeeded().count(),
            failed: self.failed().count(),
            unchanged: &self.unchanged,
            endpoint_count: self.endpoint_count(),
            duration_secs: self.elapsed.as_secs_f64(),
            failures_by_category: self.failures_by_category(),
            outcomes: &self.outcomes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryJson<'a> {
    event: &'static str,
    stage: &'a StageName,
    status: RunStatus,
    succeeded: usize,
    failed: usize,
    unchanged: &'a [ModuleName],
    endpoint_count: usize,
    duration_secs: f64,
    failures_by_category: BTreeMap<FailureCategory, usize>,
    outcomes: &'a [DeployOutcome],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::{DeployFailure, DeploySuccess, OutcomeResult};
    use chrono::Utc;

    fn stage() -> StageName {
        StageName::new("dev").unwrap()
    }

    fn deployed(name: &str, endpoints: &[&str]) -> DeployOutcome {
        DeployOutcome {
            module: ModuleName::new(name).unwrap(),
            stage: stage(),
            duration: Duration::from_millis(1200),
            result: OutcomeResult::Deployed(DeploySuccess {
                endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
                source_revision: Some("abc123".to_string()),
                content_fingerprint: Some("f00d".to_string()),
                deployed_at: Utc::now(),
            }),
        }
    }

    fn failed(name: &str, message: &str) -> DeployOutcome {
        DeployOutcome {
            module: ModuleName::new(name).unwrap(),
            stage: stage(),
            duration: Duration::from_millis(800),
            result: OutcomeResult::Failed(DeployFailure::new(message, None)),
        }
    }

    #[test]
    fn empty_run_renders_and_succeeds() {
        let summary = Summary::from_outcomes(stage(), vec![], vec![], Duration::ZERO);

        assert!(summary.render().contains("No modules to deploy"));
        assert_eq!(summary.status(), RunStatus::Succeeded);
        assert_eq!(summary.status().exit_code(), 0);
    }

    #[test]
    fn all_unchanged_renders_nothing_to_deploy() {
        let summary = Summary::from_outcomes(
            stage(),
            vec![],
            vec![ModuleName::new("orders").unwrap()],
            Duration::ZERO,
        );
        assert!(summary.render().contains("1 module(s) unchanged"));
    }

    #[test]
    fn counts_and_categories() {
        let summary = Summary::from_outcomes(
            stage(),
            vec![
                deployed("orders", &["https://a.example.com", "https://b.example.com"]),
                failed("billing", "The security token included in the request is invalid"),
                failed("jobs", "Missing credentials in config"),
                failed("search", "no idea"),
            ],
            vec![],
            Duration::from_secs(5),
        );

        assert_eq!(summary.succeeded().count(), 1);
        assert_eq!(summary.failed().count(), 3);
        assert_eq!(summary.endpoint_count(), 2);
        assert_eq!(summary.status(), RunStatus::SomeFailed);
        assert_eq!(summary.status().exit_code(), 1);

        let categories = summary.failures_by_category();
        assert_eq!(categories.get(&FailureCategory::Credentials), Some(&2));
        assert_eq!(categories.get(&FailureCategory::Unknown), Some(&1));

        let text = summary.render();
        assert!(text.contains("✓ orders"));
        assert!(text.contains("✗ billing"));
        assert!(text.contains("https://a.example.com"));
        assert!(text.contains("Failures by category: credentials 2, unknown 1"));
    }

    fn deployed_with(name: &str, revision: Option<&str>, fingerprint: Option<&str>) -> DeployOutcome {
        let mut outcome = deployed(name, &[]);
        if let OutcomeResult::Deployed(success) = &mut outcome.result {
            success.source_revision = revision.map(String::from);
            success.content_fingerprint = fingerprint.map(String::from);
        }
        outcome
    }

    #[test]
    fn success_lines_show_the_deployed_version() {
        let summary = Summary::from_outcomes(
            stage(),
            vec![
                deployed_with("orders", Some("4f2a9c1e8b7d6a5f"), Some("cafe")),
                deployed_with("billing", None, Some("9e107d9d372bb6826bd81d3542a419d6")),
                deployed_with("jobs", None, None),
            ],
            vec![],
            Duration::ZERO,
        );

        let text = summary.render();
        assert!(text.contains("✓ orders @ 4f2a9c1 (1.2s)"), "{text}");
        assert!(text.contains("✓ billing @ 9e107d9d372b (1.2s)"), "{text}");
        assert!(text.contains("✓ jobs (1.2s)"), "{text}");
    }

    #[test]
    fn merge_keeps_previous_record_of_failed_module() {
        let old = DeploymentRecord {
            deployed_at: Utc::now(),
            source_revision: Some("old".to_string()),
            content_fingerprint: Some("old".to_string()),
            stage: stage(),
            deployed_by: None,
        };
        let mut state = StageState::new();
        state.insert(ModuleName::new("billing").unwrap(), old.clone());

        let summary = Summary::from_outcomes(
            stage(),
            vec![deployed("orders", &[]), failed("billing", "boom")],
            vec![],
            Duration::ZERO,
        );
        let merged = summary.merge_into(&mut state, Some("builder-01"));

        assert_eq!(merged, 1);
        assert_eq!(state[&ModuleName::new("billing").unwrap()], old);
        let new = &state[&ModuleName::new("orders").unwrap()];
        assert_eq!(new.source_revision.as_deref(), Some("abc123"));
        assert_eq!(new.content_fingerprint.as_deref(), Some("f00d"));
        assert_eq!(new.deployed_by.as_deref(), Some("builder-01"));
    }

    #[test]
    fn json_view_carries_status_and_outcomes() {
        let summary = Summary::from_outcomes(
            stage(),
            vec![failed("billing", "boom")],
            vec![ModuleName::new("orders").unwrap()],
            Duration::ZERO,
        );

        let json = serde_json::to_value(summary.json()).unwrap();
        assert_eq!(json["status"], "some-failed");
        assert_eq!(json["unchanged"][0], "orders");
        assert_eq!(json["outcomes"][0]["module"], "billing");
        assert_eq!(json["failures_by_category"]["unknown"], 1);
    }
}
