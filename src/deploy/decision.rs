// ABOUTME: Decides whether a module needs redeploying to a stage, and why.
// ABOUTME: Content stages compare fingerprints; revision stages diff source history.

use serde::Serialize;
use std::fmt;

use crate::config::ChangeDetection;
use crate::discovery::Module;
use crate::fingerprint::{self, ExclusionList, Fingerprint, RevisionControl};
use crate::state::DeploymentRecord;

/// Why a module was or was not selected for deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionReason {
    /// Change detection bypassed by `--force`.
    Forced,
    /// No record of a successful deployment to this stage.
    FirstDeployment,
    /// The current source revision could not be determined.
    NoRevisionControl,
    /// Recorded revision equals the current one.
    SameRevision,
    /// Files under the module changed between the recorded and current revision.
    RevisionChanges,
    /// Revisions differ but nothing under the module changed.
    NoRevisionChanges,
    /// The recorded revision is missing or history could not be compared.
    RevisionHistoryUnavailable,
    /// Content fingerprint differs from the recorded one.
    ContentChanges,
    /// Content fingerprint matches the recorded one.
    NoContentChanges,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Forced => "forced",
            DecisionReason::FirstDeployment => "first-deployment",
            DecisionReason::NoRevisionControl => "no-revision-control",
            DecisionReason::SameRevision => "same-revision",
            DecisionReason::RevisionChanges => "revision-changes",
            DecisionReason::NoRevisionChanges => "no-revision-changes",
            DecisionReason::RevisionHistoryUnavailable => "revision-history-unavailable",
            DecisionReason::ContentChanges => "content-changes",
            DecisionReason::NoContentChanges => "no-content-changes",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one module.
#[derive(Debug, Clone)]
pub struct Decision {
    pub deploy: bool,
    pub reason: DecisionReason,
    /// Fingerprint computed while deciding, if the strategy needed one.
    pub fingerprint: Option<Fingerprint>,
}

impl Decision {
    fn deploy(reason: DecisionReason) -> Self {
        Self {
            deploy: true,
            reason,
            fingerprint: None,
        }
    }

    fn skip(reason: DecisionReason) -> Self {
        Self {
            deploy: false,
            reason,
            fingerprint: None,
        }
    }

    fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }
}

/// Change-detection policy for one stage within one run.
///
/// Apart from the fingerprint or revision lookups it performs, deciding has no
/// side effects, so re-evaluating after a partial run is always safe.
pub struct DecisionPolicy<'a> {
    detection: ChangeDetection,
    current_revision: Option<String>,
    revisions: &'a dyn RevisionControl,
    exclusions: &'a ExclusionList,
    force: bool,
}

impl<'a> DecisionPolicy<'a> {
    pub fn new(
        detection: ChangeDetection,
        current_revision: Option<String>,
        revisions: &'a dyn RevisionControl,
        exclusions: &'a ExclusionList,
    ) -> Self {
        Self {
            detection,
            current_revision,
            revisions,
            exclusions,
            force: false,
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub async fn decide(&self, module: &Module, previous: Option<&DeploymentRecord>) -> Decision {
        if self.force {
            return Decision::deploy(DecisionReason::Forced);
        }

        let Some(previous) = previous else {
            return Decision::deploy(DecisionReason::FirstDeployment);
        };

        match self.detection {
            ChangeDetection::Revision => self.decide_by_revision(module, previous).await,
            ChangeDetection::Content => self.decide_by_content(module, previous).await,
        }
    }

    async fn decide_by_revision(&self, module: &Module, previous: &DeploymentRecord) -> Decision {
        let Some(current) = self.current_revision.as_deref() else {
            return Decision::deploy(DecisionReason::NoRevisionControl);
        };

        let Some(recorded) = previous.source_revision.as_deref() else {
            return Decision::deploy(DecisionReason::RevisionHistoryUnavailable);
        };

        if recorded == current {
            return Decision::skip(DecisionReason::SameRevision);
        }

        match self
            .revisions
            .changed_files(recorded, current, &module.path)
            .await
        {
            Ok(changed) if changed.is_empty() => Decision::skip(DecisionReason::NoRevisionChanges),
            Ok(changed) => {
                tracing::debug!(
                    "{}: {} file(s) changed since {}",
                    module.name,
                    changed.len(),
                    recorded
                );
                Decision::deploy(DecisionReason::RevisionChanges)
            }
            Err(e) => {
                tracing::debug!("{}: cannot compare revisions: {}", module.name, e);
                Decision::deploy(DecisionReason::RevisionHistoryUnavailable)
            }
        }
    }

    async fn decide_by_content(&self, module: &Module, previous: &DeploymentRecord) -> Decision {
        let current = fingerprint::compute(&module.path, self.exclusions).await;

        let decision = if previous.content_fingerprint.as_deref() == Some(current.digest.as_str()) {
            Decision::skip(DecisionReason::NoContentChanges)
        } else {
            Decision::deploy(DecisionReason::ContentChanges)
        };

        decision.with_fingerprint(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_render_in_kebab_case() {
        assert_eq!(DecisionReason::FirstDeployment.to_string(), "first-deployment");
        assert_eq!(DecisionReason::NoContentChanges.as_str(), "no-content-changes");
        assert_eq!(
            serde_json::to_string(&DecisionReason::RevisionChanges).unwrap(),
            "\"revision-changes\""
        );
    }
}
