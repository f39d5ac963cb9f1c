// ABOUTME: Per-module result of one deployment attempt.
// ABOUTME: Success carries endpoints and provenance; failure carries a categorized error.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

use super::failure::FailureCategory;
use crate::types::{ModuleName, StageName};

/// Characters of raw tool output kept with a failure.
pub const OUTPUT_EXCERPT_LIMIT: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    pub module: ModuleName,
    pub stage: StageName,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    #[serde(flatten)]
    pub result: OutcomeResult,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeResult {
    Deployed(DeploySuccess),
    Failed(DeployFailure),
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploySuccess {
    pub endpoints: Vec<String>,
    pub source_revision: Option<String>,
    pub content_fingerprint: Option<String>,
    pub deployed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeployFailure {
    pub message: String,
    pub category: FailureCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_excerpt: Option<String>,
}

impl DeploySuccess {
    /// Short label for what went out: the abbreviated source revision, or the
    /// head of the content fingerprint when no revision is known.
    pub fn short_version(&self) -> Option<String> {
        let (value, len) = match (&self.source_revision, &self.content_fingerprint) {
            (Some(rev), _) => (rev, 7),
            (None, Some(fp)) => (fp, 12),
            (None, None) => return None,
        };
        Some(value.chars().take(len).collect())
    }
}

impl DeployFailure {
    /// Build a failure from the error message and the raw tool output, if any.
    /// Both feed the category; only the first [`OUTPUT_EXCERPT_LIMIT`]
    /// characters of output are kept.
    pub fn new(message: impl Into<String>, output: Option<&str>) -> Self {
        let message = message.into();
        let category = match output {
            Some(out) => FailureCategory::classify(&format!("{message}\n{out}")),
            None => FailureCategory::classify(&message),
        };
        Self {
            message,
            category,
            output_excerpt: output
                .map(str::trim)
                .filter(|out| !out.is_empty())
                .map(excerpt),
        }
    }
}

fn excerpt(output: &str) -> String {
    output.chars().take(OUTPUT_EXCERPT_LIMIT).collect()
}

impl DeployOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.result, OutcomeResult::Deployed(_))
    }

    pub fn success(&self) -> Option<&DeploySuccess> {
        match &self.result {
            OutcomeResult::Deployed(success) => Some(success),
            OutcomeResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DeployFailure> {
        match &self.result {
            OutcomeResult::Deployed(_) => None,
            OutcomeResult::Failed(failure) => Some(failure),
        }
    }

    pub fn endpoints(&self) -> &[String] {
        self.success().map(|s| s.endpoints.as_slice()).unwrap_or(&[])
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
