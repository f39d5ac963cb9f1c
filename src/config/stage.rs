// ABOUTME: Per-stage policy: which change detection and which credential shape apply.
// ABOUTME: Makes the fast-iteration vs production-like split an explicit mapping.

use serde::Deserialize;

/// How a stage decides whether a module changed since its last deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeDetection {
    /// Compare a content fingerprint of the module directory.
    #[default]
    Content,
    /// Compare source revisions and diff the module path between them.
    Revision,
}

/// Which credential sources are acceptable for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialPolicy {
    /// An access key / secret key pair is required.
    Keys,
    /// A key pair or a named credential profile.
    #[default]
    KeysOrProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct StageConfig {
    #[serde(default)]
    pub detection: ChangeDetection,

    #[serde(default)]
    pub credentials: CredentialPolicy,
}

impl StageConfig {
    pub fn fast_iteration() -> Self {
        Self {
            detection: ChangeDetection::Content,
            credentials: CredentialPolicy::KeysOrProfile,
        }
    }

    pub fn production_like() -> Self {
        Self {
            detection: ChangeDetection::Revision,
            credentials: CredentialPolicy::Keys,
        }
    }
}
