// ABOUTME: Diagnostics accumulator for non-fatal warnings during a run.
// ABOUTME: Collects warnings that shouldn't fail a deployment but should be shown to users.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether a warning of the given kind was recorded.
    pub fn has(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn state_load(message: impl Into<String>) -> Self {
        Self::new(WarningKind::StateLoad, message)
    }

    pub fn state_save(message: impl Into<String>) -> Self {
        Self::new(WarningKind::StateSave, message)
    }

    pub fn fingerprint_skipped(message: impl Into<String>) -> Self {
        Self::new(WarningKind::FingerprintSkipped, message)
    }

    pub fn tool_version(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ToolVersion, message)
    }

    pub fn tool_login(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ToolLogin, message)
    }

    pub fn hook(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Hook, message)
    }

    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Deployment state could not be read; treated as empty.
    StateLoad,
    /// Deployment state could not be written; this run's progress is not recorded.
    StateSave,
    /// Part of a module tree was unreadable while fingerprinting.
    FingerprintSkipped,
    /// Deployment tool is older than the supported minimum.
    ToolVersion,
    /// Deployment tool login failed; an existing session may still work.
    ToolLogin,
    /// A non-fatal lifecycle hook failed.
    Hook,
}
