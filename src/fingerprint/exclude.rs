// ABOUTME: Exclusion filters applied while fingerprinting, with gitignore semantics.
// ABOUTME: Patterns are matched against paths relative to the module root.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
#[error("invalid exclude pattern {pattern:?}: {message}")]
pub struct ExclusionError {
    pub pattern: String,
    pub message: String,
}

/// Files and directories left out of content fingerprints.
///
/// A pattern without a slash (`node_modules`, `*.local.*`) matches at any
/// depth; one with a slash (`src/generated`) is anchored at the module root.
/// `!pattern` re-includes.
#[derive(Debug, Clone)]
pub struct ExclusionList {
    matcher: Gitignore,
}

impl Default for ExclusionList {
    fn default() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }
}

impl ExclusionList {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ExclusionError> {
        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            let pattern = pattern.as_ref();
            builder
                .add_line(None, pattern)
                .map_err(|e| ExclusionError {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
        }
        let matcher = builder.build().map_err(|e| ExclusionError {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            message: e.to_string(),
        })?;
        Ok(Self { matcher })
    }

    /// Whether `relative` (a path under the module root) is excluded.
    pub fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        self.matcher.matched(relative, is_dir).is_ignore()
    }
}
