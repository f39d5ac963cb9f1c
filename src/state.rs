// ABOUTME: Persistent per-stage record of each module's last successful deployment.
// ABOUTME: Loaded once per run, rewritten atomically once per run; I/O failures are warnings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::diagnostics::{Diagnostics, Warning};
use crate::types::{ModuleName, StageName};

/// Evidence of a module's last successful deployment to a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployed_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_revision: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_fingerprint: Option<String>,

    pub stage: StageName,

    /// Hostname of the machine that ran the deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_by: Option<String>,
}

/// Records for every module of one stage.
pub type StageState = BTreeMap<ModuleName, DeploymentRecord>;

/// The whole state file: stage name to that stage's records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateDocument {
    stages: BTreeMap<StageName, StageState>,
}

impl StateDocument {
    pub fn stage(&self, stage: &StageName) -> StageState {
        self.stages.get(stage).cloned().unwrap_or_default()
    }

    /// Replace one stage's records, leaving every other stage untouched.
    pub fn replace_stage(&mut self, stage: &StageName, state: StageState) {
        self.stages.insert(stage.clone(), state);
    }

    pub fn stages(&self) -> impl Iterator<Item = &StageName> {
        self.stages.keys()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed state file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize deployment state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// File-backed deployment state.
///
/// There is no locking: concurrent runs against the same file race and the
/// last writer wins.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full document. A missing file is an empty document.
    pub fn read_document(&self) -> Result<StateDocument, StateError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StateDocument::default());
            }
            Err(source) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(StateDocument::default());
        }

        serde_json::from_str(&content).map_err(|source| StateError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the file with `document` via a temp file in the same directory
    /// and a rename, so readers never observe a partial write.
    pub fn write_document(&self, document: &StateDocument) -> Result<(), StateError> {
        let write_err = |source| StateError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let json = serde_json::to_string_pretty(document)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        Ok(())
    }

    /// Records for `stage`. Never fails: unreadable state is reported and treated as empty.
    pub fn load(&self, stage: &StageName, diag: &mut Diagnostics) -> StageState {
        match self.read_document() {
            Ok(document) => document.stage(stage),
            Err(e) => {
                diag.warn(Warning::state_load(format!(
                    "Ignoring deployment state: {e}"
                )));
                StageState::new()
            }
        }
    }

    /// Persist `state` as the full record set for `stage`, preserving other stages.
    /// Failures are reported as warnings; deployment state is best-effort bookkeeping.
    pub fn save(&self, stage: &StageName, state: &StageState, diag: &mut Diagnostics) {
        let mut document = match self.read_document() {
            Ok(document) => document,
            Err(e) => {
                diag.warn(Warning::state_load(format!(
                    "Rewriting unreadable deployment state: {e}"
                )));
                StateDocument::default()
            }
        };

        document.replace_stage(stage, state.clone());

        match self.write_document(&document) {
            Ok(()) => tracing::debug!(
                "Saved {} record(s) for stage {} to {}",
                state.len(),
                stage,
                self.path.display()
            ),
            Err(e) => diag.warn(Warning::state_save(format!(
                "Deployment state not saved: {e}"
            ))),
        }
    }
}
