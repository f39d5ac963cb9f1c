// ABOUTME: Enumerates deployable modules inside a workspace.
// ABOUTME: A module is a child directory of a search directory that contains the manifest file.

use std::path::{Path, PathBuf};

use crate::config::DiscoveryConfig;
use crate::types::ModuleName;

/// An independently deployable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: ModuleName,
    pub path: PathBuf,
}

impl Module {
    pub fn new(name: ModuleName, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
        }
    }
}

/// Discover modules under `workspace`.
///
/// Search directories are visited in configured order and their children in
/// name order, so the result is stable across runs. Missing or unreadable
/// search directories contribute nothing. An empty result is not an error
/// here; the caller decides whether that is fatal.
pub fn discover(workspace: &Path, config: &DiscoveryConfig) -> Vec<Module> {
    let mut modules = Vec::new();

    for dir in config.directories.iter() {
        let search_dir = workspace.join(dir);
        let entries = match std::fs::read_dir(&search_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", search_dir.display(), e);
                continue;
            }
        };

        let mut children: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.join(&config.manifest).is_file())
            .collect();
        children.sort();

        for path in children {
            let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::debug!("Skipping non UTF-8 module directory {}", path.display());
                continue;
            };
            match ModuleName::new(dir_name) {
                Ok(name) => modules.push(Module::new(name, path)),
                Err(e) => tracing::debug!("Skipping {}: {}", path.display(), e),
            }
        }
    }

    tracing::debug!("Discovered {} module(s)", modules.len());
    modules
}
