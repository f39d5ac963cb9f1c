// ABOUTME: Change detection for modules: content fingerprints and revision diffs.
// ABOUTME: Fingerprints hash sorted (path, bytes) pairs so enumeration order never matters.

mod exclude;
mod revision;

pub use exclude::{ExclusionError, ExclusionList};
pub use revision::{GitRevisions, RevisionControl, RevisionError};

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Deterministic digest over a module's included files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// Lowercase hex SHA-256.
    pub digest: String,
    /// Relative paths (with `/` separators) that fed the digest, in hash order.
    pub files: Vec<String>,
    /// Directories or files that could not be read and were left out.
    pub skipped: Vec<PathBuf>,
}

impl Fingerprint {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Compute the content fingerprint of the tree rooted at `root`.
///
/// Unreadable subtrees are skipped rather than failing the computation; the
/// digest stays deterministic for a given filesystem state.
pub async fn compute(root: &Path, exclusions: &ExclusionList) -> Fingerprint {
    let (mut files, mut skipped) = collect_files(root, exclusions).await;
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Sha256::new();
    let mut included = Vec::with_capacity(files.len());

    for (relative, absolute) in files {
        match tokio::fs::read(&absolute).await {
            Ok(bytes) => {
                // Length prefixes keep path/content boundaries unambiguous.
                hasher.update((relative.len() as u64).to_le_bytes());
                hasher.update(relative.as_bytes());
                hasher.update((bytes.len() as u64).to_le_bytes());
                hasher.update(&bytes);
                included.push(relative);
            }
            Err(e) => {
                tracing::debug!("Skipping unreadable file {}: {}", absolute.display(), e);
                skipped.push(absolute);
            }
        }
    }

    Fingerprint {
        digest: format!("{:x}", hasher.finalize()),
        files: included,
        skipped,
    }
}

async fn collect_files(
    root: &Path,
    exclusions: &ExclusionList,
) -> (Vec<(String, PathBuf)>, Vec<PathBuf>) {
    let mut files = Vec::new();
    let mut skipped = Vec::new();
    let mut pending = vec![(root.to_path_buf(), String::new())];

    while let Some((dir, prefix)) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Skipping unreadable directory {}: {}", dir.display(), e);
                skipped.push(dir);
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!("Stopped reading {}: {}", dir.display(), e);
                    skipped.push(dir.clone());
                    break;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            let relative = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            let path = entry.path();

            let Ok(file_type) = entry.file_type().await else {
                skipped.push(path);
                continue;
            };

            if exclusions.is_excluded(Path::new(&relative), file_type.is_dir()) {
                continue;
            }

            if file_type.is_dir() {
                pending.push((path, relative));
            } else if file_type.is_file() {
                files.push((relative, path));
            } else if file_type.is_symlink() {
                // Symlinked files count, symlinked directories are not followed.
                if let Ok(meta) = tokio::fs::metadata(&path).await
                    && meta.is_file()
                {
                    files.push((relative, path));
                }
            }
        }
    }

    (files, skipped)
}
