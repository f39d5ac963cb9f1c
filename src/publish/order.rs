// ABOUTME: Finds workspace packages and orders them so dependencies publish first.
// ABOUTME: Kahn's algorithm with ties broken by discovery order; cycles are errors.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{Package, PublishError};

const MANIFEST: &str = "package.json";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    name: String,
    version: String,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, serde_json::Value>,
}

/// Packages in `<dir>/*/package.json`, in directory-name order. Private packages are skipped.
pub fn discover_packages(dir: &Path) -> Result<Vec<Package>, PublishError> {
    let read_err = |source| PublishError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut children = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.join(MANIFEST).is_file() {
            children.push(path);
        }
    }
    children.sort();

    let mut packages = Vec::with_capacity(children.len());
    for path in children {
        let manifest_path = path.join(MANIFEST);
        let content = std::fs::read_to_string(&manifest_path).map_err(|source| {
            PublishError::Read {
                path: manifest_path.clone(),
                source,
            }
        })?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|source| PublishError::Manifest {
                path: manifest_path.clone(),
                source,
            })?;

        if manifest.private {
            tracing::debug!("Skipping private package {}", manifest.name);
            continue;
        }

        let dependencies = manifest
            .dependencies
            .into_keys()
            .chain(manifest.dev_dependencies.into_keys())
            .chain(manifest.peer_dependencies.into_keys())
            .collect();

        packages.push(Package {
            name: manifest.name,
            version: manifest.version,
            path,
            dependencies,
        });
    }

    Ok(packages)
}

/// Order packages so each comes after the workspace packages it depends on.
/// Among packages that are ready at the same time, earlier discovery wins.
pub fn publish_order(packages: Vec<Package>) -> Result<Vec<Package>, PublishError> {
    let index: BTreeMap<&str, usize> = packages
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.as_str(), i))
        .collect();

    let mut pending: Vec<usize> = vec![0; packages.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); packages.len()];
    for (i, package) in packages.iter().enumerate() {
        let mut seen = Vec::new();
        for dep in &package.dependencies {
            if let Some(&j) = index.get(dep.as_str())
                && j != i
                && !seen.contains(&j)
            {
                seen.push(j);
                pending[i] += 1;
                dependents[j].push(i);
            }
        }
    }

    let mut done = vec![false; packages.len()];
    let mut order = Vec::with_capacity(packages.len());
    while let Some(next) = (0..packages.len()).find(|&i| !done[i] && pending[i] == 0) {
        done[next] = true;
        order.push(next);
        for &d in &dependents[next] {
            pending[d] -= 1;
        }
    }

    if order.len() < packages.len() {
        let packages = packages
            .iter()
            .enumerate()
            .filter(|(i, _)| !done[*i])
            .map(|(_, p)| p.name.clone())
            .collect();
        return Err(PublishError::Cycle { packages });
    }

    let mut slots: Vec<Option<Package>> = packages.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}
