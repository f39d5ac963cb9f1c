// ABOUTME: Publishes a monorepo's packages to the private registry in dependency order.
// ABOUTME: A version that already exists counts as success; any other failure stops the run.

mod npm;
mod order;

pub use npm::NpmPublisher;
pub use order::{discover_packages, publish_order};

use async_trait::async_trait;
use std::path::PathBuf;

/// A publishable workspace package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    /// Names from dependencies, devDependencies and peerDependencies.
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    Published,
    /// This exact version is already in the registry.
    AlreadyExists,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid package manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("dependency cycle between packages: {}", packages.join(", "))]
    Cycle { packages: Vec<String> },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("failed to prepare publish credentials: {0}")]
    Credentials(std::io::Error),

    #[error("publishing {package} failed: {message}")]
    Failed { package: String, message: String },
}

/// Publishes one package directory.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        package: &Package,
        registry_url: &str,
        token: &str,
    ) -> Result<PublishStatus, PublishError>;
}

/// Result for one package of a publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub name: String,
    pub version: String,
    pub status: PublishStatus,
}

/// Publish `packages` in the given order, stopping at the first failure since
/// later packages may depend on the one that failed.
pub async fn publish_all(
    publisher: &dyn Publisher,
    packages: &[Package],
    registry_url: &str,
    token: &str,
) -> Result<Vec<Published>, PublishError> {
    let mut results = Vec::with_capacity(packages.len());

    for package in packages {
        let status = publisher.publish(package, registry_url, token).await?;
        match status {
            PublishStatus::Published => {
                tracing::info!("Published {}@{}", package.name, package.version)
            }
            PublishStatus::AlreadyExists => tracing::info!(
                "{}@{} already exists, skipping",
                package.name,
                package.version
            ),
        }
        results.push(Published {
            name: package.name.clone(),
            version: package.version.clone(),
            status,
        });
    }

    Ok(results)
}
