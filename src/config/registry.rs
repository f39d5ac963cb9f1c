// ABOUTME: Private package registry settings used by publish and configure.
// ABOUTME: Domain, repository, namespace scope, upstream connection, and token lifetime.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub domain: String,

    pub repository: String,

    /// Package scope served by the registry, e.g. `@acme`.
    pub namespace: String,

    /// Account that owns the domain, when it differs from the caller's.
    #[serde(default)]
    pub domain_owner: Option<String>,

    /// Public upstream to connect, e.g. `public:npmjs`.
    #[serde(default)]
    pub upstream: Option<String>,

    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub token_ttl: Duration,

    #[serde(default = "default_packages_dir")]
    pub packages_dir: PathBuf,
}

fn default_format() -> String {
    "npm".to_string()
}

fn default_token_ttl() -> Duration {
    Duration::from_secs(12 * 60 * 60)
}

fn default_packages_dir() -> PathBuf {
    PathBuf::from("packages")
}

impl RegistryConfig {
    pub fn template() -> Self {
        Self {
            domain: "my-domain".to_string(),
            repository: "my-packages".to_string(),
            namespace: "@my-org".to_string(),
            domain_owner: None,
            upstream: Some("public:npmjs".to_string()),
            format: default_format(),
            token_ttl: default_token_ttl(),
            packages_dir: default_packages_dir(),
        }
    }

    /// Namespace with exactly one leading `@`.
    pub fn scope(&self) -> String {
        format!("@{}", self.namespace.trim_start_matches('@'))
    }
}
