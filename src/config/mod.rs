// ABOUTME: Configuration types and parsing for deckhand.yml.
// ABOUTME: Handles YAML parsing, defaults, and the explicit stage-to-strategy mapping.

mod deserialize;
pub mod env;
mod init;
mod registry;
mod stage;
mod tool;

pub use env::EnvSnapshot;
pub use init::init_config;
pub use registry::RegistryConfig;
pub use stage::{ChangeDetection, CredentialPolicy, StageConfig};
pub use tool::ToolConfig;

use crate::error::{Error, Result};
use crate::fingerprint::ExclusionList;
use crate::types::StageName;
use deserialize::deserialize_directories;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "deckhand.yml";
pub const CONFIG_FILENAME_ALT: &str = "deckhand.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".deckhand/config.yml";

pub const DEFAULT_STATE_FILE: &str = ".deckhand/deployment-state.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    #[serde(default = "default_stages")]
    pub stages: BTreeMap<StageName, StageConfig>,

    #[serde(default = "default_stage")]
    pub default_stage: StageName,

    #[serde(default = "default_pacing", with = "humantime_serde")]
    pub pacing: Duration,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub registry: Option<RegistryConfig>,
}

/// Where deployable modules live inside the workspace.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(
        default = "default_directories",
        deserialize_with = "deserialize_directories"
    )]
    pub directories: NonEmpty<PathBuf>,

    /// File whose presence marks a directory as a deployable module.
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            directories: default_directories(),
            manifest: default_manifest(),
        }
    }
}

fn default_directories() -> NonEmpty<PathBuf> {
    NonEmpty {
        head: PathBuf::from("functions"),
        tail: vec![PathBuf::from("services")],
    }
}

fn default_manifest() -> String {
    "serverless.yml".to_string()
}

fn default_exclude() -> Vec<String> {
    [
        "node_modules",
        ".git",
        ".serverless",
        ".esbuild",
        ".webpack",
        "*.log",
        ".env.local",
        "*.local.*",
        ".DS_Store",
        "Thumbs.db",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_stages() -> BTreeMap<StageName, StageConfig> {
    let mut stages = BTreeMap::new();
    stages.insert(stage_name("dev"), StageConfig::fast_iteration());
    stages.insert(stage_name("prod"), StageConfig::production_like());
    stages
}

fn default_stage() -> StageName {
    stage_name("dev")
}

fn stage_name(name: &str) -> StageName {
    StageName::new(name).expect("built-in stage names are valid")
}

fn default_pacing() -> Duration {
    crate::deploy::DEFAULT_PACING
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            exclude: default_exclude(),
            stages: default_stages(),
            default_stage: default_stage(),
            pacing: default_pacing(),
            state_file: default_state_file(),
            tool: ToolConfig::default(),
            registry: None,
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("Loading configuration from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like [`Config::discover`], but falls back to built-in defaults when no
    /// configuration file exists. Parse errors are still reported.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => {
                tracing::debug!("No configuration file in {}, using defaults", dir.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    fn check(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one stage must be configured".to_string(),
            ));
        }
        if !self.stages.contains_key(&self.default_stage) {
            return Err(Error::InvalidConfig(format!(
                "default_stage '{}' is not one of the configured stages",
                self.default_stage
            )));
        }
        if self.discovery.manifest.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "discovery.manifest cannot be empty".to_string(),
            ));
        }
        self.exclusions()?;
        Ok(())
    }

    pub fn stage(&self, name: &StageName) -> Option<&StageConfig> {
        self.stages.get(name)
    }

    pub fn exclusions(&self) -> Result<ExclusionList> {
        ExclusionList::new(&self.exclude).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Absolute location of the deployment state document.
    pub fn state_path(&self, workspace: &Path) -> PathBuf {
        if self.state_file.is_absolute() {
            self.state_file.clone()
        } else {
            workspace.join(&self.state_file)
        }
    }

    pub fn registry(&self) -> Result<&RegistryConfig> {
        self.registry.as_ref().ok_or_else(|| {
            Error::InvalidConfig("a 'registry' section is required for this command".to_string())
        })
    }

    pub fn template() -> Self {
        let mut config = Self::default();
        config.registry = Some(RegistryConfig::template());
        config
    }
}
