// ABOUTME: Settings for the external serverless deployment tool.
// ABOUTME: Command name, minimum compatible version, and authentication behaviour.

use super::deserialize::deserialize_version;
use semver::Version;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_command")]
    pub command: String,

    /// Older versions only produce a warning.
    #[serde(default = "default_min_version", deserialize_with = "deserialize_version")]
    pub min_version: Version,

    /// Whether the tool needs its own access key (SERVERLESS_ACCESS_KEY).
    #[serde(default = "default_true")]
    pub require_access_key: bool,

    /// Run `<command> login` before deploying.
    #[serde(default)]
    pub login: bool,
}

fn default_command() -> String {
    "serverless".to_string()
}

fn default_min_version() -> Version {
    Version::new(4, 0, 0)
}

fn default_true() -> bool {
    true
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            min_version: default_min_version(),
            require_access_key: true,
            login: false,
        }
    }
}
