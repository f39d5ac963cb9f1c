// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles discovery directory lists and semantic versions.

use nonempty::NonEmpty;
use semver::Version;
use serde::Deserialize;
use std::path::PathBuf;

pub fn deserialize_directories<'de, D>(deserializer: D) -> Result<NonEmpty<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<PathBuf> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one discovery directory is required"))
}

pub fn deserialize_version<'de, D>(deserializer: D) -> Result<Version, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.trim().trim_start_matches('v');
    // Accept shorthand like "4" or "4.1".
    let padded = match s.matches('.').count() {
        0 => format!("{s}.0.0"),
        1 => format!("{s}.0"),
        _ => s.to_string(),
    };
    Version::parse(&padded).map_err(serde::de::Error::custom)
}
