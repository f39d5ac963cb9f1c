// ABOUTME: Validated deployment stage identifier (e.g. dev, prod).
// ABOUTME: Stages partition the deployment state and select change detection.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StageNameError {
    #[error("stage name cannot be empty")]
    Empty,

    #[error("stage name exceeds maximum length of 64 characters")]
    TooLong,

    #[error("stage name must start with a letter")]
    InvalidStart,

    #[error("invalid character in stage name: {0:?}")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StageName(String);

impl StageName {
    pub fn new(value: &str) -> Result<Self, StageNameError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(StageNameError::Empty);
        }

        if value.len() > 64 {
            return Err(StageNameError::TooLong);
        }

        if !value.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(StageNameError::InvalidStart);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
                return Err(StageNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for StageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StageName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        StageName::new(&value).map_err(serde::de::Error::custom)
    }
}
