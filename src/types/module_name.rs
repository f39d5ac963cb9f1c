// ABOUTME: Validated name of an independently deployable module.
// ABOUTME: Names come from directory names and key the persisted deployment state.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

const MAX_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum ModuleNameError {
    #[error("module name cannot be empty")]
    Empty,

    #[error("module name exceeds maximum length of {MAX_LEN} characters")]
    TooLong,

    #[error("module name cannot be '.' or '..'")]
    Reserved,

    #[error("invalid character in module name: {0:?}")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(value: &str) -> Result<Self, ModuleNameError> {
        if value.is_empty() {
            return Err(ModuleNameError::Empty);
        }

        if value.len() > MAX_LEN {
            return Err(ModuleNameError::TooLong);
        }

        if value == "." || value == ".." {
            return Err(ModuleNameError::Reserved);
        }

        if let Some(c) = value
            .chars()
            .find(|c| *c == '/' || *c == '\\' || c.is_control() || c.is_whitespace())
        {
            return Err(ModuleNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ModuleName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ModuleName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        ModuleName::new(&value).map_err(serde::de::Error::custom)
    }
}
