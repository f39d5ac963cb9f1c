// ABOUTME: Application-wide error types for deckhand.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::publish::PublishError;
use crate::registry::RegistryError;
use crate::types::{ConcurrencyError, StageNameError};
use crate::validate::PrerequisiteError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid stage: {0}")]
    InvalidStage(#[from] StageNameError),

    #[error("invalid concurrency: {0}")]
    InvalidConcurrency(#[from] ConcurrencyError),

    #[error("prerequisite check failed: {0}")]
    Prerequisite(#[from] PrerequisiteError),

    #[error("no deployable modules found under {0}")]
    NoModules(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("{0}")]
    Hook(String),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
