// ABOUTME: Bounded number of modules deployed at once within a batch.
// ABOUTME: Values outside 1..=3 are rejected to respect provider rate limits.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConcurrencyError {
    #[error("concurrency must be a whole number, got {0:?}")]
    NotANumber(String),

    #[error("concurrency must be between 1 and 3, got {0}")]
    OutOfRange(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency(usize);

impl Concurrency {
    pub const MIN: usize = 1;
    pub const MAX: usize = 3;

    pub fn new(value: usize) -> Result<Self, ConcurrencyError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConcurrencyError::OutOfRange(value))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self(2)
    }
}

impl FromStr for Concurrency {
    type Err = ConcurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: usize = s
            .trim()
            .parse()
            .map_err(|_| ConcurrencyError::NotANumber(s.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
