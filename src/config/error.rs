//! Configuration Error Types
//!
//! Raised before any network call is made. Validation gathers every problem
//! it finds so a broken `.env` is fixed in one pass.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// One missing or invalid field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProblem {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for ConfigProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// An explicitly requested file does not exist
    #[error("configuration file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The `.env` file exists but could not be parsed
    #[error("failed to load env file '{}': {error}", path.display())]
    EnvFile { path: PathBuf, error: String },

    /// The layered sources could not be merged or deserialized
    #[error("failed to read configuration sources: {0}")]
    Source(String),

    /// One or more fields are missing or invalid
    #[error("invalid configuration: {}", format_problems(problems))]
    Invalid { problems: Vec<ConfigProblem> },
}

fn format_problems(problems: &[ConfigProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigurationError {
    pub fn problems(&self) -> &[ConfigProblem] {
        match self {
            Self::Invalid { problems } => problems,
            _ => &[],
        }
    }

    /// Whether `field` is among the reported problems
    pub fn mentions(&self, field: &str) -> bool {
        self.problems().iter().any(|p| p.field == field)
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        Self::Source(error.to_string())
    }
}
