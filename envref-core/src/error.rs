//! Error types for envref operations

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EnvRefError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Config already exists at {}", .0.display())]
    ConfigExists(PathBuf),

    #[error("Glob pattern error in '{pattern}': {message}")]
    GlobPattern { pattern: String, message: String },

    #[error("Project root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EnvRefError {
    pub(crate) fn glob(pattern: &str, err: impl std::fmt::Display) -> Self {
        Self::GlobPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        }
    }

    /// True for errors caused by user-supplied configuration rather than the environment.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse(_) | Self::ConfigExists(_) | Self::GlobPattern { .. }
        )
    }
}
