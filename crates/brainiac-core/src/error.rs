use std::path::PathBuf;
use thiserror::Error;

use crate::config_manager::ConfigError;

#[derive(Error, Debug)]
pub enum BrainiacError {
    #[error("Invalid input: {0}")]
    UserInput(String),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Metadata store at {path} is corrupt: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("File already exists: {path}")]
    FileConflict { path: PathBuf },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BrainiacError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors the user can fix by changing arguments or configuration
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::UserInput(_) | Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, BrainiacError>;
