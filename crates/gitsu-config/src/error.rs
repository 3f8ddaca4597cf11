//! Error type for configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that can occur while loading or validating a [`crate::Config`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The given path exists but isn't valid JSON.
    #[error("invalid JSON in {path}: {message}")]
    InvalidJson {
        /// File path.
        path: PathBuf,
        /// Underlying parse error.
        message: String,
    },

    /// A recognized option held a value of the wrong shape.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Reading a config file failed for a reason other than "not found".
    #[error("could not read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Wrap an IO error with the path that produced it.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON parse error with the path that produced it.
    #[must_use]
    pub fn json(path: impl Into<PathBuf>, err: &sonic_rs::Error) -> Self {
        Self::InvalidJson {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for gitsu_core::Error {
    fn from(err: ConfigError) -> Self {
        Self::InvalidManifest {
            path: None,
            message: err.to_string(),
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
