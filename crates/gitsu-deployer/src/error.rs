//! Errors raised while materializing elected endpoints on disk.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("elected endpoint for '{rid}' has no canonicalDir (fetch did not complete)")]
    MissingCanonicalDir { rid: String },

    #[error("invalid manifest at {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    #[error("hook '{name}' failed: {message}")]
    Hook { name: String, message: String },
}

impl DeployError {
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

impl From<DeployError> for gitsu_core::Error {
    fn from(err: DeployError) -> Self {
        match err {
            DeployError::Io { path, source } => Self::io(path, source),
            DeployError::InvalidManifest { path, message } => {
                Self::InvalidManifest { path: Some(path), message }
            }
            DeployError::MissingCanonicalDir { rid } => Self::EndpointNotFound { name: rid },
            DeployError::Hook { name, message } => {
                Self::InvalidManifest { path: None, message: format!("{name}: {message}") }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
