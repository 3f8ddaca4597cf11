//! Errors raised while persisting the resolutions table (spec §6).

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolutionsError>;

#[derive(Error, Debug)]
pub enum ResolutionsError {
    #[error("i/o error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("could not acquire exclusive lock on {path}: {source}")]
    Lock { path: PathBuf, source: std::io::Error },

    #[error("malformed resolutions file at {path}: {message}")]
    InvalidJson { path: PathBuf, message: String },
}

impl ResolutionsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

impl From<ResolutionsError> for gitsu_core::Error {
    fn from(err: ResolutionsError) -> Self {
        match err {
            ResolutionsError::InvalidJson { path, message } => {
                gitsu_core::Error::InvalidManifest { path: Some(path), message }
            }
            other => gitsu_core::Error::Resolution { message: other.to_string() },
        }
    }
}
