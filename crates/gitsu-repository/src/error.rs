//! Errors a [`crate::Fetcher`] can report back to the Fetch Coordinator.

use std::path::PathBuf;
use thiserror::Error;

/// A fetch failure, propagated into `gitsu_resolver::Error` at the boundary.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The source did not resolve to anything.
    #[error("source not found: {endpoint}")]
    NotFound {
        /// The endpoint's `source` string.
        endpoint: String,
    },

    /// The requested target does not exist at the source.
    #[error("target '{target}' not found at {endpoint}")]
    TargetNotFound {
        /// The endpoint's `source` string.
        endpoint: String,
        /// The requested target.
        target: String,
    },

    /// The materialized directory has no readable manifest, or it is not
    /// valid JSON.
    #[error("could not read manifest at {path}: {message}")]
    InvalidManifest {
        /// Path to the manifest that failed to parse.
        path: PathBuf,
        /// Underlying error description.
        message: String,
    },

    /// Filesystem failure while materializing the source.
    #[error("io error fetching {source}: {inner}")]
    Io {
        /// The endpoint's `source` string.
        source: String,
        /// Underlying IO error.
        #[source]
        inner: std::io::Error,
    },
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

impl From<RepositoryError> for gitsu_core::Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { endpoint } => Self::EndpointNotFound { name: endpoint },
            RepositoryError::TargetNotFound { endpoint, target } => Self::VersionNotSatisfied {
                name: endpoint,
                constraint: target,
            },
            RepositoryError::InvalidManifest { path, message } => Self::InvalidManifest {
                path: Some(path),
                message,
            },
            RepositoryError::Io { source, inner } => Self::io(PathBuf::from(source), inner),
        }
    }
}
