//! Shared error taxonomy for the gitsu engine.
//!
//! Each variant carries a stable [`ErrorCode`] so operators can grep logs
//! for a specific failure class. Crate-specific errors (`gitsu-resolver`,
//! `gitsu-deployer`) define their own `thiserror` enums for conditions
//! local to that stage and convert into this type at the boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes, grouped by the stage that raises them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Package not found by any configured resolver.
    E0101,
    /// No version satisfies the requested constraint.
    E0102,
    /// Malformed package/endpoint name.
    E0104,
    /// Dependency resolution failed for an unclassified reason.
    E0201,
    /// Circular dependency detected while walking the endpoint graph.
    E0202,
    /// Conflicting version requirements the resolver could not elect.
    E0203,
    /// `gitsu.json` could not be parsed.
    E0401,
    /// `gitsu.json` is missing a field the engine needs.
    E0402,
    /// JSON syntax error.
    E0403,
    /// Expected file or directory not present.
    E0501,
    /// Filesystem permission denied.
    E0502,
    /// Destination path already exists unexpectedly.
    E0505,
}

impl ErrorCode {
    /// Stable string form, e.g. `"E0101"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0104 => "E0104",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0203 => "E0203",
            Self::E0401 => "E0401",
            Self::E0402 => "E0402",
            Self::E0403 => "E0403",
            Self::E0501 => "E0501",
            Self::E0502 => "E0502",
            Self::E0505 => "E0505",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The shared gitsu error type.
#[derive(Error, Debug)]
pub enum Error {
    /// A requested package could not be found by the external resolver.
    #[error("[{}] endpoint '{name}' could not be resolved", ErrorCode::E0101)]
    EndpointNotFound {
        /// The requested logical name or source.
        name: String,
    },

    /// No candidate version satisfies a stored or requested constraint.
    #[error("[{}] no version of '{name}' satisfies '{constraint}'", ErrorCode::E0102)]
    VersionNotSatisfied {
        /// Logical package id.
        name: String,
        /// The constraint that could not be satisfied.
        constraint: String,
    },

    /// An endpoint source or name failed validation.
    #[error("[{}] invalid endpoint: {message}", ErrorCode::E0104)]
    InvalidEndpoint {
        /// Explanation.
        message: String,
    },

    /// Generic resolution failure, carrying a human-readable explanation.
    #[error("[{}] resolution failed: {message}", ErrorCode::E0201)]
    Resolution {
        /// Explanation.
        message: String,
    },

    /// A cycle was detected while traversing the endpoint dependency graph.
    #[error("[{}] circular dependency: {path}", ErrorCode::E0202)]
    CircularDependency {
        /// Human-readable cycle path, e.g. `a -> b -> a`.
        path: String,
    },

    /// Two or more endpoints require incompatible revisions of the same
    /// logical package and no resolution strategy applied.
    #[error("[{}] conflicting versions for '{rid}'", ErrorCode::E0203)]
    Conflict {
        /// Logical package id in conflict.
        rid: String,
        /// The candidate targets that could not be reconciled.
        candidates: Vec<String>,
    },

    /// `gitsu.json` failed to parse or is structurally invalid.
    #[error("[{}] invalid manifest at {path:?}: {message}", ErrorCode::E0401)]
    InvalidManifest {
        /// Manifest path, if known.
        path: Option<PathBuf>,
        /// Explanation.
        message: String,
    },

    /// A required manifest field was absent.
    #[error("[{}] manifest missing required field '{field}'", ErrorCode::E0402)]
    MissingField {
        /// The missing field's name.
        field: String,
    },

    /// JSON could not be parsed.
    #[error("[{code}] json error: {0}", code = ErrorCode::E0403)]
    Json(#[from] sonic_rs::Error),

    /// Underlying filesystem I/O error, annotated with the path involved.
    #[error("[{code}] io error at {path}: {source}")]
    Io {
        /// Error code (E0501/E0502/E0505 depending on `source.kind()`).
        code: ErrorCode,
        /// Path the operation was attempted against.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an [`std::io::Error`], classifying it by [`std::io::ErrorKind`].
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let code = match source.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::E0501,
            std::io::ErrorKind::PermissionDenied => ErrorCode::E0502,
            std::io::ErrorKind::AlreadyExists => ErrorCode::E0505,
            _ => ErrorCode::E0501,
        };
        Self::Io {
            code,
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_classifies_not_found() {
        let err = Error::io(
            "/tmp/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "nope"),
        );
        assert!(matches!(
            err,
            Error::Io {
                code: ErrorCode::E0501,
                ..
            }
        ));
    }

    #[test]
    fn error_codes_are_stable_strings() {
        assert_eq!(ErrorCode::E0203.as_str(), "E0203");
    }
}
