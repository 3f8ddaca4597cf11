//! Errors the Fetch Coordinator and Conflict Resolver can raise.

use gitsu_core::EndpointId;
use thiserror::Error;

/// One fetch failure, attached to `failed[rId]`.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    /// Logical package name, if known at failure time.
    pub name: Option<String>,
    /// The endpoint's `source`.
    pub source: String,
    /// The endpoint's `target`.
    pub target: String,
    /// Human-readable cause.
    pub message: String,
}

/// Top-level error from `Engine::resolve`.
#[derive(Error, Debug)]
pub enum Error {
    /// A `resolve()` call was made while one was already in progress.
    #[error("EWORKING: a resolve is already in progress")]
    Working,

    /// Dissect could not elect a single revision for one or more packages
    /// without user input.
    #[error("ECONFLICT: {} package(s) need a resolution", .picks.len())]
    Conflict {
        /// Candidates needing a pick, keyed by rId.
        picks: Vec<ConflictPick>,
    },

    /// At least one fetch failed; carries the first recorded failure.
    #[error("fetch failed for {}: {}", .0.source, .0.message)]
    Fetch(FetchFailure),

    /// Propagated from `gitsu-core` (manifest parsing, identity errors).
    #[error(transparent)]
    Core(#[from] gitsu_core::Error),

    /// Propagated from a `Fetcher` implementation.
    #[error(transparent)]
    Repository(#[from] gitsu_repository::RepositoryError),
}

/// One logical package awaiting a user pick during conflict resolution.
#[derive(Debug, Clone)]
pub struct ConflictPick {
    /// The package's `rId`.
    pub rid: String,
    /// Candidate endpoints, in the tie-broken display order.
    pub candidates: Vec<EndpointId>,
}

/// Result type used throughout the resolver.
pub type Result<T> = std::result::Result<T, Error>;
