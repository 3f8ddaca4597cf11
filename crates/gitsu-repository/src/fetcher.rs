//! The external resolver contract the Fetch Coordinator consumes.
//!
//! Concrete transport resolvers (git, registry, filesystem) live outside
//! the resolution core; they only need to satisfy this trait. [`Fetcher`]
//! is written the way the teacher's `VcsProvider` is — an object-safe
//! trait returning boxed futures — so `gitsu-resolver` can hold a
//! `Vec<Arc<dyn Fetcher>>` and dispatch by `source` shape without knowing
//! which transport handled it.

use crate::error::Result;
use gitsu_core::Manifest;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

/// The outcome of materializing one endpoint's target.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Where the revision was materialized on disk.
    pub canonical_dir: PathBuf,
    /// The manifest read from that directory, if any.
    pub pkg_meta: Manifest,
    /// Whether the resolver could enumerate other revisions for this
    /// source. `false` blocks wildcard-to-range promotion at dissect time.
    pub is_targetable: bool,
    /// The release tag this target resolved to, when the target itself
    /// was a wildcard and the resolver elected a concrete revision.
    pub release: Option<String>,
}

/// A transport capable of turning a `source` into a materialized revision.
pub trait Fetcher: Send + Sync {
    /// A short name for diagnostics (`"filesystem"`, `"git"`, ...).
    fn name(&self) -> &'static str;

    /// Whether this fetcher claims the given source string.
    fn can_handle(&self, source: &str) -> bool;

    /// Materialize `target` from `source`, producing a [`FetchOutcome`].
    fn fetch<'a>(
        &'a self,
        source: &'a str,
        target: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchOutcome>> + Send + 'a>>;

    /// List the revisions this source can be targeted at. Not used by the
    /// resolution algorithm itself; exposed for a CLI `ls`/`why` surface.
    fn versions<'a>(
        &'a self,
        source: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;
}
