//! The orchestration layer: sequences *configure → resolve → dissect* and
//! owns the core state tables (spec §2, §3).

use crate::dissect::ConflictPrompter;
use crate::error::{Error, FetchFailure, Result};
use crate::graph::Arena;
use gitsu_config::Config;
use gitsu_core::{AHashMap, Endpoint, EndpointId, Manifest};
use gitsu_repository::Fetcher;
use std::sync::Arc;

/// A top-level dependency the caller wants resolved.
#[derive(Debug, Clone)]
pub struct TargetSpec {
    /// Opaque transport address.
    pub source: String,
    /// Requested revision.
    pub target: String,
    /// Logical name, if known ahead of fetch.
    pub name: Option<String>,
}

/// An endpoint recorded as incompatible against an `rId` on a prior run,
/// supplied at configure time (spec §3, Ownership/lifecycle path (c)): not
/// yet resolved, but still required. Re-fetched once that `rId`'s primary
/// fetch completes, unless something already covers it (spec §4.3,
/// `onFetchSuccess`).
#[derive(Debug, Clone)]
pub struct IncompatibleSpec {
    /// The `rId` this endpoint is recorded against.
    pub rid: String,
    /// Opaque transport address.
    pub source: String,
    /// Requested revision.
    pub target: String,
    /// Logical name, if known ahead of fetch.
    pub name: Option<String>,
}

/// The set of endpoints the Deployer must materialize, keyed by `rId`.
#[derive(Debug, Default)]
pub struct DissectOutcome {
    /// One elected endpoint per logical package that needs deployment.
    pub elected: AHashMap<String, EndpointId>,
    /// Packages whose election required a conflict resolution step.
    pub conflicted: AHashMap<String, bool>,
    /// The resolutions table after this run, ready to persist.
    pub resolutions: AHashMap<String, String>,
}

/// Holds every table the Fetch Coordinator and Conflict Resolver share.
pub struct Engine {
    pub(crate) config: Config,
    pub(crate) fetchers: Vec<Arc<dyn Fetcher>>,
    pub(crate) arena: Arena,
    pub(crate) targets: Vec<EndpointId>,
    pub(crate) resolved: AHashMap<String, Vec<EndpointId>>,
    pub(crate) installed: AHashMap<String, Manifest>,
    pub(crate) fetching: AHashMap<String, Vec<EndpointId>>,
    pub(crate) incompatibles: AHashMap<String, Vec<EndpointId>>,
    pub(crate) failed: AHashMap<String, Vec<FetchFailure>>,
    pub(crate) resolutions: AHashMap<String, String>,
    pub(crate) renamed: AHashMap<String, String>,
    pub(crate) conflicted: AHashMap<String, bool>,
    pub(crate) pending_dep: AHashMap<EndpointId, std::collections::BTreeSet<String>>,
    pub(crate) nr_fetching: usize,
    pub(crate) has_failed: bool,
    pub(crate) prompter: Option<Arc<dyn ConflictPrompter>>,
    working: bool,
}

impl Engine {
    /// Create an idle engine.
    #[must_use]
    pub fn new(
        config: Config,
        fetchers: Vec<Arc<dyn Fetcher>>,
        installed: AHashMap<String, Manifest>,
        resolutions: AHashMap<String, String>,
    ) -> Self {
        Self {
            config,
            fetchers,
            arena: Arena::new(),
            targets: Vec::new(),
            resolved: AHashMap::new(),
            installed,
            fetching: AHashMap::new(),
            incompatibles: AHashMap::new(),
            failed: AHashMap::new(),
            resolutions,
            renamed: AHashMap::new(),
            conflicted: AHashMap::new(),
            pending_dep: AHashMap::new(),
            nr_fetching: 0,
            has_failed: false,
            prompter: None,
            working: false,
        }
    }

    /// Install an interactive conflict-resolution capability. Without one,
    /// unresolvable conflicts always surface as `Error::Conflict`.
    #[must_use]
    pub fn with_prompter(mut self, prompter: Arc<dyn ConflictPrompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    /// Access the endpoint arena (for the Deployer, after `resolve`).
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Access the active configuration (for the Deployer, after `resolve`).
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrow the configuration and a mutable view of the arena together:
    /// the Deployer needs the latter to reconcile dependency edges onto the
    /// elected endpoints (spec §4.5 step 5) after deploying.
    pub fn config_and_arena_mut(&mut self) -> (&Config, &mut Arena) {
        (&self.config, &mut self.arena)
    }

    /// Run `configure → resolve → dissect` for `targets`, plus any
    /// `incompatibles` carried over from a prior run (spec §3, path (c)).
    ///
    /// # Errors
    /// `Error::Working` if a resolve is already in progress (never true for
    /// an owned, non-reentrant `&mut self` call, but kept as a documented
    /// guard matching `EWORKING` in the distilled spec). `Error::Fetch` on
    /// the first unrecovered transport failure. `Error::Conflict` when
    /// dissect cannot elect a revision non-interactively.
    pub async fn resolve(
        &mut self,
        targets: Vec<TargetSpec>,
        incompatibles: Vec<IncompatibleSpec>,
    ) -> Result<DissectOutcome> {
        if self.working {
            return Err(Error::Working);
        }
        self.working = true;
        let result = self.resolve_inner(targets, incompatibles).await;
        self.working = false;
        result
    }

    async fn resolve_inner(
        &mut self,
        targets: Vec<TargetSpec>,
        incompatibles: Vec<IncompatibleSpec>,
    ) -> Result<DissectOutcome> {
        self.fetching.clear();
        self.failed.clear();
        self.pending_dep.clear();
        self.nr_fetching = 0;
        self.has_failed = false;
        self.targets.clear();
        self.incompatibles.clear();

        for t in uniquify(targets) {
            let endpoint = Endpoint::new(t.source, t.target, t.name).newly(true);
            let id = self.arena.insert(endpoint);
            self.targets.push(id);
        }

        for inc in incompatibles {
            let endpoint = Endpoint::new(inc.source, inc.target, inc.name);
            let id = self.arena.insert(endpoint);
            self.incompatibles.entry(inc.rid).or_default().push(id);
        }

        self.run_fetch_loop().await?;

        if self.has_failed {
            let (_, failures) = self
                .failed
                .iter()
                .next()
                .expect("has_failed implies a recorded failure");
            let first = failures.first().expect("non-empty failure list").clone();
            return Err(Error::Fetch(first));
        }

        crate::dissect::dissect(self)
    }
}

/// `_uniquify` (spec §4.1/§8): dedup a caller-supplied target list by its
/// `(name, source, target)` identity, keeping the last occurrence of each
/// duplicate key so a later override in the same list wins.
fn uniquify(targets: Vec<TargetSpec>) -> Vec<TargetSpec> {
    let mut last_index_of: AHashMap<(String, String, String), usize> = AHashMap::new();
    for (index, t) in targets.iter().enumerate() {
        let key = (t.name.clone().unwrap_or_default(), t.source.clone(), t.target.clone());
        last_index_of.insert(key, index);
    }
    targets
        .into_iter()
        .enumerate()
        .filter_map(|(index, t)| {
            let key = (t.name.clone().unwrap_or_default(), t.source.clone(), t.target.clone());
            (last_index_of.get(&key) == Some(&index)).then_some(t)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, source: &str, target: &str) -> TargetSpec {
        TargetSpec { source: source.into(), target: target.into(), name: Some(name.into()) }
    }

    #[test]
    fn uniquify_keeps_the_last_occurrence_of_a_duplicate_key() {
        let targets = vec![spec("a", "repo-a", "^1.0.0"), spec("b", "repo-b", "^2.0.0"), spec("a", "repo-a", "^1.0.0")];
        let result = uniquify(targets);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name.as_deref(), Some("b"));
        assert_eq!(result[1].name.as_deref(), Some("a"));
    }

    #[test]
    fn uniquify_preserves_distinct_targets_for_the_same_name() {
        let targets = vec![spec("a", "repo-a", "^1.0.0"), spec("a", "repo-a", "^2.0.0")];
        let result = uniquify(targets);
        assert_eq!(result.len(), 2);
    }
}
