//! Fetch Coordinator (spec §4.3): drives concurrent fetches, dedups
//! in-flight work by `fId`, propagates renames, and triggers dependency
//! expansion. Built on `FuturesUnordered` the way the teacher's resolver
//! multiplexes concurrent work onto a single task — here that single task
//! *is* the cooperative scheduler the spec requires (spec §5): nothing
//! mutates a core table except inside this loop, between awaits.

use crate::engine::Engine;
use crate::error::FetchFailure;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use gitsu_core::{Endpoint, EndpointId};
use gitsu_repository::{FetchOutcome, RepositoryError};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info, warn};

type FetchResult = (String, std::result::Result<FetchOutcome, RepositoryError>);
type FetchFuture = Pin<Box<dyn Future<Output = FetchResult> + Send>>;

const FAIL_FAST_TIMEOUT: Duration = Duration::from_secs(20);

impl Engine {
    pub(crate) async fn run_fetch_loop(&mut self) -> crate::error::Result<()> {
        let mut in_flight: FuturesUnordered<FetchFuture> = FuturesUnordered::new();

        let targets = self.targets.clone();
        for id in targets {
            self.spawn_fetch(id, &mut in_flight);
        }

        let mut timer: Option<Pin<Box<tokio::time::Sleep>>> = None;

        loop {
            if self.nr_fetching == 0 {
                break;
            }

            tokio::select! {
                maybe = in_flight.next() => {
                    match maybe {
                        Some((fid, result)) => self.on_fetch_complete(fid, result, &mut in_flight),
                        None => break,
                    }
                }
                () = wait_on(&mut timer) => {
                    warn!("fail-fast timer expired with fetches still in flight");
                    break;
                }
            }

            if self.has_failed && timer.is_none() {
                timer = Some(Box::pin(tokio::time::sleep(FAIL_FAST_TIMEOUT)));
            }
        }

        Ok(())
    }

    fn spawn_fetch(&mut self, id: EndpointId, in_flight: &mut FuturesUnordered<FetchFuture>) {
        let fid = self.arena.get(id).identity().fid;

        if let Some(list) = self.fetching.get_mut(&fid) {
            list.push(id);
            return;
        }

        self.fetching.insert(fid.clone(), vec![id]);
        self.nr_fetching += 1;

        let ep = self.arena.get(id);
        let source = ep.source.clone();
        let target = ep.target.clone();
        let fetcher = self.fetchers.iter().find(|f| f.can_handle(&source)).cloned();

        debug!(%source, %target, "starting fetch");

        let fut = async move {
            let result = match fetcher {
                Some(f) => f.fetch(&source, &target).await,
                None => Err(RepositoryError::NotFound { endpoint: source.clone() }),
            };
            (fid, result)
        };
        in_flight.push(Box::pin(fut));
    }

    fn on_fetch_complete(
        &mut self,
        fid: String,
        result: std::result::Result<FetchOutcome, RepositoryError>,
        in_flight: &mut FuturesUnordered<FetchFuture>,
    ) {
        let ids = self.fetching.remove(&fid).unwrap_or_default();
        self.nr_fetching = self.nr_fetching.saturating_sub(1);

        match result {
            Ok(outcome) => {
                for id in &ids {
                    self.on_fetch_success(*id, outcome.clone(), in_flight);
                }
            }
            Err(err) => {
                for id in &ids {
                    self.on_fetch_error(*id, &err);
                }
            }
        }

        self.drain_pending_dep(&fid, in_flight);
    }

    fn on_fetch_error(&mut self, id: EndpointId, err: &RepositoryError) {
        let ep = self.arena.get(id);
        let rid = ep.identity().rid;
        info!(rid = %rid, error = %err, "fetch failed");

        self.failed.entry(rid).or_default().push(FetchFailure {
            name: ep.name.clone(),
            source: ep.source.clone(),
            target: ep.target.clone(),
            message: err.to_string(),
        });
        self.has_failed = true;
    }

    fn on_fetch_success(
        &mut self,
        id: EndpointId,
        outcome: FetchOutcome,
        in_flight: &mut FuturesUnordered<FetchFuture>,
    ) {
        let requested_name = self.arena.get(id).name.clone();
        let canonical_name = outcome.pkg_meta.name.clone().or_else(|| requested_name.clone());

        if let (Some(requested), Some(canonical)) = (&requested_name, &canonical_name)
            && requested != canonical
            && !self.renamed.contains_key(requested)
        {
            let old_rid = self.arena.get(id).identity().rid;
            self.renamed.insert(requested.clone(), canonical.clone());
            self.arena.get_mut(id).rename(canonical.clone());
            info!(from = %requested, to = %canonical, "endpoint renamed by manifest");
            // The endpoint that satisfied dependants under the old name stays
            // reachable under `old_rid` too: later dependants or dedup
            // lookups that still reference it by the pre-rename name find
            // the same (now renamed) endpoint instead of spawning a
            // redundant duplicate fetch.
            self.resolved.entry(old_rid).or_default().push(id);
        } else if canonical_name.is_some() {
            self.arena.get_mut(id).name = canonical_name;
        }

        let ep_mut = self.arena.get_mut(id);
        ep_mut.canonical_dir = Some(outcome.canonical_dir.clone());
        ep_mut.pkg_meta = Some(outcome.pkg_meta.clone());
        if !outcome.is_targetable {
            ep_mut.untargetable = true;
        }

        let rid = self.arena.get(id).identity().rid;
        self.insert_resolved(&rid, id);

        self.expand_dependencies(id, in_flight);

        if let Some(incompatible) = self.incompatibles.remove(&rid) {
            for incompatible_id in incompatible {
                let covered = self
                    .resolved
                    .get(&rid)
                    .is_some_and(|list| list.contains(&incompatible_id))
                    || self.arena.get(incompatible_id).canonical_dir.is_some();
                if !covered {
                    self.spawn_fetch(incompatible_id, in_flight);
                }
            }
        }
    }

    /// Insert `id` into `resolved[rid]`, replacing an exact `(source,
    /// target)` twin if one exists (spec §4.3, `onFetchSuccess`).
    fn insert_resolved(&mut self, rid: &str, id: EndpointId) {
        let entries: Vec<EndpointId> = self.resolved.entry(rid.to_string()).or_default().clone();
        let twin = entries.iter().position(|&existing| {
            existing != id && Self::same_source_and_target(self, existing, id)
        });
        let list = self
            .resolved
            .get_mut(rid)
            .expect("entry was just inserted above");
        if let Some(index) = twin {
            let existing_id = list[index];
            let existing = self.arena.get(existing_id).clone();
            self.arena.get_mut(id).merge_dependants(&existing);
            list[index] = id;
        } else {
            list.push(id);
        }
    }

    fn same_source_and_target(&self, a: EndpointId, b: EndpointId) -> bool {
        let ea = self.arena.get(a);
        let eb = self.arena.get(b);
        ea.source == eb.source && ea.same_target(eb)
    }

    fn drain_pending_dep(&mut self, completed_fid: &str, in_flight: &mut FuturesUnordered<FetchFuture>) {
        let ready: Vec<EndpointId> = self
            .pending_dep
            .iter_mut()
            .filter_map(|(parent, waitset)| {
                waitset.remove(completed_fid);
                waitset.is_empty().then_some(*parent)
            })
            .collect();

        for parent in ready {
            self.pending_dep.remove(&parent);
            self.expand_dependencies(parent, in_flight);
        }
    }

    /// Dependency expansion (spec §4.3.1): parses a fetched manifest's
    /// `dependencies` (and `devDependencies` unless `config.production`)
    /// into child endpoints, deduping against already-resolved or
    /// in-flight siblings before starting a new fetch.
    pub(crate) fn expand_dependencies(
        &mut self,
        parent: EndpointId,
        in_flight: &mut FuturesUnordered<FetchFuture>,
    ) {
        let Some(manifest) = self.arena.get(parent).pkg_meta.clone() else {
            return;
        };
        let parent_unresolvable = self.arena.get(parent).unresolvable;

        let mut deps: Vec<(String, String)> = manifest.dependencies.into_iter().collect();
        if !self.config.production {
            deps.extend(manifest.dev_dependencies);
        }
        deps.sort();

        let mut waitset = std::collections::BTreeSet::new();

        for (key, value) in deps {
            let name = self.renamed.get(&key).cloned().unwrap_or(key.clone());
            let (source, target) = split_dependency_value(&key, &value);

            let mut child = Endpoint::new(source, target, Some(name));
            child.unresolvable = parent_unresolvable;
            let identity = child.identity();

            if let Some(exact_or_compatible) = self.find_reusable(&identity.rid, &child) {
                match exact_or_compatible {
                    Reuse::Exact(existing_id) => {
                        self.attach_dependant(existing_id, parent, &key);
                    }
                    Reuse::Compatible(existing_id) => {
                        let existing = self.arena.get(existing_id);
                        child.canonical_dir = existing.canonical_dir.clone();
                        child.pkg_meta = existing.pkg_meta.clone();
                        child.dependencies = existing.dependencies.clone();
                        child.dependants.insert(parent);
                        let child_id = self.arena.insert(child);
                        self.resolved.entry(identity.rid).or_default().push(child_id);
                        self.arena.get_mut(parent).dependencies.insert(key, child_id);
                    }
                }
                continue;
            }

            if let Some(fid) = self.find_in_flight_compatible(&child) {
                waitset.insert(fid);
                continue;
            }

            child.dependants.insert(parent);
            let child_id = self.arena.insert(child);
            self.arena.get_mut(parent).dependencies.insert(key, child_id);
            self.spawn_fetch(child_id, in_flight);
        }

        if !waitset.is_empty() {
            self.pending_dep.insert(parent, waitset);
        }
    }

    fn find_reusable(&self, rid: &str, child: &Endpoint) -> Option<Reuse> {
        let candidates = self.resolved.get(rid)?;
        for &existing_id in candidates {
            let existing = self.arena.get(existing_id);
            if existing.target == child.target {
                return Some(Reuse::Exact(existing_id));
            }
        }
        for &existing_id in candidates {
            let existing = self.arena.get(existing_id);
            let resolved_version = existing.pkg_meta.as_ref().and_then(gitsu_core::Manifest::semver);
            if gitsu_core::compat::are_compatible(&child.target, &existing.target, resolved_version.as_ref()) {
                return Some(Reuse::Compatible(existing_id));
            }
        }
        None
    }

    fn find_in_flight_compatible(&self, child: &Endpoint) -> Option<String> {
        for (fid, ids) in &self.fetching {
            for &id in ids {
                let candidate = self.arena.get(id);
                if candidate.source == child.source
                    && gitsu_core::compat::are_compatible(&child.target, &candidate.target, None)
                {
                    return Some(fid.clone());
                }
            }
        }
        None
    }

    fn attach_dependant(&mut self, existing_id: EndpointId, parent: EndpointId, key: &str) {
        self.arena.get_mut(existing_id).dependants.insert(parent);
        self.arena
            .get_mut(parent)
            .dependencies
            .insert(key.to_string(), existing_id);
    }
}

enum Reuse {
    Exact(EndpointId),
    Compatible(EndpointId),
}

/// Parse a manifest dependency value into `(source, target)`. A value of
/// the form `source#target` names its own source explicitly; a bare value
/// is treated as a target against a source equal to the dependency key
/// (the common case: the key is itself resolvable, e.g. a registry name).
fn split_dependency_value(key: &str, value: &str) -> (String, String) {
    match value.split_once('#') {
        Some((source, target)) => (source.to_string(), target.to_string()),
        None => (key.to_string(), value.to_string()),
    }
}

fn wait_on(timer: &mut Option<Pin<Box<tokio::time::Sleep>>>) -> impl Future<Output = ()> + '_ {
    std::future::poll_fn(move |cx| match timer.as_mut() {
        Some(sleep) => sleep.as_mut().poll(cx),
        None => std::task::Poll::Pending,
    })
}

#[cfg(test)]
mod tests {
    use crate::engine::{Engine, IncompatibleSpec, TargetSpec};
    use gitsu_config::Config;
    use gitsu_core::Manifest;
    use gitsu_repository::{FetchOutcome, Fetcher, RepositoryError};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;

    /// Resolves any source to a manifest whose version is carried in the
    /// target itself (`^1.0.0` -> `1.0.0`), so a test can pick distinct
    /// versions per candidate without a real transport.
    struct StubFetcher;

    impl Fetcher for StubFetcher {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn can_handle(&self, _source: &str) -> bool {
            true
        }

        fn fetch<'a>(
            &'a self,
            source: &'a str,
            target: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<FetchOutcome, RepositoryError>> + Send + 'a>> {
            Box::pin(async move {
                let version = target.trim_start_matches(['^', '~']).to_string();
                Ok(FetchOutcome {
                    canonical_dir: std::path::PathBuf::from(format!("/stub/{source}/{version}")),
                    pkg_meta: Manifest { name: Some("dep".into()), version: Some(version), ..Default::default() },
                    is_targetable: true,
                    release: None,
                })
            })
        }

        fn versions<'a>(
            &'a self,
            _source: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, RepositoryError>> + Send + 'a>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    #[tokio::test]
    async fn incompatible_endpoint_is_refetched_once_its_rid_resolves() {
        let mut engine = Engine::new(
            Config::default(),
            vec![Arc::new(StubFetcher) as Arc<dyn Fetcher>],
            gitsu_core::AHashMap::new(),
            gitsu_core::AHashMap::new(),
        );

        let targets = vec![TargetSpec { source: "dep".into(), target: "^1.0.0".into(), name: Some("dep".into()) }];
        let incompatibles = vec![IncompatibleSpec {
            rid: "dep".into(),
            source: "dep".into(),
            target: "~1.0.5".into(),
            name: Some("dep".into()),
        }];

        let outcome = engine.resolve(targets, incompatibles).await.unwrap();

        // Both the primary target and the incompatible sibling resolved to
        // a real version, proving the incompatible was actually fetched
        // rather than left permanently dead in `self.incompatibles`.
        let resolved = engine.resolved.get("dep").expect("rid resolved");
        assert_eq!(resolved.len(), 2);
        for &id in resolved {
            assert!(engine.arena.get(id).pkg_meta.is_some());
        }
        assert!(outcome.elected.contains_key("dep"));
    }
}
