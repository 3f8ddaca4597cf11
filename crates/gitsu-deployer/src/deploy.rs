//! The Deployer (spec §4.5): materializes elected endpoints into the
//! components directory, honoring keep-lists and in-place updates.

use crate::error::{DeployError, Result};
use crate::hooks::HookRunner;
use crate::keep;
use crate::report::Report;
use gitsu_config::Config;
use gitsu_core::manifest::ResolutionAnnotation;
use gitsu_core::{AHashSet, Endpoint, EndpointId, Manifest};
use gitsu_resolver::{Arena, DissectOutcome};
use std::path::{Path, PathBuf};

const NEW_MANIFEST: &str = ".gitsu.json.new";
const MANIFEST: &str = ".gitsu.json";

pub struct Deployer<'a> {
    config: &'a Config,
    arena: &'a mut Arena,
}

impl<'a> Deployer<'a> {
    #[must_use]
    pub fn new(config: &'a Config, arena: &'a mut Arena) -> Self {
        Self { config, arena }
    }

    pub async fn deploy(&mut self, outcome: &DissectOutcome, hooks: &dyn HookRunner) -> Result<Report> {
        tokio::fs::create_dir_all(&self.config.components_dir)
            .await
            .map_err(|e| DeployError::io(&self.config.components_dir, e))?;

        hooks
            .run("preinstall")
            .await
            .map_err(|e| DeployError::Hook { name: "preinstall".into(), message: e.to_string() })?;

        let elected_rids: Vec<String> = outcome.elected.keys().cloned().collect();
        for (rid, &id) in &outcome.elected {
            let conflicted = outcome.conflicted.get(rid).copied().unwrap_or(false);
            self.deploy_one(rid, id, &elected_rids, conflicted).await?;
        }

        hooks
            .run("postinstall")
            .await
            .map_err(|e| DeployError::Hook { name: "postinstall".into(), message: e.to_string() })?;

        self.reconcile(outcome);

        Ok(Report::build(self.arena, outcome))
    }

    /// Reconcile (spec §4.5 step 5): rewrite every elected endpoint's
    /// dependency edges to point at the elected endpoints, closing the
    /// graph over actual deployed revisions rather than whichever sibling
    /// happened to win a given fetch. Without this, a report (or a later
    /// run's keep-list computation) can walk into an endpoint that was
    /// superseded during conflict resolution and never deployed.
    fn reconcile(&mut self, outcome: &DissectOutcome) {
        let roots: Vec<EndpointId> = outcome.elected.values().copied().collect();
        for root in roots {
            let mut ancestors = AHashSet::default();
            self.reconcile_endpoint(root, outcome, &mut ancestors);
        }
    }

    fn reconcile_endpoint(&mut self, id: EndpointId, outcome: &DissectOutcome, ancestors: &mut AHashSet<EndpointId>) {
        if !ancestors.insert(id) {
            return;
        }

        let deps: Vec<(String, EndpointId)> =
            self.arena.get(id).dependencies.iter().map(|(k, &v)| (k.clone(), v)).collect();

        for (key, child_id) in deps {
            let child_rid = self.arena.get(child_id).identity().rid;
            let next = match outcome.elected.get(&child_rid) {
                Some(&elected_id) if elected_id != child_id => {
                    self.arena.get_mut(id).dependencies.insert(key, elected_id);
                    self.arena.get_mut(elected_id).dependants.insert(id);
                    elected_id
                }
                _ => child_id,
            };
            self.reconcile_endpoint(next, outcome, ancestors);
        }

        ancestors.remove(&id);
    }

    async fn deploy_one(
        &self,
        rid: &str,
        id: EndpointId,
        elected_rids: &[String],
        conflicted: bool,
    ) -> Result<()> {
        let dst = self.config.components_dir.join(rid);
        let new_marker = dst.join(NEW_MANIFEST);

        if tokio::fs::try_exists(&new_marker).await.unwrap_or(false) {
            tokio::fs::rename(&new_marker, dst.join(MANIFEST))
                .await
                .map_err(|e| DeployError::io(&new_marker, e))?;
            self.write_metadata(&dst, id, conflicted).await?;
            return Ok(());
        }

        let ep = self.arena.get(id);
        let canonical_dir = ep
            .canonical_dir
            .clone()
            .ok_or_else(|| DeployError::MissingCanonicalDir { rid: rid.to_string() })?;
        let incoming = ep.pkg_meta.clone().unwrap_or_default();

        let existing = read_manifest(&dst.join(MANIFEST)).await.ok().flatten();
        let keep_set = keep::compute_keep_set(existing.as_ref(), &incoming, rid, elected_rids);

        let ignore = if tokio::fs::try_exists(&dst).await.unwrap_or(false) {
            self.preserved_entries(&dst, &keep_set).await?
        } else {
            Vec::new()
        };

        purge_and_copy(dst.clone(), canonical_dir, ignore).await?;
        self.write_metadata(&dst, id, conflicted).await?;
        Ok(())
    }

    /// Files already present at `dst` whose relative path matches a
    /// keep-glob: these are preserved across the redeploy.
    async fn preserved_entries(&self, dst: &Path, keep_set: &[String]) -> Result<Vec<PathBuf>> {
        let patterns = keep::compile_patterns(keep_set);
        let dst = dst.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut preserved = Vec::new();
            for entry in walkdir::WalkDir::new(&dst).into_iter().filter_map(std::result::Result::ok) {
                let rel = entry.path().strip_prefix(&dst).unwrap_or(entry.path());
                if !rel.as_os_str().is_empty() && keep::matches_any(&patterns, rel) {
                    preserved.push(rel.to_path_buf());
                }
            }
            preserved
        })
        .await
        .map_err(|e| DeployError::Hook { name: "scan".into(), message: e.to_string() })
    }

    async fn write_metadata(&self, dst: &Path, id: EndpointId, conflicted: bool) -> Result<()> {
        let ep = self.arena.get(id);
        let manifest_path = dst.join(MANIFEST);
        let mut manifest = read_manifest(&manifest_path)
            .await
            .ok()
            .flatten()
            .or_else(|| ep.pkg_meta.clone())
            .unwrap_or_default();

        manifest.source = Some(ep.source.clone());
        manifest.target = Some(ep.target.clone());
        manifest.original_source = Some(ep.initial_name.clone().unwrap_or_else(|| ep.source.clone()));
        if ep.newly {
            manifest.direct = Some(true);
        }
        manifest.resolution = Some(annotation_for(ep, conflicted));

        write_manifest(&manifest_path, &manifest).await
    }
}

fn annotation_for(ep: &Endpoint, conflicted: bool) -> ResolutionAnnotation {
    if ep.target == "*" {
        ResolutionAnnotation::Wildcard
    } else if conflicted {
        ResolutionAnnotation::Range
    } else {
        ResolutionAnnotation::Version
    }
}

async fn read_manifest(path: &Path) -> std::io::Result<Option<Manifest>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(sonic_rs::from_str(&content).ok()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

async fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    let json = gitsu_core::to_json_pretty(manifest)
        .map_err(|e| DeployError::InvalidManifest { path: path.to_path_buf(), message: e.to_string() })?;
    tokio::fs::write(path, json).await.map_err(|e| DeployError::io(path, e))
}

/// Remove everything under `dst` except `ignore`-listed relative paths, then
/// copy `canonical_dir` into `dst`, skipping those same paths so preserved
/// files are never overwritten.
async fn purge_and_copy(dst: PathBuf, canonical_dir: PathBuf, ignore: Vec<PathBuf>) -> Result<()> {
    tokio::task::spawn_blocking(move || purge_and_copy_blocking(&dst, &canonical_dir, &ignore))
        .await
        .map_err(|e| DeployError::Hook { name: "deploy".into(), message: e.to_string() })?
}

fn purge_and_copy_blocking(dst: &Path, canonical_dir: &Path, ignore: &[PathBuf]) -> Result<()> {
    if dst.exists() {
        for entry in walkdir::WalkDir::new(dst).contents_first(true) {
            let entry = entry.map_err(walk_err(dst))?;
            let rel = entry.path().strip_prefix(dst).unwrap_or(entry.path());
            if rel.as_os_str().is_empty() || ignore.iter().any(|k| k.as_path() == rel) {
                continue;
            }
            if entry.file_type().is_dir() {
                let _ = std::fs::remove_dir(entry.path());
            } else {
                std::fs::remove_file(entry.path()).map_err(|e| DeployError::io(entry.path(), e))?;
            }
        }
    }

    std::fs::create_dir_all(dst).map_err(|e| DeployError::io(dst, e))?;

    for entry in walkdir::WalkDir::new(canonical_dir) {
        let entry = entry.map_err(walk_err(canonical_dir))?;
        let rel = entry.path().strip_prefix(canonical_dir).unwrap_or(entry.path());
        if rel.as_os_str().is_empty() || ignore.iter().any(|k| k.as_path() == rel) {
            continue;
        }
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| DeployError::io(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| DeployError::io(parent, e))?;
            }
            std::fs::copy(entry.path(), &target).map_err(|e| DeployError::io(&target, e))?;
        }
    }

    Ok(())
}

fn walk_err(root: &Path) -> impl Fn(walkdir::Error) -> DeployError + '_ {
    move |e| {
        let description = e.to_string();
        DeployError::io(
            root,
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other(description)),
        )
    }
}
