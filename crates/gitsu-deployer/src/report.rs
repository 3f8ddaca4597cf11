//! The JSON-shaped report returned after a successful deploy (spec §4.5).

use gitsu_core::{AHashMap, AHashSet, EndpointId, Manifest};
use gitsu_resolver::{Arena, DissectOutcome};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct EndpointSummary {
    pub name: Option<String>,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEndpoint {
    pub endpoint: EndpointSummary,
    #[serde(rename = "canonicalDir")]
    pub canonical_dir: Option<PathBuf>,
    #[serde(rename = "pkgMeta")]
    pub pkg_meta: Option<Manifest>,
    pub dependencies: AHashMap<String, ReportEndpoint>,
    #[serde(rename = "nrDependants")]
    pub nr_dependants: usize,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct Report {
    pub endpoints: AHashMap<String, ReportEndpoint>,
}

impl Report {
    #[must_use]
    pub fn build(arena: &Arena, outcome: &DissectOutcome) -> Self {
        let mut endpoints = AHashMap::new();
        for (rid, &id) in &outcome.elected {
            let mut ancestors = AHashSet::default();
            endpoints.insert(rid.clone(), build_endpoint(arena, id, &mut ancestors));
        }
        Self { endpoints }
    }
}

/// Build one endpoint's report node, recursing into its declared
/// dependencies. Cycle-guarded: an id already on the current ancestor path
/// is skipped, matching the Deployer's `toData` walk (spec §4.5).
fn build_endpoint(arena: &Arena, id: EndpointId, ancestors: &mut AHashSet<EndpointId>) -> ReportEndpoint {
    let ep = arena.get(id);
    let mut dependencies = AHashMap::new();

    if ancestors.insert(id) {
        for (key, &child_id) in &ep.dependencies {
            if !ancestors.contains(&child_id) {
                dependencies.insert(key.clone(), build_endpoint(arena, child_id, ancestors));
            }
        }
        ancestors.remove(&id);
    }

    ReportEndpoint {
        endpoint: EndpointSummary { name: ep.name.clone(), source: ep.source.clone(), target: ep.target.clone() },
        canonical_dir: ep.canonical_dir.clone(),
        pkg_meta: ep.pkg_meta.clone(),
        dependencies,
        nr_dependants: ep.dependants.len(),
    }
}
