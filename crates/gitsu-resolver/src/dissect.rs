//! Conflict Resolver (spec §4.4): for every `rId` with more than one
//! resolved endpoint, elect the single revision the Deployer will
//! materialize, or report a conflict the caller must resolve.

use crate::engine::{DissectOutcome, Engine};
use crate::error::{ConflictPick, Error, Result};
use gitsu_core::endpoint::Target;
use gitsu_core::{EndpointId, Manifest};
use semver::Version;

/// Injected capability for picking a revision interactively. The core never
/// prompts a terminal itself; a CLI wires a concrete implementation in.
pub trait ConflictPrompter: Send + Sync {
    /// Ask the user to choose among `candidates` for `rid`. Returns the
    /// chosen candidate's index, or `None` if the user declined to choose.
    fn prompt(&self, rid: &str, candidates: &[String]) -> Option<usize>;
}

pub(crate) fn dissect(engine: &mut Engine) -> Result<DissectOutcome> {
    let mut outcome = DissectOutcome::default();
    let mut picks = Vec::new();

    let rids: Vec<String> = engine.resolved.keys().cloned().collect();
    for rid in rids {
        let candidates = engine.resolved.get(&rid).cloned().unwrap_or_default();
        if candidates.is_empty() {
            continue;
        }

        match elect(engine, &rid, &candidates)? {
            Election::Elected { id, was_conflict } => {
                outcome.elected.insert(rid.clone(), id);
                outcome.conflicted.insert(rid.clone(), was_conflict);
                if was_conflict {
                    engine.conflicted.insert(rid.clone(), true);
                    engine.resolutions.insert(rid.clone(), store_resolution_value(engine, id));
                }
            }
            Election::NeedsPick(candidate_ids) => {
                picks.push(ConflictPick { rid: rid.clone(), candidates: candidate_ids });
            }
        }
    }

    if !picks.is_empty() {
        return Err(Error::Conflict { picks });
    }

    gc_resolutions(engine, &outcome);
    outcome.resolutions = engine.resolutions.clone();

    filter_deployment_set(engine, &mut outcome);

    Ok(outcome)
}

/// `storeResolution` (spec §4.4): the stored value is the elected target,
/// unless that target was promoted from (or still is) the wildcard `*`, in
/// which case the fetched release tag is stored instead so a future run can
/// still recognize the same pick.
fn store_resolution_value(engine: &Engine, id: EndpointId) -> String {
    let ep = engine.arena.get(id);
    if ep.was_wildcard || ep.target == "*" {
        ep.pkg_meta
            .as_ref()
            .and_then(|m| m.release.clone())
            .unwrap_or_else(|| "*".to_string())
    } else {
        ep.target.clone()
    }
}

enum Election {
    Elected { id: EndpointId, was_conflict: bool },
    NeedsPick(Vec<EndpointId>),
}

fn elect(engine: &mut Engine, rid: &str, candidates: &[EndpointId]) -> Result<Election> {
    // Partition by whether the *fetched* manifest carries a version, not by
    // the shape of the requested target (spec §4.4 step 1): two candidates
    // requesting `^1.0.0` and `~1.2.0` that both fetched to the same release
    // both belong in `versions`, even though their requested targets are
    // themselves ranges.
    let mut versions: Vec<(EndpointId, Version)> = Vec::new();
    let mut non_versions: Vec<EndpointId> = Vec::new();

    for &id in candidates {
        let ep = engine.arena.get(id);
        match ep.pkg_meta.as_ref().and_then(Manifest::semver) {
            Some(v) => versions.push((id, v)),
            None => non_versions.push(id),
        }
    }

    // Promotion runs for every rId with a non-empty resolved list, including
    // a single uncontested candidate — a lone `*`-targeted endpoint still
    // needs to read `~V` after dissect.
    promote_wildcards(engine, &versions);

    if candidates.len() == 1 {
        return Ok(Election::Elected { id: candidates[0], was_conflict: false });
    }

    // Single non-semver candidate and nothing else pins a version: the
    // non-semver target (a branch, tag, or commit) wins unopposed.
    if non_versions.len() == 1 && versions.is_empty() {
        return Ok(Election::Elected { id: non_versions[0], was_conflict: candidates.len() > 1 });
    }

    // Only semvers: elect any candidate whose fetched version satisfies
    // every other candidate's requested target range.
    if non_versions.is_empty()
        && let Some(&(winner, _)) = versions.iter().find(|(id, version)| {
            candidates.iter().all(|&other| {
                other == *id || target_satisfied_by(&engine.arena.get(other).target, version)
            })
        })
    {
        return Ok(Election::Elected { id: winner, was_conflict: candidates.len() > 1 });
    }

    let any_unresolvable = candidates.iter().any(|&id| engine.arena.get(id).unresolvable);

    if !any_unresolvable
        && let Some(stored_target) = engine.resolutions.get(rid).cloned()
        && let Some(id) = match_stored_resolution(engine, candidates, &stored_target)
    {
        return Ok(Election::Elected { id, was_conflict: true });
    }

    if engine.config.force_latest && !versions.is_empty() {
        let winner = versions.iter().max_by(|a, b| a.1.cmp(&b.1)).map(|(id, _)| *id);
        if let Some(id) = winner {
            return Ok(Election::Elected { id, was_conflict: true });
        }
    }

    if let Some(prompter) = engine.prompter.clone()
        && engine.config.interactive
    {
        let labels: Vec<String> = candidates.iter().map(|&id| engine.arena.get(id).target.clone()).collect();
        if let Some(index) = prompter.prompt(rid, &labels) {
            return Ok(Election::Elected { id: candidates[index], was_conflict: true });
        }
    }

    Ok(Election::NeedsPick(candidates.to_vec()))
}

/// Whether `target_str`, parsed as a requested target, admits `version`.
fn target_satisfied_by(target_str: &str, version: &Version) -> bool {
    match Target::parse(target_str) {
        Target::Version(v) => &v == version,
        Target::Range(range) => range.satisfies(version),
        Target::Other(_) => false,
    }
}

/// Wildcard promotion (spec §4.4 step 3): a `newly`-requested, targetable
/// endpoint whose target is still the literal wildcard `*` is promoted to
/// `~<fetched version>` before election, so it behaves as a real constraint
/// against its siblings instead of trivially satisfying everything.
fn promote_wildcards(engine: &mut Engine, versions: &[(EndpointId, Version)]) {
    for (id, version) in versions {
        let ep = engine.arena.get(*id);
        if ep.newly && ep.target == "*" && !ep.untargetable {
            let promoted = format!("~{version}");
            let ep = engine.arena.get_mut(*id);
            ep.was_wildcard = true;
            ep.target = promoted;
        }
    }
}

/// Apply a stored resolution: match by range (the stored string parsed as a
/// requested target, checked against each candidate's resolved version)
/// first, then fall back to exact `target`/`_release` string equality.
fn match_stored_resolution(engine: &Engine, candidates: &[EndpointId], stored: &str) -> Option<EndpointId> {
    for &id in candidates {
        let ep = engine.arena.get(id);
        if let Some(version) = ep.pkg_meta.as_ref().and_then(gitsu_core::Manifest::semver)
            && target_satisfied_by(stored, &version)
        {
            return Some(id);
        }
    }
    for &id in candidates {
        let ep = engine.arena.get(id);
        let release = ep.pkg_meta.as_ref().and_then(|m| m.release.as_deref());
        if ep.target == stored || release == Some(stored) {
            return Some(id);
        }
    }
    None
}

/// Drop resolutions whose `rId` is no longer marked `conflicted`, keeping
/// `resolutions.json` from growing stale entries forever (spec §4.4).
fn gc_resolutions(engine: &mut Engine, _outcome: &DissectOutcome) {
    let conflicted = engine.conflicted.clone();
    engine.resolutions.retain(|rid, _| conflicted.contains_key(rid));
}

/// Narrow `elected` down to what the Deployer must actually materialize:
/// skip endpoints that are linked out-of-tree, or whose installed metadata
/// already matches the elected target and the user didn't pass `--force`
/// (spec §4.5).
fn filter_deployment_set(engine: &Engine, outcome: &mut DissectOutcome) {
    outcome.elected.retain(|rid, &mut id| {
        let ep = engine.arena.get(id);
        if ep.linked {
            return false;
        }
        if engine.config.force {
            return true;
        }
        match engine.installed.get(rid) {
            Some(installed) => {
                let original = ep.initial_name.as_deref().unwrap_or(&ep.source);
                let release = ep.pkg_meta.as_ref().and_then(|m| m.release.as_deref());
                installed.target.as_deref() != Some(ep.target.as_str())
                    || installed.original_source.as_deref() != Some(original)
                    || installed.release.as_deref() != release
            }
            None => true,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitsu_config::Config;
    use gitsu_core::{Endpoint, Manifest};
    use std::sync::Arc;

    fn versioned(name: &str, version: &str) -> Endpoint {
        let mut ep = Endpoint::new(name, version, Some(name.to_string()));
        ep.pkg_meta = Some(Manifest { name: Some(name.into()), version: Some(version.into()), ..Default::default() });
        ep
    }

    fn engine_with(config: Config, candidates: Vec<Endpoint>, rid: &str) -> (Engine, Vec<EndpointId>) {
        let mut engine = Engine::new(config, Vec::new(), gitsu_core::AHashMap::new(), gitsu_core::AHashMap::new());
        let mut ids = Vec::new();
        for ep in candidates {
            let id = engine.arena.insert(ep);
            ids.push(id);
        }
        engine.resolved.insert(rid.to_string(), ids.clone());
        (engine, ids)
    }

    #[test]
    fn single_candidate_elects_unconditionally() {
        let (mut engine, ids) = engine_with(Config::default(), vec![versioned("a", "1.0.0")], "a");
        let outcome = dissect(&mut engine).unwrap();
        assert_eq!(outcome.elected.get("a"), Some(&ids[0]));
        assert_eq!(outcome.conflicted.get("a"), Some(&false));
    }

    #[test]
    fn incompatible_semvers_without_resolution_conflict() {
        let a = Endpoint::new("a", "^1.0.0", Some("a".into()));
        let b = Endpoint::new("a", "^2.0.0", Some("a".into()));
        let (mut engine, _) = engine_with(Config::default(), vec![a, b], "a");
        let err = dissect(&mut engine).unwrap_err();
        match err {
            Error::Conflict { picks } => assert_eq!(picks[0].candidates.len(), 2),
            other => panic!("expected Error::Conflict, got {other:?}"),
        }
    }

    #[test]
    fn force_latest_elects_highest_and_persists() {
        let config = Config { force_latest: true, ..Config::default() };
        let a = versioned("a", "1.0.0");
        let b = versioned("a", "2.0.0");
        let (mut engine, ids) = engine_with(config, vec![a, b], "a");
        let outcome = dissect(&mut engine).unwrap();
        assert_eq!(outcome.elected.get("a"), Some(&ids[1]));
        assert_eq!(outcome.resolutions.get("a").map(String::as_str), Some("2.0.0"));
    }

    #[test]
    fn stored_resolution_range_picks_satisfying_candidate() {
        let mut config = Config::default();
        config.force_latest = false;
        let a = versioned("a", "1.5.0");
        let b = versioned("a", "2.5.0");
        let (mut engine, ids) = engine_with(config, vec![a, b], "a");
        engine.resolutions.insert("a".to_string(), ">=1.0.0 <2.0.0".to_string());
        engine.conflicted.insert("a".to_string(), true);
        let outcome = dissect(&mut engine).unwrap();
        assert_eq!(outcome.elected.get("a"), Some(&ids[0]));
    }

    #[test]
    fn compatible_sibling_targets_elect_without_conflict() {
        // Two dependants request `a` via different ranges that both happen
        // to fetch the same release: this must elect cleanly, not conflict.
        let mut a = Endpoint::new("a", "^1.0.0", Some("a".into()));
        a.pkg_meta = Some(Manifest { name: Some("a".into()), version: Some("1.2.5".into()), ..Default::default() });
        let mut b = Endpoint::new("a", "~1.2.0", Some("a".into()));
        b.pkg_meta = Some(Manifest { name: Some("a".into()), version: Some("1.2.5".into()), ..Default::default() });
        let (mut engine, ids) = engine_with(Config::default(), vec![a, b], "a");
        let outcome = dissect(&mut engine).unwrap();
        let elected = *outcome.elected.get("a").expect("elected without a conflict");
        assert!(ids.contains(&elected));
    }

    #[test]
    fn newly_wildcard_target_is_promoted_to_tilde_version() {
        let mut a = Endpoint::new("a", "*", Some("a".into())).newly(true);
        a.pkg_meta = Some(Manifest { name: Some("a".into()), version: Some("1.4.0".into()), ..Default::default() });
        let (mut engine, ids) = engine_with(Config::default(), vec![a], "a");
        let outcome = dissect(&mut engine).unwrap();
        assert_eq!(outcome.elected.get("a"), Some(&ids[0]));
        assert_eq!(engine.arena.get(ids[0]).target, "~1.4.0");
        assert!(engine.arena.get(ids[0]).was_wildcard);
    }

    #[test]
    fn non_interactive_conflict_is_not_silently_elected_by_a_prompter() {
        struct DenyAll;
        impl ConflictPrompter for DenyAll {
            fn prompt(&self, _rid: &str, _candidates: &[String]) -> Option<usize> {
                None
            }
        }
        let config = Config { interactive: true, ..Config::default() };
        let a = Endpoint::new("a", "^1.0.0", Some("a".into()));
        let b = Endpoint::new("a", "^2.0.0", Some("a".into()));
        let (mut engine, _) = engine_with(config, vec![a, b], "a");
        engine.prompter = Some(Arc::new(DenyAll));
        let err = dissect(&mut engine).unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }
}
