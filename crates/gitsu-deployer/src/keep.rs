//! Keep-set computation (spec §4.5): which relative paths under a
//! component's destination survive a redeploy untouched.

use gitsu_core::Manifest;
use std::collections::BTreeSet;
use std::path::Path;

/// The literal file every component keeps regardless of its manifest.
const CUSTOM_MANIFEST: &str = "gitsu.custom.json";

/// Union the `keep` arrays from the existing install (if any) and the
/// incoming manifest, plus the sub-path segment of every other elected
/// endpoint whose `rId` nests under `rid`.
#[must_use]
pub fn compute_keep_set(
    existing: Option<&Manifest>,
    incoming: &Manifest,
    rid: &str,
    all_elected_rids: &[String],
) -> Vec<String> {
    let mut keep: BTreeSet<String> = BTreeSet::new();

    if let Some(manifest) = existing {
        keep.extend(manifest.keep.iter().cloned());
    }
    keep.extend(incoming.keep.iter().cloned());
    keep.insert(CUSTOM_MANIFEST.to_string());

    let prefix = format!("{rid}/");
    for other in all_elected_rids {
        if other != rid
            && let Some(sub_path) = other.strip_prefix(&prefix)
        {
            keep.insert(sub_path.to_string());
        }
    }

    keep.into_iter().collect()
}

/// Compile keep-globs into matchable patterns, skipping any malformed
/// pattern rather than failing the whole deploy.
#[must_use]
pub fn compile_patterns(keep: &[String]) -> Vec<glob::Pattern> {
    keep.iter().filter_map(|p| glob::Pattern::new(p).ok()).collect()
}

/// Whether `relative_path` matches any of `patterns`.
#[must_use]
pub fn matches_any(patterns: &[glob::Pattern], relative_path: &Path) -> bool {
    patterns.iter().any(|p| p.matches_path(relative_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_set_always_includes_custom_manifest() {
        let incoming = Manifest::default();
        let keep = compute_keep_set(None, &incoming, "a", &[]);
        assert!(keep.contains(&CUSTOM_MANIFEST.to_string()));
    }

    #[test]
    fn keep_set_unions_existing_and_incoming() {
        let existing = Manifest { keep: vec!["config.local.json".into()], ..Default::default() };
        let incoming = Manifest { keep: vec!["data/".into()], ..Default::default() };
        let keep = compute_keep_set(Some(&existing), &incoming, "a", &[]);
        assert!(keep.contains(&"config.local.json".to_string()));
        assert!(keep.contains(&"data/".to_string()));
    }

    #[test]
    fn keep_set_includes_nested_elected_endpoints() {
        let incoming = Manifest::default();
        let all = vec!["a".to_string(), "a/b".to_string(), "c".to_string()];
        let keep = compute_keep_set(None, &incoming, "a", &all);
        assert!(keep.contains(&"b".to_string()));
        assert!(!keep.contains(&"c".to_string()));
    }

    #[test]
    fn glob_pattern_matches_nested_path() {
        let patterns = compile_patterns(&["data/*.json".to_string()]);
        assert!(matches_any(&patterns, Path::new("data/a.json")));
        assert!(!matches_any(&patterns, Path::new("data/a.txt")));
    }
}
