//! The Endpoint Model (spec §4.1): an unresolved or resolved dependency
//! specification, plus the identity tuple derived from it.
//!
//! Endpoints live in an arena owned by the Fetch Coordinator
//! (`gitsu-resolver::graph::EndpointArena`) and refer to each other by
//! [`EndpointId`] rather than by pointer, so that a rename — which changes
//! an endpoint's identity — never invalidates a reference held elsewhere
//! (spec §9, "Mutable identity keys").

use crate::manifest::Manifest;
use ahash::AHashMap;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Opaque handle to an [`Endpoint`] stored in an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointId(pub u64);

/// A dependency specification, resolved or not.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Opaque transport address.
    pub source: String,
    /// Requested revision: semver range, exact version, branch/tag, or `*`.
    pub target: String,
    /// Logical name, if known (may be guessed from `source` or learned from
    /// the fetched manifest).
    pub name: Option<String>,
    /// `name` as first requested, before any manifest-driven rename.
    pub initial_name: Option<String>,
    /// The name this endpoint was renamed *from*, if it was ever renamed.
    pub old_name: Option<String>,
    /// Manifest contents after a successful fetch.
    pub pkg_meta: Option<Manifest>,
    /// The materialized source directory produced by the external resolver.
    pub canonical_dir: Option<PathBuf>,
    /// Endpoints that depend on this one.
    pub dependants: BTreeSet<EndpointId>,
    /// Declared dependency key -> child endpoint.
    pub dependencies: AHashMap<String, EndpointId>,
    /// Set on user-added top-level targets.
    pub newly: bool,
    /// Propagates from a parent that was itself unresolvable; blocks stored
    /// resolution application (spec §3).
    pub unresolvable: bool,
    /// The resolver cannot choose among revisions for this source.
    pub untargetable: bool,
    /// Installed out-of-tree; skip deployment.
    pub linked: bool,
    /// Set when dissect promoted this endpoint's target from `*` to
    /// `~<version>` (spec §4.4 step 3); `storeResolution` needs this to
    /// recover the original wildcard once `target` no longer reads `*`.
    pub was_wildcard: bool,
}

impl Endpoint {
    /// Construct a new, unfetched endpoint.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, name: Option<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            initial_name: name.clone(),
            name,
            old_name: None,
            pkg_meta: None,
            canonical_dir: None,
            dependants: BTreeSet::new(),
            dependencies: AHashMap::new(),
            newly: false,
            unresolvable: false,
            untargetable: false,
            linked: false,
            was_wildcard: false,
        }
    }

    /// Mark this endpoint as newly requested by the caller (enables
    /// wildcard -> `~version` promotion at dissect time).
    #[must_use]
    pub fn newly(mut self, newly: bool) -> Self {
        self.newly = newly;
        self
    }

    /// Compute this endpoint's identity tuple. Recomputed on demand rather
    /// than cached, so a rename can never leave a stale identity lying
    /// around in a table key (spec §9).
    #[must_use]
    pub fn identity(&self) -> Identity {
        let rid = self.name.clone().unwrap_or_else(|| normalize_source(&self.source));
        let fid = format!("{}#{}", normalize_source(&self.source), self.target);
        let id = (
            self.name.clone().unwrap_or_default(),
            self.source.clone(),
            self.target.clone(),
        );
        Identity { rid, fid, id }
    }

    /// Rename this endpoint, recording the previous name. Callers must
    /// re-key any table indexed by the old identity's `rid`/`fid`.
    pub fn rename(&mut self, new_name: impl Into<String>) {
        let new_name = new_name.into();
        if self.name.as_deref() != Some(new_name.as_str()) {
            self.old_name = self.name.take();
            self.name = Some(new_name);
        }
    }

    /// Union `other` into `self`'s dependants (set-union by identity).
    pub fn merge_dependants(&mut self, other: &Endpoint) {
        self.dependants.extend(other.dependants.iter().copied());
    }

    /// Two endpoints compare equal by requested target — used to dedup the
    /// target list before a `resolve()` call (spec §4.1).
    #[must_use]
    pub fn same_target(&self, other: &Endpoint) -> bool {
        self.target == other.target
    }
}

/// The derived identity tuple for an [`Endpoint`] (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Resolved-table key: `name` if known, else a normalized `source`.
    pub rid: String,
    /// Fetch-table dedup key: `source` + requested `target`.
    pub fid: String,
    /// Target-list dedup key: `(name, source, target)`.
    pub id: (String, String, String),
}

/// A parsed requested revision, used by the Compatibility Oracle.
#[derive(Debug, Clone)]
pub enum Target {
    /// An exact semver version.
    Version(semver::Version),
    /// A semver range (including the wildcard `*`).
    Range(crate::version::VersionRange),
    /// A branch, tag, commit, or other string the engine treats opaquely.
    Other(String),
}

impl Target {
    /// Parse a requested target string into its most specific form.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed != "*" {
            let stripped = trimmed.trim_start_matches('v');
            if let Ok(version) = semver::Version::parse(stripped) {
                return Self::Version(version);
            }
        }
        if let Some(range) = crate::version::VersionRange::parse(trimmed) {
            return Self::Range(range);
        }
        Self::Other(trimmed.to_string())
    }
}

/// Normalize a source string for use as an `rId` fallback: trim whitespace,
/// lowercase, and strip a trailing `.git` or `/`.
#[must_use]
pub fn normalize_source(source: &str) -> String {
    let s = source.trim().to_ascii_lowercase();
    let s = s.strip_suffix('/').unwrap_or(&s);
    let s = s.strip_suffix(".git").unwrap_or(s);
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_falls_back_to_normalized_source_without_name() {
        let ep = Endpoint::new("https://example.com/Repo.git", "*", None);
        assert_eq!(ep.identity().rid, "https://example.com/repo");
    }

    #[test]
    fn identity_uses_name_when_known() {
        let ep = Endpoint::new("repo", "1.0.0", Some("foo".into()));
        assert_eq!(ep.identity().rid, "foo");
    }

    #[test]
    fn fid_distinguishes_same_source_different_target() {
        let a = Endpoint::new("repo", "^1.0.0", None);
        let b = Endpoint::new("repo", "^2.0.0", None);
        assert_ne!(a.identity().fid, b.identity().fid);
    }

    #[test]
    fn rename_records_old_name_and_changes_rid() {
        let mut ep = Endpoint::new("repo", "v1", Some("bar".into()));
        assert_eq!(ep.identity().rid, "bar");
        ep.rename("foo");
        assert_eq!(ep.old_name.as_deref(), Some("bar"));
        assert_eq!(ep.identity().rid, "foo");
    }

    #[test]
    fn rename_without_prior_name_leaves_old_name_unset() {
        let mut ep = Endpoint::new("repo", "v1", None);
        ep.rename("foo");
        assert_eq!(ep.old_name, None);
        assert_eq!(ep.identity().rid, "foo");
    }

    #[test]
    fn rename_is_a_noop_when_name_already_matches() {
        let mut ep = Endpoint::new("repo", "v1", Some("foo".into()));
        ep.rename("foo");
        assert_eq!(ep.old_name, None);
    }

    #[test]
    fn target_parse_distinguishes_version_range_and_other() {
        assert!(matches!(Target::parse("1.2.3"), Target::Version(_)));
        assert!(matches!(Target::parse("^1.2.3"), Target::Range(_)));
        assert!(matches!(Target::parse("*"), Target::Range(_)));
        assert!(matches!(Target::parse("feature/x"), Target::Other(_)));
    }
}
