//! The `gitsu.json` manifest schema: fields the core reads and the fields
//! the Deployer annotates after installation (spec §6 "Manifest schema").

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A `gitsu.json` document, as read from a fetched component and as written
/// back by the Deployer with installation annotations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Manifest {
    /// Logical package name. May differ from the name an endpoint was
    /// requested under, triggering a rename (spec §4.3, `onFetchSuccess`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Semver version string, if this revision is versioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Runtime dependencies, keyed by logical name.
    pub dependencies: AHashMap<String, String>,

    /// Development-only dependencies, expanded unless `config.production`.
    #[serde(rename = "devDependencies")]
    pub dev_dependencies: AHashMap<String, String>,

    /// Glob patterns excluded from the deployed tree.
    pub ignore: Vec<String>,

    /// Glob patterns that must survive redeployment (the "keep list").
    pub keep: Vec<String>,

    /// Package entry point, relative to the component root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    // ---- Deployer annotations (written, not read from the fetched source) ----
    /// The resolver-consumed source string that produced this install.
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// The elected target (version, range, release tag, or `*`).
    #[serde(rename = "_target", skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// The original requested source, preserved across renames.
    #[serde(rename = "_originalSource", skip_serializing_if = "Option::is_none")]
    pub original_source: Option<String>,

    /// Release tag reported by the resolver, used when the target was `*`.
    #[serde(rename = "_release", skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    /// What kind of resolution elected this revision.
    #[serde(rename = "_resolution", skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionAnnotation>,

    /// Set when this endpoint was a user-added top-level target.
    #[serde(rename = "_direct", skip_serializing_if = "Option::is_none")]
    pub direct: Option<bool>,
}

impl Manifest {
    /// Parse the `version` field as a [`semver::Version`], if present and
    /// valid semver.
    #[must_use]
    pub fn semver(&self) -> Option<semver::Version> {
        self.version.as_deref().and_then(|v| {
            let v = v.trim().trim_start_matches('v');
            semver::Version::parse(v).ok()
        })
    }
}

/// The kind of resolution that elected a package revision, recorded in the
/// `_resolution` annotation for diagnostics on the next run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionAnnotation {
    /// Elected by exact version match.
    Version,
    /// Elected by range intersection.
    Range,
    /// Elected because the target was the wildcard `*`.
    Wildcard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_manifest() {
        let json = r#"{"name":"a","version":"1.0.0"}"#;
        let manifest: Manifest = crate::from_json(json).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("a"));
        assert_eq!(manifest.semver(), Some(semver::Version::new(1, 0, 0)));
    }

    #[test]
    fn missing_optional_fields_default_empty() {
        let json = r#"{"name":"a"}"#;
        let manifest: Manifest = crate::from_json(json).unwrap();
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.keep.is_empty());
        assert_eq!(manifest.semver(), None);
    }

    #[test]
    fn v_prefixed_version_still_parses() {
        let json = r#"{"name":"a","version":"v2.1.0"}"#;
        let manifest: Manifest = crate::from_json(json).unwrap();
        assert_eq!(manifest.semver(), Some(semver::Version::new(2, 1, 0)));
    }

    #[test]
    fn annotations_round_trip() {
        let mut manifest = Manifest {
            name: Some("a".into()),
            ..Default::default()
        };
        manifest.target = Some("^1.0.0".into());
        manifest.resolution = Some(ResolutionAnnotation::Range);
        let json = crate::to_json(&manifest).unwrap();
        let back: Manifest = crate::from_json(&json).unwrap();
        assert_eq!(back.target.as_deref(), Some("^1.0.0"));
        assert_eq!(back.resolution, Some(ResolutionAnnotation::Range));
    }
}
