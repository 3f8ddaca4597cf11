//! The Compatibility Oracle (spec §4.2): decides whether two endpoints
//! referring to the same logical package can share a single resolved
//! revision.

use crate::endpoint::Target;
use semver::Version;

/// Decide whether `candidate_target` can reuse a revision already resolved
/// under `resolved_target`, given the resolved revision's parsed version
/// (`resolved_version`, `None` if that revision has no semver version).
///
/// This is the decision table from spec §4.2, verbatim: equal raw strings
/// always match; otherwise an exact version must equal the resolved
/// version; a range must contain it; and two unversioned ranges are
/// compatible only when they share the same [`highest-cap`][hc].
///
/// [hc]: crate::version::VersionRange::highest_cap
///
/// Design note (b) is preserved deliberately: two upper-bounded ranges that
/// share a cap but differ in their lower bound are considered compatible.
#[must_use]
pub fn are_compatible(
    candidate_target: &str,
    resolved_target: &str,
    resolved_version: Option<&Version>,
) -> bool {
    if candidate_target == resolved_target {
        return true;
    }

    let candidate = Target::parse(candidate_target);

    if let Some(version) = resolved_version {
        return match candidate {
            Target::Version(x) => &x == version,
            Target::Range(r) => r.satisfies(version),
            Target::Other(_) => false,
        };
    }

    let resolved = Target::parse(resolved_target);
    match (candidate, resolved) {
        (Target::Version(x), Target::Version(y)) => x == y,
        (Target::Version(x), Target::Range(r)) => r.satisfies(&x),
        (Target::Range(r), Target::Version(y)) => r.satisfies(&y),
        (Target::Range(r1), Target::Range(r2)) => r1.highest_cap() == r2.highest_cap(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_are_always_compatible() {
        assert!(are_compatible("dev-master", "dev-master", None));
    }

    #[test]
    fn reflexive_when_targets_match() {
        assert!(are_compatible("^1.0.0", "^1.0.0", None));
    }

    #[test]
    fn exact_versions_must_match_exactly() {
        assert!(are_compatible("1.0.0", "1.0.0", None));
        assert!(!are_compatible("1.0.0", "1.0.1", None));
    }

    #[test]
    fn version_against_range_checks_containment() {
        assert!(are_compatible("1.5.0", "^1.0.0", None));
        assert!(!are_compatible("2.0.0", "^1.0.0", None));
        // symmetric in the no-version case
        assert!(are_compatible("^1.0.0", "1.5.0", None));
        assert!(!are_compatible("^1.0.0", "2.0.0", None));
    }

    #[test]
    fn ranges_with_same_highest_cap_are_compatible() {
        // Both expand to an exclusive upper bound of 2.0.0, even though one
        // is a caret range and the other is written out explicitly.
        assert!(are_compatible("^1.5.0", ">=1.0.0, <2.0.0", None));
    }

    #[test]
    fn caret_and_tilde_with_different_effective_caps_are_not_compatible() {
        // ^1.0.0 caps at <2.0.0; ~1.2.0 caps at <1.3.0 — they do not share a
        // cap even though both tokens mention "1".
        assert!(!are_compatible("^1.0.0", "~1.2.0", None));
    }

    #[test]
    fn ranges_with_different_caps_are_not_compatible() {
        assert!(!are_compatible("^1.0.0", "^2.0.0", None));
    }

    #[test]
    fn resolved_version_wins_over_resolved_target_shape() {
        // resolved.target is a branch name, but a version is already known.
        assert!(are_compatible(
            "^1.0.0",
            "dev-master",
            Some(&Version::new(1, 2, 0))
        ));
        assert!(!are_compatible(
            "^2.0.0",
            "dev-master",
            Some(&Version::new(1, 2, 0))
        ));
    }

    #[test]
    fn branch_names_are_incompatible_unless_identical() {
        assert!(!are_compatible("dev-feature", "dev-master", None));
    }
}
