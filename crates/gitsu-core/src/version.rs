//! `npm`-style semver range handling, built on top of [`semver`].
//!
//! A [`VersionRange`] is an OR-list of `semver::VersionReq` alternatives: each
//! `||`-separated clause is itself an AND-list of comparators, which is
//! exactly what `semver::VersionReq` already represents. `^`, `~`, bare
//! versions, and `x`/`*` partial versions are normalized into comparator
//! syntax `semver::VersionReq` understands before parsing.

use semver::{Comparator, Op, Version, VersionReq};
use std::cmp::Ordering;
use std::fmt;

/// A parsed version range (possibly a union of several alternatives).
#[derive(Debug, Clone)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

/// The effective upper bound of a range: the highest version mentioned by
/// any comparator, together with the comparator prefix that bounds it.
///
/// `^` and `~` comparators are expanded to the base comparator set
/// (`<`, `<=`, `=`, `>=`, `>`) they desugar to before the cap is taken, so
/// `^1.2.3` contributes `<2.0.0` and `~1.2.3` contributes `<1.3.0` rather
/// than comparing the literal caret/tilde token.
///
/// Two ranges are considered compatible by the Compatibility Oracle when
/// their caps are equal — this is the `highest-cap` rule from the spec; it
/// intentionally only looks at the *maximum* token, so two ranges that
/// differ only in their lower bound are still treated as compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cap {
    op: Op,
    version: (u64, u64, u64),
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl Eq for VersionRange {}

impl VersionRange {
    /// The range that matches every version (`*`).
    #[must_use]
    pub fn any() -> Self {
        Self {
            raw: "*".to_string(),
            alternatives: vec![VersionReq::STAR],
        }
    }

    /// Raw string this range was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parse an `npm`-style range string. Returns `None` if `s` cannot be
    /// interpreted as a semver range at all (e.g. it is a branch name).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if s == "*" {
            return Some(Self::any());
        }

        let mut alternatives = Vec::new();
        for clause in split_or(s) {
            let normalized = normalize_and_clause(clause)?;
            let req = VersionReq::parse(&normalized).ok()?;
            alternatives.push(req);
        }
        if alternatives.is_empty() {
            return None;
        }

        Some(Self {
            raw: s.to_string(),
            alternatives,
        })
    }

    /// Whether `version` satisfies any alternative of this range.
    #[must_use]
    pub fn satisfies(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// The highest-cap of this range: the maximum of each comparator
    /// token's effective upper bound (caret/tilde expanded per [`Cap`]).
    #[must_use]
    pub fn highest_cap(&self) -> Option<Cap> {
        self.alternatives
            .iter()
            .flat_map(|req| req.comparators.iter())
            .filter_map(comparator_cap)
            .max_by(|a, b| a.version.cmp(&b.version))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn comparator_cap(c: &Comparator) -> Option<Cap> {
    let major = c.major;
    let minor = c.minor.unwrap_or(0);
    let patch = c.patch.unwrap_or(0);
    match c.op {
        Op::Caret => Some(Cap { op: Op::Less, version: caret_bound(major, minor, patch) }),
        Op::Tilde => Some(Cap { op: Op::Less, version: tilde_bound(major, minor) }),
        other => Some(Cap { op: other, version: (major, minor, patch) }),
    }
}

/// The exclusive upper bound `^major.minor.patch` allows (the first "next
/// breaking" version: bumps the leftmost nonzero component).
fn caret_bound(major: u64, minor: u64, patch: u64) -> (u64, u64, u64) {
    if major > 0 {
        (major + 1, 0, 0)
    } else if minor > 0 {
        (0, minor + 1, 0)
    } else {
        (0, 0, patch + 1)
    }
}

/// The exclusive upper bound `~major.minor.patch` allows (bumps minor).
fn tilde_bound(major: u64, minor: u64) -> (u64, u64, u64) {
    (major, minor + 1, 0)
}

impl PartialOrd for Cap {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.version.cmp(&other.version))
    }
}
impl Ord for Cap {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

/// Split on top-level `||` (there is no nesting in `npm` ranges).
fn split_or(s: &str) -> Vec<&str> {
    s.split("||").map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// Normalize one AND-clause (comma or space separated comparators, possibly
/// `^`/`~`/wildcard-prefixed) into syntax `semver::VersionReq` accepts.
fn normalize_and_clause(clause: &str) -> Option<String> {
    let clause = clause.trim();

    // Multiple comparators may be separated by commas, whitespace, or both
    // ("1.0.0 <2.0.0" and "1.0.0, <2.0.0" are equivalent) — split into
    // individual tokens and normalize each independently.
    let tokens: Vec<&str> = clause
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if tokens.len() > 1 {
        let parts: Vec<String> = tokens
            .into_iter()
            .map(normalize_and_clause)
            .collect::<Option<_>>()?;
        return Some(parts.join(", "));
    }
    let token = tokens.first().copied().unwrap_or(clause);

    if let Some(rest) = token.strip_prefix('^') {
        return Some(format!("^{}", normalize_version(rest)?));
    }
    if let Some(rest) = token.strip_prefix('~') {
        return Some(format!("~{}", normalize_version(rest)?));
    }
    if token.starts_with(">=")
        || token.starts_with("<=")
        || token.starts_with('>')
        || token.starts_with('<')
        || token.starts_with('=')
    {
        return Some(token.to_string());
    }

    // `x`/`*` partial versions: "3", "3.x", "3.1.*" all become bounded ranges.
    if is_wildcard_partial(token) {
        return normalize_wildcard(token);
    }

    // Bare version is an exact match.
    Some(format!("={}", normalize_version(token)?))
}

fn is_wildcard_partial(s: &str) -> bool {
    s.ends_with(".*") || s.ends_with(".x") || s == "*" || {
        // bare "3" or "3.1" (no operator prefix, fewer than 3 components)
        s.chars().next().is_some_and(|c| c.is_ascii_digit())
            && s.matches('.').count() < 2
            && !s.contains(',')
    }
}

fn normalize_wildcard(s: &str) -> Option<String> {
    let stripped = s
        .trim_end_matches(".*")
        .trim_end_matches(".x")
        .trim_end_matches('*');
    let parts: Vec<&str> = stripped.split('.').filter(|p| !p.is_empty()).collect();
    match parts.len() {
        0 => Some("*".to_string()),
        1 => {
            let major: u64 = parts[0].parse().ok()?;
            Some(format!(">={major}.0.0, <{}.0.0", major + 1))
        }
        2 => {
            let major: u64 = parts[0].parse().ok()?;
            let minor: u64 = parts[1].parse().ok()?;
            Some(format!(
                ">={major}.{minor}.0, <{major}.{}.0",
                minor + 1
            ))
        }
        _ => Some(stripped.to_string()),
    }
}

fn normalize_version(v: &str) -> Option<String> {
    let v = v.trim().trim_start_matches('v');
    if v.is_empty() {
        return None;
    }
    let dots = v.chars().filter(|&c| c == '.').count();
    Some(match dots {
        0 => format!("{v}.0.0"),
        1 => format!("{v}.0"),
        _ => v.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u64, minor: u64, patch: u64) -> Version {
        Version::new(major, minor, patch)
    }

    #[test]
    fn wildcard_matches_everything() {
        let r = VersionRange::any();
        assert!(r.satisfies(&v(0, 0, 0)));
        assert!(r.satisfies(&v(99, 99, 99)));
    }

    #[test]
    fn major_wildcard() {
        let r = VersionRange::parse("3.*").unwrap();
        assert!(r.satisfies(&v(3, 11, 0)));
        assert!(!r.satisfies(&v(4, 0, 0)));
        assert!(!r.satisfies(&v(2, 9, 9)));
    }

    #[test]
    fn caret_and_tilde() {
        let caret = VersionRange::parse("^1.2.3").unwrap();
        assert!(caret.satisfies(&v(1, 9, 0)));
        assert!(!caret.satisfies(&v(2, 0, 0)));

        let tilde = VersionRange::parse("~1.2.3").unwrap();
        assert!(tilde.satisfies(&v(1, 2, 9)));
        assert!(!tilde.satisfies(&v(1, 3, 0)));
    }

    #[test]
    fn or_range_matches_either_alternative() {
        let r = VersionRange::parse("^1.0.0 || ^2.0.0").unwrap();
        assert!(r.satisfies(&v(1, 5, 0)));
        assert!(r.satisfies(&v(2, 5, 0)));
        assert!(!r.satisfies(&v(3, 0, 0)));
    }

    #[test]
    fn and_range_bounds_both_sides() {
        let r = VersionRange::parse(">=1.0.0, <2.0.0").unwrap();
        assert!(r.satisfies(&v(1, 9, 9)));
        assert!(!r.satisfies(&v(2, 0, 0)));
        assert!(!r.satisfies(&v(0, 9, 0)));
    }

    #[test]
    fn highest_cap_ignores_lower_bound() {
        let a = VersionRange::parse(">=1.0.0 <3.0.0").unwrap();
        let b = VersionRange::parse(">=2.0.0 <3.0.0").unwrap();
        assert_eq!(a.highest_cap(), b.highest_cap());
    }

    #[test]
    fn highest_cap_differs_on_upper_bound() {
        let a = VersionRange::parse("^1.0.0").unwrap();
        let b = VersionRange::parse("^2.0.0").unwrap();
        assert_ne!(a.highest_cap(), b.highest_cap());
    }
}
