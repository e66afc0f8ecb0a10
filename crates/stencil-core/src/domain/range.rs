//! npm-style version ranges.
//!
//! Package manifests use npm range syntax (`^1.2.0`, `>=1.0.0 <2.0.0`,
//! `1.x || 2.x`, `1.0.0 - 1.4.0`), which differs from Cargo's requirement
//! syntax in a few places (space-separated comparators, `||`, hyphen ranges,
//! bare versions meaning *exact*). [`NodeRange`] translates each `||`
//! alternative into a [`semver::VersionReq`] and answers the questions the
//! dependency merge needs: is it valid, does a version satisfy it, and do two
//! ranges overlap.

use std::cmp::Ordering;
use std::fmt;

use semver::{BuildMetadata, Comparator, Op, Prerelease, Version, VersionReq};

/// A parsed npm range: a union of comparator sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRange {
    raw: String,
    sets: Vec<VersionReq>,
}

impl NodeRange {
    /// Parse an npm range. Returns `None` when the text is not a range.
    pub fn parse(input: &str) -> Option<Self> {
        let sets = input
            .split("||")
            .map(parse_set)
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            raw: input.trim().to_owned(),
            sets,
        })
    }

    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `true` when `version` falls inside any alternative.
    pub fn satisfies(&self, version: &Version) -> bool {
        self.sets.iter().any(|req| req.matches(version))
    }

    /// Like [`Self::satisfies`], but prerelease versions are matched against
    /// the numeric bounds alone.
    pub fn satisfies_including_prerelease(&self, version: &Version) -> bool {
        if self.satisfies(version) {
            return true;
        }
        if version.pre.is_empty() {
            return false;
        }
        self.sets
            .iter()
            .map(set_interval)
            .any(|interval| interval.contains(version))
    }

    /// `true` when some version could satisfy both ranges.
    pub fn intersects(&self, other: &NodeRange) -> bool {
        self.sets.iter().any(|a| {
            let a = set_interval(a);
            other
                .sets
                .iter()
                .any(|b| a.intersect(&set_interval(b)).is_non_empty())
        })
    }
}

impl fmt::Display for NodeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ── parsing ───────────────────────────────────────────────────────────────────

const OPERATORS: [&str; 8] = [">=", "<=", "~>", ">", "<", "=", "~", "^"];

fn parse_set(part: &str) -> Option<VersionReq> {
    let part = part.trim();
    if part.is_empty() {
        return Some(VersionReq::STAR);
    }

    let comparators = match part.split_once(" - ") {
        Some((low, high)) => {
            let low = strip_wildcards(low.trim())?;
            let high = strip_wildcards(high.trim())?;
            let mut out = Vec::with_capacity(2);
            if low != "*" {
                out.push(format!(">={low}"));
            }
            if high != "*" {
                out.push(format!("<={high}"));
            }
            out
        }
        None => join_operator_tokens(part)
            .into_iter()
            .map(|token| translate_token(&token))
            .collect::<Option<Vec<_>>>()?,
    };

    let comparators: Vec<String> = comparators.into_iter().filter(|c| c != "*").collect();
    if comparators.is_empty() {
        return Some(VersionReq::STAR);
    }
    VersionReq::parse(&comparators.join(", ")).ok()
}

/// `>= 1.2.3` is one comparator written as two tokens.
fn join_operator_tokens(part: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending: Option<&str> = None;
    for token in part.split_whitespace() {
        match pending.take() {
            Some(op) => tokens.push(format!("{op}{token}")),
            None if OPERATORS.contains(&token) => pending = Some(token),
            None => tokens.push(token.to_owned()),
        }
    }
    if let Some(op) = pending {
        tokens.push(op.to_owned());
    }
    tokens
}

fn translate_token(token: &str) -> Option<String> {
    let (op, version) = split_operator(token);
    let version = strip_wildcards(version)?;
    let op = match op {
        "~>" => "~",
        "" => "=",
        other => other,
    };
    if version == "*" {
        // `>=*` and friends match everything, `<*` matches nothing.
        return match op {
            "<" | ">" => None,
            _ => Some("*".to_owned()),
        };
    }
    Some(format!("{op}{version}"))
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

/// Drop a `v` prefix and trailing `x`/`*` segments: `v1.2.x` → `1.2`.
fn strip_wildcards(version: &str) -> Option<String> {
    let version = version.trim();
    let version = version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('='))
        .unwrap_or(version);
    if version.is_empty() {
        return Some("*".to_owned());
    }

    let (core, suffix) = match version.find(['-', '+']) {
        Some(i) => version.split_at(i),
        None => (version, ""),
    };
    let mut segments = Vec::new();
    for segment in core.split('.') {
        if matches!(segment, "x" | "X" | "*") {
            break;
        }
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        segments.push(segment);
    }
    if segments.is_empty() {
        return Some("*".to_owned());
    }
    if segments.len() > 3 {
        return None;
    }
    Some(format!("{}{}", segments.join("."), suffix))
}

// ── interval arithmetic ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bound {
    Unbounded,
    Inclusive(Version),
    Exclusive(Version),
}

#[derive(Debug, Clone)]
struct Interval {
    lower: Bound,
    upper: Bound,
}

impl Interval {
    fn full() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    fn intersect(&self, other: &Interval) -> Interval {
        Interval {
            lower: tighter(&self.lower, &other.lower, Ordering::Greater),
            upper: tighter(&self.upper, &other.upper, Ordering::Less),
        }
    }

    fn is_non_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => true,
            (Bound::Inclusive(lo), Bound::Inclusive(hi)) => lo <= hi,
            (
                Bound::Inclusive(lo) | Bound::Exclusive(lo),
                Bound::Inclusive(hi) | Bound::Exclusive(hi),
            ) => lo < hi,
        }
    }

    fn contains(&self, v: &Version) -> bool {
        let numeric = Version::new(v.major, v.minor, v.patch);
        let above = match &self.lower {
            Bound::Unbounded => true,
            Bound::Inclusive(lo) => v >= lo,
            Bound::Exclusive(lo) => v > lo,
        };
        let below = match &self.upper {
            Bound::Unbounded => true,
            Bound::Inclusive(hi) => &numeric <= hi,
            Bound::Exclusive(hi) => &numeric < hi,
        };
        above && below
    }
}

/// Pick the more restrictive of two bounds. `wanted` is the ordering that
/// makes a version more restrictive (`Greater` for lower bounds).
fn tighter(a: &Bound, b: &Bound, wanted: Ordering) -> Bound {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        _ => {
            let (va, vb) = (bound_version(a), bound_version(b));
            match va.cmp(vb) {
                Ordering::Equal => {
                    if matches!(a, Bound::Exclusive(_)) {
                        a.clone()
                    } else {
                        b.clone()
                    }
                }
                ord if ord == wanted => a.clone(),
                _ => b.clone(),
            }
        }
    }
}

fn bound_version(b: &Bound) -> &Version {
    match b {
        Bound::Inclusive(v) | Bound::Exclusive(v) => v,
        Bound::Unbounded => unreachable!("unbounded handled by caller"),
    }
}

fn set_interval(req: &VersionReq) -> Interval {
    req.comparators
        .iter()
        .map(comparator_interval)
        .fold(Interval::full(), |acc, i| acc.intersect(&i))
}

fn version(major: u64, minor: u64, patch: u64, pre: Prerelease) -> Version {
    Version {
        major,
        minor,
        patch,
        pre,
        build: BuildMetadata::EMPTY,
    }
}

/// First version after every `major.*.*`. `None` past the largest major.
fn next_major(major: u64) -> Option<Version> {
    major.checked_add(1).map(|m| Version::new(m, 0, 0))
}

/// First version after every `major.minor.*`, carrying into the major.
fn next_minor(major: u64, minor: u64) -> Option<Version> {
    match minor.checked_add(1) {
        Some(m) => Some(Version::new(major, m, 0)),
        None => next_major(major),
    }
}

/// First version after `major.minor.patch`, carrying upwards.
fn next_patch(major: u64, minor: u64, patch: u64) -> Option<Version> {
    match patch.checked_add(1) {
        Some(p) => Some(Version::new(major, minor, p)),
        None => next_minor(major, minor),
    }
}

/// Upper bound strictly below `ceiling`; no ceiling leaves it open.
fn below(ceiling: Option<Version>) -> Bound {
    ceiling.map_or(Bound::Unbounded, Bound::Exclusive)
}

/// Bounds no version satisfies.
fn nothing() -> (Bound, Bound) {
    let top = Version::new(u64::MAX, u64::MAX, u64::MAX);
    (Bound::Exclusive(top.clone()), Bound::Inclusive(top))
}

fn comparator_interval(c: &Comparator) -> Interval {
    let floor = version(
        c.major,
        c.minor.unwrap_or(0),
        c.patch.unwrap_or(0),
        c.pre.clone(),
    );
    // First version past a partial comparator: `1.2` → `1.3.0`, `1` → `2.0.0`.
    let past_partial = match (c.minor, c.patch) {
        (None, _) => Some(next_major(c.major)),
        (Some(minor), None) => Some(next_minor(c.major, minor)),
        (Some(_), Some(_)) => None,
    };

    let (lower, upper) = match c.op {
        Op::Exact | Op::Wildcard => match past_partial {
            Some(ceiling) => (Bound::Inclusive(floor), below(ceiling)),
            None => (Bound::Inclusive(floor.clone()), Bound::Inclusive(floor)),
        },
        Op::Greater => match past_partial {
            Some(Some(ceiling)) => (Bound::Inclusive(ceiling), Bound::Unbounded),
            Some(None) => nothing(),
            None => (Bound::Exclusive(floor), Bound::Unbounded),
        },
        Op::GreaterEq => (Bound::Inclusive(floor), Bound::Unbounded),
        Op::Less => (Bound::Unbounded, Bound::Exclusive(floor)),
        Op::LessEq => match past_partial {
            Some(ceiling) => (Bound::Unbounded, below(ceiling)),
            None => (Bound::Unbounded, Bound::Inclusive(floor)),
        },
        Op::Tilde => {
            let ceiling = match c.minor {
                Some(minor) => next_minor(c.major, minor),
                None => next_major(c.major),
            };
            (Bound::Inclusive(floor), below(ceiling))
        }
        Op::Caret => {
            let ceiling = match (c.major, c.minor, c.patch) {
                (major, _, _) if major > 0 => next_major(major),
                (_, None, _) => next_major(0),
                (_, Some(minor), _) if minor > 0 => next_minor(0, minor),
                (_, Some(_), None) => next_minor(0, 0),
                (_, Some(minor), Some(patch)) => next_patch(0, minor, patch),
            };
            (Bound::Inclusive(floor), below(ceiling))
        }
        _ => (Bound::Unbounded, Bound::Unbounded),
    };
    Interval { lower, upper }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(s: &str) -> NodeRange {
        NodeRange::parse(s).unwrap_or_else(|| panic!("{s} should parse"))
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn accepts_npm_syntax() {
        for ok in [
            "^17.0.0",
            "~1.2.3",
            ">=1.0.0 <2.0.0",
            ">= 1.0.0",
            "1.x || 2.x",
            "1.0.0 - 1.4.0",
            "*",
            "",
            "x",
            "v1.2.3",
            "1.2",
            "^0.0.3",
            "2.0.0-beta.1",
        ] {
            assert!(NodeRange::is_valid(ok), "{ok} should be valid");
        }
    }

    #[test]
    fn rejects_non_ranges() {
        for bad in ["latest", "owner/repo", "git+https://x/y.git", "1.2.3.4", "^^1", "next"] {
            assert!(!NodeRange::is_valid(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn bare_version_is_exact() {
        let r = range("1.2.3");
        assert!(r.satisfies(&v("1.2.3")));
        assert!(!r.satisfies(&v("1.2.4")));
    }

    #[test]
    fn partial_bare_version_is_a_wildcard() {
        let r = range("1.2");
        assert!(r.satisfies(&v("1.2.9")));
        assert!(!r.satisfies(&v("1.3.0")));
    }

    #[test]
    fn union_and_hyphen_ranges() {
        let r = range("^1.0.0 || ^3.0.0");
        assert!(r.satisfies(&v("3.4.0")));
        assert!(!r.satisfies(&v("2.0.0")));

        let h = range("1.0.0 - 1.4.0");
        assert!(h.satisfies(&v("1.4.0")));
        assert!(!h.satisfies(&v("1.4.1")));
    }

    #[test]
    fn disjoint_majors_do_not_intersect() {
        assert!(!range("^17.0.0").intersects(&range("^16.0.0")));
        assert!(!range("~1.2.0").intersects(&range("~1.3.0")));
    }

    #[test]
    fn overlapping_ranges_intersect() {
        assert!(range("^1.2.0").intersects(&range("~1.4.0")));
        assert!(range(">=1.0.0 <2.0.0").intersects(&range("1.5.0")));
        assert!(range("*").intersects(&range("^9.0.0")));
        assert!(range("^0.2.0 || ^4.0.0").intersects(&range(">=4.1.0")));
    }

    #[test]
    fn touching_bounds() {
        assert!(range("<=1.0.0").intersects(&range(">=1.0.0")));
        assert!(!range("<1.0.0").intersects(&range(">=1.0.0")));
    }

    #[test]
    fn caret_on_zero_major_is_narrow() {
        assert!(!range("^0.2.0").intersects(&range("^0.3.0")));
        assert!(!range("^0.0.3").intersects(&range("0.0.4")));
    }

    #[test]
    fn largest_components_do_not_overflow() {
        let top = range("^18446744073709551615.0.0");
        assert!(!top.intersects(&range("^1.0.0")));
        assert!(top.intersects(&range(">=18446744073709551615.2.0")));
        assert!(top.satisfies(&v("18446744073709551615.3.1")));

        assert!(range("~1.18446744073709551615.0").intersects(&range("1.18446744073709551615.7")));
        assert!(!range("~1.18446744073709551615.0").intersects(&range("^2.0.0")));
        assert!(!range("^0.0.18446744073709551615").intersects(&range("^0.1.0")));
        assert!(!range(">18446744073709551615").intersects(&range("*")));
    }

    #[test]
    fn prerelease_matching_can_be_relaxed() {
        let r = range("^0.1.0-0");
        assert!(r.satisfies_including_prerelease(&v("0.1.0")));
        let r = range("^1.0.0");
        assert!(!r.satisfies(&v("1.2.0-beta.1")));
        assert!(r.satisfies_including_prerelease(&v("1.2.0-beta.1")));
    }
}
