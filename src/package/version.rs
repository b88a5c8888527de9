//! Version ordering for Debian package versions.
//!
//! A version is reduced to a floating point comparison key plus a release
//! (packaging revision) token. The key is built from the upstream part only:
//!
//! - The upstream string must start with a digit and may contain ASCII
//!   letters, digits and the characters `. + _ - ~`.
//! - Runs of digits before the first letter or `~` are numeric segments.
//!   `. + _ -` only separate segments. Segment `i` contributes
//!   `value / 1000^i`, so `1.10` (1.010) sorts after `1.9` (1.009). Later
//!   segments saturate at 999 and only the first four segments count;
//!   `1.0` and `1.0.0` share a key.
//! - Everything from the first letter or `~` on is a suffix. Its first letter
//!   (`a`=1 .. `z`=26) and the first digit run after it (capped at 99) give a
//!   score `s` in `[0, 1)`. A suffix introduced by `~` is a pre-release and
//!   moves the key into `(base - 1e-10, base)`; any other suffix moves it
//!   into `(base, base + 1e-10)`. So `2.0~rc1 < 2.0 < 2.0a < 2.0.0.1`.
//! - Resolution is exact for the usual shapes (small leading segment, a
//!   handful of components). Very large leading segments such as dates leave
//!   fewer significant digits for the trailing segments and the suffix.
//!
//! Versions whose keys collide are ordered by their full segment list
//! (trailing zeros dropped) and then by the whole suffix, so two versions
//! only compare equal when their normalized upstreams are identical.
//!
//! The release is compared separately. An absent release is a wildcard that
//! matches any release of the same upstream version. The epoch is carried
//! along but never compared.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::RepoError;

const SEGMENT_BASE: f64 = 1000.0;
const MAX_SEGMENT: u64 = 999;
const MAX_SEGMENTS: usize = 4;
/// Below the weight of the last counted segment (1e-9).
const SUFFIX_WEIGHT: f64 = 1e-10;
const WILDCARD: &str = "*";

/// Convert an upstream version string into its comparison key.
pub fn parse_version(raw: &str) -> Result<f64, RepoError> {
    let (segments, suffix) = split_upstream(raw)?;

    let mut key = 0.0;
    for (i, value) in segments.iter().take(MAX_SEGMENTS).enumerate() {
        let value = if i > 0 && *value > MAX_SEGMENT {
            log::debug!("Segment {} of '{}' saturated at {}", i, raw, MAX_SEGMENT);
            MAX_SEGMENT
        } else {
            *value
        };
        key += value as f64 / SEGMENT_BASE.powi(i as i32);
    }

    if !suffix.is_empty() {
        let score = suffix_score(suffix);
        if suffix.starts_with('~') {
            key -= SUFFIX_WEIGHT * (1.0 - score);
        } else {
            key += SUFFIX_WEIGHT * score;
        }
    }

    Ok(key)
}

/// Validate an upstream string and split it into its numeric segments and
/// the suffix starting at the first letter or `~`.
fn split_upstream(raw: &str) -> Result<(Vec<u64>, &str), RepoError> {
    let upstream = raw.trim();
    let first = upstream
        .chars()
        .next()
        .ok_or_else(|| RepoError::malformed_version(raw, "empty version"))?;
    if !first.is_ascii_digit() {
        return Err(RepoError::malformed_version(
            raw,
            "version must start with a digit",
        ));
    }
    if let Some(bad) = upstream
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '_' | '-' | '~')))
    {
        return Err(RepoError::malformed_version(
            raw,
            format!("unexpected character '{}'", bad),
        ));
    }

    let mut segments: Vec<u64> = Vec::new();
    let mut current: Option<u64> = None;
    let mut suffix = "";

    for (i, c) in upstream.char_indices() {
        if let Some(digit) = c.to_digit(10) {
            let value = current.unwrap_or(0);
            current = Some(value.saturating_mul(10).saturating_add(u64::from(digit)));
        } else if c == '~' || c.is_ascii_alphabetic() {
            suffix = &upstream[i..];
            break;
        } else if let Some(value) = current.take() {
            segments.push(value);
        }
    }
    if let Some(value) = current {
        segments.push(value);
    }
    Ok((segments, suffix))
}

/// Score a suffix into `[0, 1)` from its first letter and first number.
fn suffix_score(suffix: &str) -> f64 {
    let number = suffix_number(suffix).min(99) as f64;
    (suffix_letter(suffix) as f64 + number / 100.0) / 27.0
}

/// `a`=1 .. `z`=26, 0 without a letter.
fn suffix_letter(suffix: &str) -> u8 {
    suffix
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase() as u8 - b'a' + 1)
        .unwrap_or(0)
}

/// First digit run of the suffix, saturating.
fn suffix_number(suffix: &str) -> u64 {
    suffix
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .map_while(|c| c.to_digit(10))
        .fold(0u64, |n, d| n.saturating_mul(10).saturating_add(u64::from(d)))
}

/// Exact order of two suffixes, refining [`suffix_score`]: `~` suffixes
/// first, then no suffix, then the rest, each by letter, number and text.
fn suffix_cmp(a: &str, b: &str) -> Ordering {
    fn class(suffix: &str) -> u8 {
        match suffix.chars().next() {
            Some('~') => 0,
            None => 1,
            Some(_) => 2,
        }
    }
    class(a)
        .cmp(&class(b))
        .then_with(|| suffix_letter(a).cmp(&suffix_letter(b)))
        .then_with(|| suffix_number(a).cmp(&suffix_number(b)))
        .then_with(|| a.cmp(b))
}

/// Packaging revision of a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Release {
    /// Matches any release of the same upstream version.
    Any,
    Exact(String),
}

impl Release {
    /// `None` and `"*"` both mean wildcard.
    pub fn from_option(release: Option<&str>) -> Self {
        match release {
            None | Some(WILDCARD) => Release::Any,
            Some(r) => Release::Exact(r.to_string()),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Release::Any)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Release::Any => WILDCARD,
            Release::Exact(r) => r,
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package version: upstream string, its comparison key and a release.
///
/// The epoch is kept for talking to aptly but never takes part in ordering.
/// `Version` implements neither `PartialEq` nor `Ord`; compare through
/// [`VersionComparator`].
#[derive(Debug, Clone)]
pub struct Version {
    epoch: Option<u32>,
    upstream: String,
    key: f64,
    /// Numeric segments without trailing zeros; breaks ties of `key`.
    segments: Vec<u64>,
    suffix: String,
    release: Release,
}

impl Version {
    /// Build a version from an upstream string and an optional release.
    pub fn new(upstream: &str, release: Option<&str>) -> Result<Self, RepoError> {
        if let Some(r) = release
            && r.trim().is_empty()
        {
            return Err(RepoError::malformed_version(upstream, "empty release"));
        }
        let upstream = upstream.trim();
        let (mut segments, suffix) = split_upstream(upstream)?;
        while segments.last() == Some(&0) {
            segments.pop();
        }
        Ok(Self {
            epoch: None,
            key: parse_version(upstream)?,
            segments,
            suffix: suffix.to_string(),
            upstream: upstream.to_string(),
            release: Release::from_option(release.map(str::trim)),
        })
    }

    /// Parse a full `[epoch:]upstream[-release]` string.
    ///
    /// The release is everything after the last hyphen; without a hyphen the
    /// release is a wildcard.
    pub fn parse(raw: &str) -> Result<Self, RepoError> {
        let trimmed = raw.trim();
        if trimmed.ends_with('-') {
            return Err(RepoError::malformed_version(raw, "empty release"));
        }
        let parsed = trimmed
            .parse::<debversion::Version>()
            .map_err(|e| RepoError::malformed_version(raw, e.to_string()))?;
        let mut version = Self::new(&parsed.upstream_version, parsed.debian_revision.as_deref())?;
        version.epoch = parsed.epoch;
        Ok(version)
    }

    pub fn epoch(&self) -> Option<u32> {
        self.epoch
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// `[epoch:]upstream[-release]`, the form aptly matches against.
    pub fn qualified(&self) -> String {
        match self.epoch {
            Some(epoch) => format!("{}:{}", epoch, self),
            None => self.to_string(),
        }
    }

    /// Same upstream text and release, ignoring the epoch.
    pub fn is_same(&self, other: &Version) -> bool {
        self.upstream == other.upstream && self.release == other.release
    }

    pub fn key(&self) -> f64 {
        self.key
    }

    pub fn release(&self) -> &Release {
        &self.release
    }
}

impl FromStr for Version {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.release {
            Release::Any => write!(f, "{}", self.upstream),
            Release::Exact(r) => write!(f, "{}-{}", self.upstream, r),
        }
    }
}

/// The only place versions are compared.
///
/// [`compare`](Self::compare) treats a wildcard release as equal to any
/// release of the same upstream. That equality is NOT transitive:
/// `1.0-1 == 1.0` and `1.0 == 1.0-2` while `1.0-1 < 1.0-2`. Never sort with
/// it; use [`total_cmp`](Self::total_cmp), which is a strict total order and
/// agrees with `compare` whenever both releases are concrete.
pub struct VersionComparator;

impl VersionComparator {
    /// Wildcard-aware three-way comparison.
    pub fn compare(a: &Version, b: &Version) -> Ordering {
        match Self::upstream_cmp(a, b) {
            Ordering::Equal => match (&a.release, &b.release) {
                (Release::Any, _) | (_, Release::Any) => Ordering::Equal,
                (Release::Exact(x), Release::Exact(y)) => x.cmp(y),
            },
            other => other,
        }
    }

    /// Key first; segments and suffix settle what the key cannot resolve.
    fn upstream_cmp(a: &Version, b: &Version) -> Ordering {
        a.key
            .total_cmp(&b.key)
            .then_with(|| a.segments.cmp(&b.segments))
            .then_with(|| suffix_cmp(&a.suffix, &b.suffix))
    }

    /// True when `compare` reports equality.
    pub fn matches(a: &Version, b: &Version) -> bool {
        Self::compare(a, b) == Ordering::Equal
    }

    /// Strict total order used for sorting: upstream, then wildcard before
    /// any concrete release, then release string.
    pub fn total_cmp(a: &Version, b: &Version) -> Ordering {
        Self::upstream_cmp(a, b).then_with(|| match (&a.release, &b.release) {
            (Release::Any, Release::Any) => Ordering::Equal,
            (Release::Any, Release::Exact(_)) => Ordering::Less,
            (Release::Exact(_), Release::Any) => Ordering::Greater,
            (Release::Exact(x), Release::Exact(y)) => x.cmp(y),
        })
    }
}
