//! Semantic version parsing, rendering and total ordering

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::Error;

lazy_static! {
    // Full-string anchored; minor and patch may be omitted and default to
    // zero. Leading whitespace and extra numeric segments do not match.
    static ref VERSION_RE: Regex = Regex::new(
        r"^v?([0-9]+)(\.[0-9]+)?(\.[0-9]+)?(?:-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?(?:\+([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$",
    )
    .unwrap();

    // Incrementable prerelease shape: letters, an optional separator, an
    // optional numeric suffix.
    static ref PRERELEASE_RE: Regex = Regex::new(r"^([a-z]+)([.-]?)([0-9]+)?").unwrap();
}

/// A single semantic version.
///
/// Versions are immutable once constructed; the increment operations return
/// a new value. Build metadata never participates in ordering or equality.
#[derive(Debug, Clone)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    pre: String,
    metadata: String,
    original: String,
}

impl Version {
    /// Parse a version string. A leading `v` is accepted, and missing minor
    /// or patch segments default to zero.
    pub fn parse(input: &str) -> Result<Version, Error> {
        let caps = VERSION_RE
            .captures(input)
            .ok_or_else(|| Error::InvalidSemVer(input.to_string()))?;

        let major = parse_segment(&caps[1], input)?;
        let minor = match caps.get(2) {
            Some(m) => parse_segment(&m.as_str()[1..], input)?,
            None => 0,
        };
        let patch = match caps.get(3) {
            Some(m) => parse_segment(&m.as_str()[1..], input)?,
            None => 0,
        };

        Ok(Version {
            major,
            minor,
            patch,
            pre: caps.get(4).map_or_else(String::new, |m| m.as_str().to_string()),
            metadata: caps.get(5).map_or_else(String::new, |m| m.as_str().to_string()),
            original: input.to_string(),
        })
    }

    /// The major version number.
    pub fn major(&self) -> u64 {
        self.major
    }

    /// The minor version number.
    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// The patch version number.
    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// The prerelease identifiers, empty for a release version.
    pub fn prerelease(&self) -> &str {
        &self.pre
    }

    /// The build metadata, empty when absent.
    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    /// The original text this version was parsed from, including any
    /// leading `v`.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Clears the prerelease and adds one to the patch number.
    pub fn inc_patch(&self) -> Version {
        Version::rebuild(
            self.major,
            self.minor,
            self.patch.saturating_add(1),
            String::new(),
            self.metadata.clone(),
        )
    }

    /// Clears the prerelease, zeroes the patch and adds one to the minor
    /// number.
    pub fn inc_minor(&self) -> Version {
        Version::rebuild(
            self.major,
            self.minor.saturating_add(1),
            0,
            String::new(),
            self.metadata.clone(),
        )
    }

    /// Clears the prerelease, zeroes minor and patch and adds one to the
    /// major number.
    pub fn inc_major(&self) -> Version {
        Version::rebuild(
            self.major.saturating_add(1),
            0,
            0,
            String::new(),
            self.metadata.clone(),
        )
    }

    /// Increments the prerelease: `1.0.0-beta` becomes `1.0.0-beta1`,
    /// `1.0.0-beta2` becomes `1.0.0-beta3`. Fails when there is no
    /// prerelease or it does not follow the `[a-z]+[.-]?[0-9]*` shape.
    pub fn inc_prerelease(&self) -> Result<Version, Error> {
        let caps = PRERELEASE_RE
            .captures(&self.pre)
            .ok_or_else(|| Error::InvalidSemVer(self.original.clone()))?;

        let mut pre = format!("{}{}", &caps[1], &caps[2]);
        match caps.get(3) {
            Some(n) => {
                let n: u64 = n
                    .as_str()
                    .parse()
                    .map_err(|_| Error::InvalidSemVer(self.original.clone()))?;
                pre.push_str(&n.saturating_add(1).to_string());
            }
            None => pre.push('1'),
        }

        Ok(Version::rebuild(
            self.major,
            self.minor,
            self.patch,
            pre,
            self.metadata.clone(),
        ))
    }

    /// Replaces the prerelease. An empty string clears it; a non-empty
    /// value must start with lowercase letters.
    pub fn set_prerelease(&self, pre: &str) -> Result<Version, Error> {
        if !pre.is_empty() && !PRERELEASE_RE.is_match(pre) {
            return Err(Error::InvalidSemVer(pre.to_string()));
        }
        Ok(Version::rebuild(
            self.major,
            self.minor,
            self.patch,
            pre.to_string(),
            self.metadata.clone(),
        ))
    }

    /// Compares two versions. Numeric segments compare first, then the
    /// prerelease per SemVer: an absent prerelease is greater than any
    /// present one. Build metadata is ignored.
    pub fn compare(&self, other: &Version) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| self.patch.cmp(&other.patch))
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare_prerelease(&self.pre, &other.pre),
            })
    }

    fn rebuild(major: u64, minor: u64, patch: u64, pre: String, metadata: String) -> Version {
        let mut v = Version {
            major,
            minor,
            patch,
            pre,
            metadata,
            original: String::new(),
        };
        v.original = v.to_string();
        v
    }
}

fn parse_segment(segment: &str, input: &str) -> Result<u64, Error> {
    segment
        .parse()
        .map_err(|_| Error::InvalidSemVer(input.to_string()))
}

/// Compare two non-empty prerelease strings identifier by identifier.
/// Numeric identifiers compare numerically and sort below alphanumeric
/// ones; when all shared identifiers are equal, fewer identifiers sort
/// first.
pub(crate) fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let av: Vec<&str> = a.split('.').collect();
    let bv: Vec<&str> = b.split('.').collect();

    for i in 0..av.len().max(bv.len()) {
        let sa = av.get(i).copied().unwrap_or("");
        let sb = bv.get(i).copied().unwrap_or("");
        let ord = compare_prerelease_part(sa, sb);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

fn compare_prerelease_part(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    if a.is_empty() {
        return Ordering::Less;
    }
    if b.is_empty() {
        return Ordering::Greater;
    }

    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        if !self.metadata.is_empty() {
            write!(f, "+{}", self.metadata)?;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Version) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Version) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Version) -> Ordering {
        self.compare(other)
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.pre.hash(state);
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
