//! Constraint expressions: unions of conjunctive comparator groups

use std::fmt;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::comparator::{Comparator, OPS, VER_NC};
use crate::error::Error;
use crate::version::Version;

lazy_static! {
    // Whole-group validator: whitespace/comma-separated comparators.
    static ref VALID_GROUP_RE: Regex =
        Regex::new(&format!(r"^(?:\s*(?:{OPS})?\s*{VER_NC}\s*,?)+$")).unwrap();

    // Non-anchored scan for individual comparators inside a group.
    static ref FIND_RE: Regex = Regex::new(&format!(r"(?:{OPS})?\s*{VER_NC}")).unwrap();

    // Hyphen ranges; the hyphen must be surrounded by whitespace.
    static ref HYPHEN_RE: Regex = Regex::new(&format!(
        r"\s*(?P<from>{VER_NC})\s+-\s+(?P<to>{VER_NC})\s*"
    ))
    .unwrap();
}

/// A constraint expression in disjunctive normal form: a version satisfies
/// the expression iff it satisfies every comparator of some group.
///
/// The empty expression admits no versions.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub(crate) groups: Vec<Vec<Comparator>>,
    /// Admit prerelease versions even against release-only comparators.
    ///
    /// False after parsing; toggling it lifts the prerelease gate per
    /// comparator at membership time. Canonicalisation is unaffected, and
    /// an intersection carries the disjunction of its operands' flags.
    pub include_prerelease: bool,
}

impl Constraint {
    /// Parse a constraint expression: groups separated by `||`, comparators
    /// within a group separated by whitespace and/or commas, and hyphen
    /// ranges `A - B` desugaring to `>= A, <= B`.
    pub fn parse(input: &str) -> Result<Constraint, Error> {
        let rewritten = rewrite_hyphen_ranges(input);

        let mut groups = Vec::new();
        for part in rewritten.split("||") {
            if !VALID_GROUP_RE.is_match(part) {
                return Err(Error::InvalidConstraint(part.to_string()));
            }

            let found: Vec<&str> = FIND_RE.find_iter(part).map(|m| m.as_str()).collect();
            let texts = if found.is_empty() { vec![part] } else { found };

            let comparators = texts
                .into_iter()
                .map(Comparator::parse)
                .collect::<Result<Vec<_>, _>>()?;
            groups.push(comparators);
        }

        Ok(Constraint {
            groups,
            include_prerelease: false,
        })
    }

    /// True when the expression admits no versions at all.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Test whether a version satisfies the expression.
    pub fn check(&self, version: &Version) -> bool {
        self.groups.iter().any(|group| {
            group
                .iter()
                .all(|c| c.check(version, self.include_prerelease))
        })
    }

    /// Test a version and collect one error per failing comparator. The
    /// prerelease-gate message is reported at most once across all groups.
    /// On success the error list is empty.
    pub fn validate(&self, version: &Version) -> (bool, Vec<Error>) {
        let mut errors = Vec::new();
        let mut prerelease_reported = false;

        for group in &self.groups {
            let mut admitted = true;
            for comparator in group {
                if !self.include_prerelease
                    && comparator.pivot().prerelease().is_empty()
                    && !version.prerelease().is_empty()
                {
                    if !prerelease_reported {
                        errors.push(Error::PrereleaseExcluded(version.to_string()));
                        prerelease_reported = true;
                    }
                    admitted = false;
                } else if let Err(err) = comparator.admit(version, self.include_prerelease) {
                    errors.push(err);
                    admitted = false;
                }
            }
            if admitted {
                return (true, Vec::new());
            }
        }

        (false, errors)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(Comparator::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        write!(f, "{}", rendered.join(" || "))
    }
}

fn rewrite_hyphen_ranges(input: &str) -> String {
    HYPHEN_RE
        .replace_all(input, |caps: &Captures| {
            format!(">= {}, <= {}", &caps["from"], &caps["to"])
        })
        .into_owned()
}
