//! Error types for version and constraint handling

use std::fmt;

use thiserror::Error;

use crate::comparator::Op;

/// Why a version was rejected by a single comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionReason {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    MajorMismatch,
    MajorMinorMismatch,
    MinorMismatch,
    ExactMismatch,
}

impl AdmissionReason {
    fn phrase(&self) -> &'static str {
        match self {
            AdmissionReason::LessThan => "is less than",
            AdmissionReason::LessThanOrEqual => "is less than or equal to",
            AdmissionReason::GreaterThan => "is greater than",
            AdmissionReason::GreaterThanOrEqual => "is greater than or equal to",
            AdmissionReason::Equal => "is equal to",
            AdmissionReason::NotEqual => "is not equal to",
            AdmissionReason::MajorMismatch => "does not have the same major version as",
            AdmissionReason::MajorMinorMismatch => "does not have the same major and minor version as",
            AdmissionReason::MinorMismatch => "does not have the same minor version as",
            AdmissionReason::ExactMismatch => "does not equal",
        }
    }
}

impl fmt::Display for AdmissionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.phrase())
    }
}

/// Errors produced while parsing versions or constraints, or while
/// validating a version against a constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input does not follow the semantic version grammar.
    #[error("invalid semantic version {0:?}")]
    InvalidSemVer(String),

    /// The input does not follow the constraint grammar.
    #[error("improper constraint: {0}")]
    InvalidConstraint(String),

    /// A specific version failed a specific comparator.
    #[error("{version} {reason} {constraint}")]
    Admission {
        /// Rendered form of the rejected version.
        version: String,
        /// Operator of the failing comparator.
        op: Op,
        /// Original pivot text of the failing comparator, e.g. `1.x`.
        constraint: String,
        reason: AdmissionReason,
    },

    /// The prerelease gate fired: the version carries a prerelease but the
    /// constraint only admits release versions.
    #[error("{0} is a prerelease version and the constraint is only looking for release versions")]
    PrereleaseExcluded(String),
}
