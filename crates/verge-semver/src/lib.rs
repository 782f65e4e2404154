//! Semantic version parsing, ordering and constraint algebra
//!
//! This crate parses SemVer 2.0.0 versions and npm-style constraint
//! expressions (`=`, `!=`, relational operators, `~`, `^`, wildcards,
//! hyphen ranges and `||` unions), and provides a set algebra over the
//! parsed constraints: membership, intersection and subset containment,
//! all working on a canonical disjunctive normal form.
//!
//! ```
//! use verge_semver::{Constraint, Version};
//!
//! let constraint = Constraint::parse("^1.2")?;
//! assert!(constraint.check(&Version::parse("1.4.0")?));
//!
//! let narrowed = constraint.intersection(&Constraint::parse(">=1.3.0")?);
//! assert_eq!(narrowed.to_string(), ">=1.3.0 <2.0.0");
//! assert!(narrowed.is_subset_of(&constraint));
//! # Ok::<(), verge_semver::Error>(())
//! ```

mod algebra;
mod comparator;
mod constraint;
mod error;
mod expand;
mod version;

pub use comparator::{Comparator, Op};
pub use constraint::Constraint;
pub use error::{AdmissionReason, Error};
pub use version::Version;
