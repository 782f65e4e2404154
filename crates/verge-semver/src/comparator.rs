//! Atomic version constraints: one operator and one pivot version

use std::cmp::Ordering;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AdmissionReason, Error};
use crate::version::{compare_prerelease, Version};

/// Operator alphabet, longest aliases first so that `=>` and `~>` win over
/// their one-character prefixes.
pub(crate) const OPS: &str = r"=>|=<|>=|<=|!=|~>|\^|[=<>~]";

/// Wildcard-tolerant version grammar with capture groups for each segment.
pub(crate) const VER: &str = r"v?([0-9xX*]+)(\.[0-9xX*]+)?(\.[0-9xX*]+)?(-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?";

/// Same grammar without capture groups, for embedding in larger patterns.
pub(crate) const VER_NC: &str = r"v?[0-9xX*]+(?:\.[0-9xX*]+)?(?:\.[0-9xX*]+)?(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?";

lazy_static! {
    static ref COMPARATOR_RE: Regex =
        Regex::new(&format!(r"^\s*({OPS})?\s*({VER})\s*$")).unwrap();
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// No explicit operator; equality, tilde-like when wildcarded.
    Bare,
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Tilde,
    /// `~>`, an alias of `~`.
    TildeGt,
    Caret,
}

impl Op {
    /// Parse an operator token. `=>` and `=<` are accepted as aliases of
    /// `>=` and `<=`.
    pub fn parse(s: &str) -> Result<Op, Error> {
        match s {
            "" => Ok(Op::Bare),
            "=" => Ok(Op::Eq),
            "!=" => Ok(Op::Ne),
            ">" => Ok(Op::Gt),
            ">=" | "=>" => Ok(Op::Gte),
            "<" => Ok(Op::Lt),
            "<=" | "=<" => Ok(Op::Lte),
            "~" => Ok(Op::Tilde),
            "~>" => Ok(Op::TildeGt),
            "^" => Ok(Op::Caret),
            _ => Err(Error::InvalidConstraint(s.to_string())),
        }
    }

    /// The normalised textual form of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Bare => "",
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Tilde => "~",
            Op::TildeGt => "~>",
            Op::Caret => "^",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single operator-plus-pivot predicate over the version space.
///
/// Missing or wildcarded segments are zero-filled in the pivot and recorded
/// in the dirtiness flags, which govern both checking and expansion.
#[derive(Debug, Clone)]
pub struct Comparator {
    op: Op,
    pivot: Version,
    orig: String,
    dirty: bool,
    minor_dirty: bool,
    patch_dirty: bool,
}

impl Comparator {
    /// Parse one comparator, e.g. `>=1.2`, `~1.x` or `2.3.4`. An input that
    /// is empty after trimming yields a bare comparator over `0.0.0` that
    /// admits anything.
    pub fn parse(input: &str) -> Result<Comparator, Error> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Comparator {
                op: Op::Bare,
                pivot: Version::parse("0.0.0")
                    .map_err(|_| Error::InvalidConstraint(input.to_string()))?,
                orig: String::new(),
                dirty: true,
                minor_dirty: false,
                patch_dirty: false,
            });
        }

        let caps = COMPARATOR_RE
            .captures(input)
            .ok_or_else(|| Error::InvalidConstraint(input.to_string()))?;

        let op = Op::parse(caps.get(1).map_or("", |m| m.as_str()))?;
        let orig = caps[2].to_string();
        let major = &caps[3];
        let minor = caps.get(4).map(|m| m.as_str());
        let patch = caps.get(5).map(|m| m.as_str());
        let pre = caps.get(6).map_or("", |m| m.as_str());

        let (pivot_text, dirty, minor_dirty, patch_dirty) = if is_wildcard(major) {
            ("0.0.0".to_string(), true, false, false)
        } else if minor.is_none() || is_wildcard(&minor.unwrap_or_default()[1..]) {
            (format!("{major}.0.0{pre}"), true, true, false)
        } else if patch.is_none() || is_wildcard(&patch.unwrap_or_default()[1..]) {
            (format!("{major}{}.0{pre}", minor.unwrap_or_default()), true, false, true)
        } else {
            (orig.clone(), false, false, false)
        };

        let pivot = Version::parse(&pivot_text)
            .map_err(|_| Error::InvalidConstraint(input.to_string()))?;

        Ok(Comparator {
            op,
            pivot,
            orig,
            dirty,
            minor_dirty,
            patch_dirty,
        })
    }

    /// The comparator's operator.
    pub fn op(&self) -> Op {
        self.op
    }

    /// The pivot version, with missing segments zero-filled.
    pub fn pivot(&self) -> &Version {
        &self.pivot
    }

    /// The original textual form of the pivot, e.g. `1.x`.
    pub fn original(&self) -> &str {
        &self.orig
    }

    /// True when any segment was absent or wildcarded.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn minor_dirty(&self) -> bool {
        self.minor_dirty
    }

    pub(crate) fn patch_dirty(&self) -> bool {
        self.patch_dirty
    }

    /// True for an explicit or bare equality comparator.
    pub(crate) fn is_exact(&self) -> bool {
        matches!(self.op, Op::Bare | Op::Eq)
    }

    /// Rewrites this comparator with a new operator, keeping the pivot and
    /// dirtiness flags and normalising the original text to the pivot's
    /// rendered form. Used by expansion.
    pub(crate) fn with_op(&self, op: Op) -> Comparator {
        Comparator {
            op,
            pivot: self.pivot.clone(),
            orig: self.pivot.to_string(),
            dirty: self.dirty,
            minor_dirty: self.minor_dirty,
            patch_dirty: self.patch_dirty,
        }
    }

    /// A clean `< upper` comparator. Used by expansion.
    pub(crate) fn strictly_below(upper: Version) -> Comparator {
        Comparator {
            op: Op::Lt,
            orig: upper.to_string(),
            pivot: upper,
            dirty: false,
            minor_dirty: false,
            patch_dirty: false,
        }
    }

    /// Check a version against this comparator.
    pub fn check(&self, version: &Version, include_prerelease: bool) -> bool {
        self.admit(version, include_prerelease).is_ok()
    }

    /// Check a version against this comparator, reporting why it failed.
    pub fn admit(&self, version: &Version, include_prerelease: bool) -> Result<(), Error> {
        match self.op {
            Op::Bare | Op::Eq => self.admit_tilde_or_equal(version, include_prerelease),
            Op::Ne => self.admit_not_equal(version, include_prerelease),
            Op::Gt => self.admit_greater(version, include_prerelease),
            Op::Gte => self.admit_greater_equal(version, include_prerelease),
            Op::Lt => self.admit_less(version, include_prerelease),
            Op::Lte => self.admit_less_equal(version, include_prerelease),
            Op::Tilde | Op::TildeGt => self.admit_tilde(version, include_prerelease),
            Op::Caret => self.admit_caret(version, include_prerelease),
        }
    }

    /// Prerelease gate: a prerelease version only satisfies comparators
    /// whose pivot itself carries a prerelease, unless the enclosing
    /// expression opted in.
    fn gate(&self, version: &Version, include_prerelease: bool) -> Result<(), Error> {
        if !include_prerelease
            && !version.prerelease().is_empty()
            && self.pivot.prerelease().is_empty()
        {
            return Err(Error::PrereleaseExcluded(version.to_string()));
        }
        Ok(())
    }

    fn rejection(&self, version: &Version, reason: AdmissionReason) -> Error {
        Error::Admission {
            version: version.to_string(),
            op: self.op,
            constraint: self.orig.clone(),
            reason,
        }
    }

    fn admit_tilde_or_equal(&self, v: &Version, include_pre: bool) -> Result<(), Error> {
        if self.dirty {
            return self.admit_tilde(v, include_pre);
        }
        self.gate(v, include_pre)?;
        if v == &self.pivot {
            Ok(())
        } else {
            Err(self.rejection(v, AdmissionReason::NotEqual))
        }
    }

    fn admit_not_equal(&self, v: &Version, include_pre: bool) -> Result<(), Error> {
        if self.dirty {
            self.gate(v, include_pre)?;

            if self.pivot.major() != v.major() {
                return Ok(());
            }
            if self.pivot.minor() != v.minor() && !self.minor_dirty {
                return Ok(());
            }
            if self.minor_dirty {
                return Err(self.rejection(v, AdmissionReason::Equal));
            }
            if self.pivot.patch() != v.patch() && !self.patch_dirty {
                return Ok(());
            }
            if self.patch_dirty {
                if !v.prerelease().is_empty() || !self.pivot.prerelease().is_empty() {
                    if compare_prerelease(v.prerelease(), self.pivot.prerelease())
                        != Ordering::Equal
                    {
                        return Ok(());
                    }
                }
                return Err(self.rejection(v, AdmissionReason::Equal));
            }
        }

        if v == &self.pivot {
            return Err(self.rejection(v, AdmissionReason::Equal));
        }
        Ok(())
    }

    fn admit_greater(&self, v: &Version, include_pre: bool) -> Result<(), Error> {
        self.gate(v, include_pre)?;

        if !self.dirty {
            return if v.compare(&self.pivot) == Ordering::Greater {
                Ok(())
            } else {
                Err(self.rejection(v, AdmissionReason::LessThanOrEqual))
            };
        }

        if v.major() > self.pivot.major() {
            return Ok(());
        }
        if v.major() < self.pivot.major() {
            return Err(self.rejection(v, AdmissionReason::LessThanOrEqual));
        }
        // A range like >1 means >=2.0.0; nothing inside major 1 qualifies.
        if self.minor_dirty {
            return Err(self.rejection(v, AdmissionReason::LessThanOrEqual));
        }
        // For >1.1 the minor has to move: 1.1.1 does not qualify, 1.2.0 does.
        if self.patch_dirty {
            return if v.minor() > self.pivot.minor() {
                Ok(())
            } else {
                Err(self.rejection(v, AdmissionReason::LessThanOrEqual))
            };
        }

        if v.compare(&self.pivot) == Ordering::Greater {
            Ok(())
        } else {
            Err(self.rejection(v, AdmissionReason::LessThanOrEqual))
        }
    }

    fn admit_greater_equal(&self, v: &Version, include_pre: bool) -> Result<(), Error> {
        self.gate(v, include_pre)?;
        if v.compare(&self.pivot) != Ordering::Less {
            Ok(())
        } else {
            Err(self.rejection(v, AdmissionReason::LessThan))
        }
    }

    fn admit_less(&self, v: &Version, include_pre: bool) -> Result<(), Error> {
        self.gate(v, include_pre)?;
        if v.compare(&self.pivot) == Ordering::Less {
            Ok(())
        } else {
            Err(self.rejection(v, AdmissionReason::GreaterThanOrEqual))
        }
    }

    fn admit_less_equal(&self, v: &Version, include_pre: bool) -> Result<(), Error> {
        self.gate(v, include_pre)?;

        if !self.dirty {
            return if v.compare(&self.pivot) != Ordering::Greater {
                Ok(())
            } else {
                Err(self.rejection(v, AdmissionReason::GreaterThan))
            };
        }

        // A dirty upper bound admits everything up to the next boundary of
        // the wildcarded segment: <=1.x means <2.0.0.
        if v.major() > self.pivot.major() {
            return Err(self.rejection(v, AdmissionReason::GreaterThan));
        }
        if v.major() == self.pivot.major() && v.minor() > self.pivot.minor() && !self.minor_dirty {
            return Err(self.rejection(v, AdmissionReason::GreaterThan));
        }
        Ok(())
    }

    fn admit_tilde(&self, v: &Version, include_pre: bool) -> Result<(), Error> {
        self.gate(v, include_pre)?;

        if v.compare(&self.pivot) == Ordering::Less {
            return Err(self.rejection(v, AdmissionReason::LessThan));
        }

        // ~0.0.0 with no wildcards is equivalent to >=0.0.0.
        if self.pivot.major() == 0
            && self.pivot.minor() == 0
            && self.pivot.patch() == 0
            && !self.minor_dirty
            && !self.patch_dirty
        {
            return Ok(());
        }

        if v.major() != self.pivot.major() {
            return Err(self.rejection(v, AdmissionReason::MajorMismatch));
        }
        if v.minor() != self.pivot.minor() && !self.minor_dirty {
            return Err(self.rejection(v, AdmissionReason::MajorMinorMismatch));
        }

        Ok(())
    }

    fn admit_caret(&self, v: &Version, include_pre: bool) -> Result<(), Error> {
        self.gate(v, include_pre)?;

        if v.compare(&self.pivot) == Ordering::Less {
            return Err(self.rejection(v, AdmissionReason::LessThan));
        }

        // ^ pins the major when it is non-zero (or wildcarded below it).
        if self.pivot.major() > 0 || self.minor_dirty {
            return if v.major() == self.pivot.major() {
                Ok(())
            } else {
                Err(self.rejection(v, AdmissionReason::MajorMismatch))
            };
        }

        if v.major() > 0 {
            return Err(self.rejection(v, AdmissionReason::MajorMismatch));
        }

        // Major is zero: ^0.y pins the minor.
        if self.pivot.minor() > 0 || self.patch_dirty {
            return if v.minor() == self.pivot.minor() {
                Ok(())
            } else {
                Err(self.rejection(v, AdmissionReason::MinorMismatch))
            };
        }

        // ^0.0.z admits only the exact patch.
        if v.patch() == self.pivot.patch() {
            Ok(())
        } else {
            Err(self.rejection(v, AdmissionReason::ExactMismatch))
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.orig)
    }
}

fn is_wildcard(segment: &str) -> bool {
    matches!(segment, "x" | "X" | "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparator(input: &str) -> Comparator {
        Comparator::parse(input).unwrap()
    }

    fn version(input: &str) -> Version {
        Version::parse(input).unwrap()
    }

    #[test]
    fn test_parse_operator_and_pivot() {
        let cases = [
            (">= 1.2", Op::Gte, "1.2.0"),
            ("1.0", Op::Bare, "1.0.0"),
            ("<= 1.2", Op::Lte, "1.2.0"),
            ("=< 1.2", Op::Lte, "1.2.0"),
            ("=> 1.2", Op::Gte, "1.2.0"),
            ("v1.2", Op::Bare, "1.2.0"),
            ("=1.5", Op::Eq, "1.5.0"),
            ("> 1.3", Op::Gt, "1.3.0"),
            ("< 1.4.1", Op::Lt, "1.4.1"),
            ("~1.2.3", Op::Tilde, "1.2.3"),
            ("~>1.2.3", Op::TildeGt, "1.2.3"),
            ("^1.2", Op::Caret, "1.2.0"),
            ("!=4.1", Op::Ne, "4.1.0"),
        ];

        for (input, op, pivot) in cases {
            let c = comparator(input);
            assert_eq!(c.op(), op, "operator of {input:?}");
            assert_eq!(c.pivot().to_string(), pivot, "pivot of {input:?}");
        }

        assert!(Comparator::parse("foo").is_err());
    }

    #[test]
    fn test_parse_dirtiness() {
        let c = comparator("1");
        assert!(c.is_dirty() && c.minor_dirty() && !c.patch_dirty());

        let c = comparator("1.2");
        assert!(c.is_dirty() && !c.minor_dirty() && c.patch_dirty());

        let c = comparator("1.x");
        assert!(c.is_dirty() && c.minor_dirty());
        assert_eq!(c.original(), "1.x");

        let c = comparator("1.2.x");
        assert!(c.is_dirty() && c.patch_dirty());

        let c = comparator("*");
        assert!(c.is_dirty() && !c.minor_dirty() && !c.patch_dirty());
        assert_eq!(c.pivot().to_string(), "0.0.0");

        let c = comparator("1.2.3");
        assert!(!c.is_dirty());
    }

    #[test]
    fn test_parse_empty_means_any() {
        let c = comparator("");
        assert_eq!(c.op(), Op::Bare);
        assert!(c.is_dirty());
        assert!(c.check(&version("0.0.1"), false));
        assert!(c.check(&version("42.1.9"), false));
    }

    #[test]
    fn test_check_relational() {
        let cases = [
            ("= 2.0", "1.2.3", false),
            ("= 2.0", "2.0.0", true),
            ("= 2.0", "2.0.5", true),
            ("4.1", "4.1.0", true),
            ("!=4.1", "4.1.0", false),
            ("!=4.1", "5.1.0", true),
            ("!=4.x", "5.1.0", true),
            ("!=4.x", "4.1.0", false),
            ("!=4.1.x", "4.1.5", false),
            ("!=4.1.x", "4.2.0", true),
            (">1.1", "4.1.0", true),
            (">1.1", "1.1.0", false),
            (">1.1", "1.1.1", false),
            (">1.x", "2.0.0", true),
            (">1.x", "1.9.0", false),
            (">1.1.x", "1.2.1", true),
            (">1.1.x", "1.1.500", false),
            ("<1.1", "0.1.0", true),
            ("<1.1", "1.1.0", false),
            ("<1.1", "1.1.1", false),
            (">=1.1", "4.1.0", true),
            (">=1.1", "1.1.0", true),
            (">=1.1", "0.0.9", false),
            ("<=1.1", "0.1.0", true),
            ("<=1.1", "1.1.0", true),
            ("<=1.1", "1.1.1", true),
            ("<=1.1", "1.2.0", false),
            ("<=1.x", "1.9.4", true),
            ("<=1.x", "2.0.0", false),
            ("<=1.1.0", "1.1.1", false),
        ];

        for (input, v, want) in cases {
            let c = comparator(input);
            assert_eq!(c.check(&version(v), false), want, "{input} vs {v}");
        }
    }

    #[test]
    fn test_check_tilde() {
        let cases = [
            ("~2.4", "2.4.5", true),
            ("~2.4", "2.9.0", false),
            ("~2.4", "2.3.9", false),
            ("~1", "1.2.3", true),
            ("~1", "2.0.0", false),
            ("~0.0.0", "1.2.3", true),
            ("~1.2.3", "1.2.4", true),
            ("~1.2.3", "1.3.0", false),
            ("~>2.4", "2.4.5", true),
        ];

        for (input, v, want) in cases {
            let c = comparator(input);
            assert_eq!(c.check(&version(v), false), want, "{input} vs {v}");
        }
    }

    #[test]
    fn test_check_caret() {
        let cases = [
            ("^1.2.3", "1.8.1", true),
            ("^1.2.3", "1.2.2", false),
            ("^1.2.3", "2.0.0", false),
            ("^1.2", "1.4.2", true),
            ("^1.2", "1.1.9", false),
            ("^0.2.3", "0.2.5", true),
            ("^0.2.3", "0.3.0", false),
            ("^0.2.3", "1.0.0", false),
            ("^0.0.3", "0.0.3", true),
            ("^0.0.3", "0.0.4", false),
            ("^1.x", "1.1.1", true),
            ("^1.x", "2.1.1", false),
        ];

        for (input, v, want) in cases {
            let c = comparator(input);
            assert_eq!(c.check(&version(v), false), want, "{input} vs {v}");
        }
    }

    #[test]
    fn test_prerelease_gate() {
        let c = comparator(">1.2");
        assert!(!c.check(&version("1.3.0-beta"), false));
        assert!(c.check(&version("1.3.0-beta"), true));

        // A pivot carrying a prerelease opts that comparator in.
        let c = comparator(">=1.2.3-alpha");
        assert!(c.check(&version("1.2.3-beta"), false));

        let err = comparator("^1.x").admit(&version("1.1.1-beta1"), false).unwrap_err();
        assert!(matches!(err, Error::PrereleaseExcluded(_)));
    }

    #[test]
    fn test_admission_error_carries_context() {
        let err = comparator(">=2.x").admit(&version("1.4.0"), false).unwrap_err();
        match err {
            Error::Admission { version, op, constraint, .. } => {
                assert_eq!(version, "1.4.0");
                assert_eq!(op, Op::Gte);
                assert_eq!(constraint, "2.x");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_render() {
        for input in [">=1.2", "~1.x", "^0.2.3", "!=4.1", "1.2.3", "=1.5", "<2"] {
            assert_eq!(comparator(input).to_string(), input.replace(' ', ""));
        }

        // Operator aliases normalise.
        assert_eq!(comparator("=>1.2").to_string(), ">=1.2");
        assert_eq!(comparator("=<1.2").to_string(), "<=1.2");
    }
}
