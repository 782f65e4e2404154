//! Set algebra over constraint expressions: canonicalisation,
//! intersection and subset containment

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::comparator::{Comparator, Op};
use crate::constraint::Constraint;
use crate::expand::expand_group;
use crate::version::Version;

impl Constraint {
    /// The canonical form of this expression: every group expanded to pure
    /// bound comparators, bounds reduced to at most one lower and one upper
    /// bound, unsatisfiable groups removed, and the surviving groups
    /// deduplicated and sorted by their rendered form.
    pub fn canonical(&self) -> Constraint {
        let mut seen = HashSet::new();
        let mut groups = Vec::new();

        for group in &self.groups {
            let clean = simplify(expand_group(group));
            if is_valid(&clean) && seen.insert(group_key(&clean)) {
                groups.push(clean);
            }
        }
        groups.sort_by_cached_key(|g| group_key(g));

        Constraint {
            groups,
            include_prerelease: self.include_prerelease,
        }
    }

    /// The set of versions satisfying both expressions, in canonical form.
    /// The result opts into prereleases when either operand does. An empty
    /// expression is returned when the operands are disjoint.
    pub fn intersection(&self, other: &Constraint) -> Constraint {
        let include_prerelease = self.include_prerelease || other.include_prerelease;

        let left = self.canonical();
        let right = other.canonical();

        let mut groups = Vec::new();
        for ga in &left.groups {
            for gb in &right.groups {
                groups.push(intersect(ga, gb, include_prerelease));
            }
        }

        let mut result = Constraint {
            groups,
            include_prerelease,
        }
        .canonical();
        result.include_prerelease = include_prerelease;
        result
    }

    /// True when every version satisfying `self` also satisfies `other`:
    /// the intersection canonicalises to exactly `self`.
    pub fn is_subset_of(&self, other: &Constraint) -> bool {
        self.intersection(other).to_string() == self.canonical().to_string()
    }

    /// True when some version satisfies both expressions.
    pub fn intersects(&self, other: &Constraint) -> bool {
        !self.intersection(other).is_empty()
    }
}

/// Intersect two canonical groups. Exact comparators intersect by version
/// equality or are filtered through the opposite side; two range groups
/// concatenate and reduce to their tightest bounds.
fn intersect(a: &[Comparator], b: &[Comparator], include_prerelease: bool) -> Vec<Comparator> {
    let (exact_a, ranges_a) = split_exact(a);
    let (exact_b, ranges_b) = split_exact(b);

    if ranges_a.is_empty() && ranges_b.is_empty() {
        exact_intersection(&exact_a, &exact_b)
    } else if ranges_a.is_empty() {
        filter_exact(&exact_a, b, include_prerelease)
    } else if ranges_b.is_empty() {
        filter_exact(&exact_b, a, include_prerelease)
    } else {
        simplify(a.iter().chain(b).cloned().collect())
    }
}

fn split_exact(group: &[Comparator]) -> (Vec<&Comparator>, Vec<&Comparator>) {
    group.iter().partition(|c| c.is_exact())
}

fn exact_intersection(a: &[&Comparator], b: &[&Comparator]) -> Vec<Comparator> {
    let mut out = Vec::new();
    for ea in a {
        for eb in b {
            if ea.pivot() == eb.pivot() {
                out.push((*ea).clone());
            }
        }
    }
    out
}

fn filter_exact(
    exact: &[&Comparator],
    group: &[Comparator],
    include_prerelease: bool,
) -> Vec<Comparator> {
    exact
        .iter()
        .filter(|e| satisfies_all(e.pivot(), group, include_prerelease))
        .map(|e| (*e).clone())
        .collect()
}

/// Check an exact version against every comparator of a canonical group.
/// The prerelease gate lifts for the whole group when any pivot in it
/// carries a prerelease.
fn satisfies_all(version: &Version, group: &[Comparator], include_prerelease: bool) -> bool {
    let include_prerelease = include_prerelease
        || group.iter().any(|c| !c.pivot().prerelease().is_empty());

    for comparator in group {
        if !version.prerelease().is_empty() && !include_prerelease {
            return false;
        }

        let ord = version.compare(comparator.pivot());
        let admitted = match comparator.op() {
            Op::Gt => ord == Ordering::Greater,
            Op::Gte => ord != Ordering::Less,
            Op::Lt => ord == Ordering::Less,
            Op::Lte => ord != Ordering::Greater,
            Op::Bare | Op::Eq => ord == Ordering::Equal,
            Op::Ne => ord != Ordering::Equal,
            // Canonical groups contain no sugared operators.
            _ => true,
        };
        if !admitted {
            return false;
        }
    }
    true
}

/// Reduce a group to its tightest lower and upper bound. Exact and `!=`
/// comparators are retained verbatim.
fn simplify(group: Vec<Comparator>) -> Vec<Comparator> {
    if group.len() <= 1 {
        return group;
    }

    let (lower, upper) = bounds(&group);
    let mut out: Vec<Comparator> = Vec::new();
    out.extend(lower.cloned());
    out.extend(upper.cloned());
    out.extend(group.iter().filter(|c| !is_bound(c)).cloned());
    out
}

fn is_bound(c: &Comparator) -> bool {
    matches!(c.op(), Op::Gt | Op::Gte | Op::Lt | Op::Lte)
}

/// Scan a group once, keeping the tightest lower and upper bound. On a
/// pivot tie the exclusive bound wins.
fn bounds(group: &[Comparator]) -> (Option<&Comparator>, Option<&Comparator>) {
    let mut lower: Option<&Comparator> = None;
    let mut upper: Option<&Comparator> = None;

    for c in group {
        match c.op() {
            Op::Gt | Op::Gte => {
                if tighter(lower, c, true) {
                    lower = Some(c);
                }
            }
            Op::Lt | Op::Lte => {
                if tighter(upper, c, false) {
                    upper = Some(c);
                }
            }
            _ => {}
        }
    }

    (lower, upper)
}

fn tighter(current: Option<&Comparator>, candidate: &Comparator, lower: bool) -> bool {
    let Some(current) = current else {
        return true;
    };

    match candidate.pivot().compare(current.pivot()) {
        Ordering::Greater => lower,
        Ordering::Less => !lower,
        Ordering::Equal => {
            if lower {
                current.op() == Op::Gte && candidate.op() == Op::Gt
            } else {
                current.op() == Op::Lte && candidate.op() == Op::Lt
            }
        }
    }
}

/// A group is satisfiable unless its lower bound exceeds its upper bound,
/// or they meet at a non-inclusive endpoint.
fn is_valid(group: &[Comparator]) -> bool {
    if group.is_empty() {
        return false;
    }

    let (lower, upper) = bounds(group);
    let (Some(lower), Some(upper)) = (lower, upper) else {
        return true;
    };

    match lower.pivot().compare(upper.pivot()) {
        Ordering::Greater => false,
        Ordering::Equal => lower.op() == Op::Gte && upper.op() == Op::Lte,
        Ordering::Less => true,
    }
}

fn group_key(group: &[Comparator]) -> String {
    group
        .iter()
        .map(Comparator::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
