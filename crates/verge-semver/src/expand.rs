//! Rewrites sugared comparators into pure bound comparators

use crate::comparator::{Comparator, Op};
use crate::version::Version;

/// Expand every comparator of a group so that only `>=`, `>`, `<=`, `<`,
/// `=`/bare and `!=` operators remain.
pub(crate) fn expand_group(group: &[Comparator]) -> Vec<Comparator> {
    group.iter().flat_map(expand_comparator).collect()
}

fn expand_comparator(c: &Comparator) -> Vec<Comparator> {
    match c.op() {
        Op::Caret => {
            let upper = if c.pivot().major() > 0 {
                c.pivot().inc_major()
            } else {
                c.pivot().inc_minor()
            };
            bounded_range(c, upper)
        }
        Op::Tilde | Op::TildeGt => {
            let upper = if c.minor_dirty() {
                c.pivot().inc_major()
            } else {
                c.pivot().inc_minor()
            };
            bounded_range(c, upper)
        }
        Op::Bare | Op::Eq if c.is_dirty() => expand_wildcard(c),
        Op::Lte if c.is_dirty() => {
            let upper = if c.minor_dirty() {
                c.pivot().inc_major()
            } else {
                c.pivot().inc_minor()
            };
            vec![Comparator::strictly_below(upper)]
        }
        _ => vec![c.clone()],
    }
}

fn bounded_range(c: &Comparator, upper: Version) -> Vec<Comparator> {
    vec![c.with_op(Op::Gte), Comparator::strictly_below(upper)]
}

fn expand_wildcard(c: &Comparator) -> Vec<Comparator> {
    let lower = c.with_op(Op::Gte);
    let upper = if c.minor_dirty() {
        c.pivot().inc_major()
    } else if c.patch_dirty() {
        c.pivot().inc_minor()
    } else {
        // A full wildcard has no upper boundary.
        return vec![lower];
    };

    vec![lower, Comparator::strictly_below(upper)]
}
