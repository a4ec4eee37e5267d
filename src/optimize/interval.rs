//! Sets of unsigned values described by literal comparisons.

use crate::types::{RequirementClause, RequirementOperator, RequirementType};

/// A subset of `[0, max]` stored as sorted, disjoint, inclusive ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ValueSet {
    ranges: Vec<(u64, u64)>,
    max: u64,
}

/// A [`ValueSet`] rewritten as a single comparison against a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Bound {
    Empty,
    Full,
    Compare(RequirementOperator, u32),
}

impl ValueSet {
    fn new(ranges: Vec<(u64, u64)>, max: u64) -> Self {
        let mut ranges: Vec<(u64, u64)> = ranges
            .into_iter()
            .filter(|(low, high)| low <= high && *low <= max)
            .map(|(low, high)| (low, high.min(max)))
            .collect();
        ranges.sort_unstable();
        let mut merged: Vec<(u64, u64)> = Vec::with_capacity(ranges.len());
        for (low, high) in ranges {
            match merged.last_mut() {
                Some(last) if low <= last.1.saturating_add(1) => last.1 = last.1.max(high),
                _ => merged.push((low, high)),
            }
        }
        Self {
            ranges: merged,
            max,
        }
    }

    /// Values `x` in `[0, max]` with `x op value`.
    pub(super) fn from_comparison(op: RequirementOperator, value: u32, max: u64) -> Option<Self> {
        let value = u64::from(value);
        let ranges = match op {
            RequirementOperator::Equal => vec![(value, value)],
            RequirementOperator::NotEqual => match value.checked_sub(1) {
                Some(below) => vec![(0, below), (value + 1, max)],
                None => vec![(1, max)],
            },
            RequirementOperator::LessThan => match value.checked_sub(1) {
                Some(below) => vec![(0, below)],
                None => Vec::new(),
            },
            RequirementOperator::LessThanOrEqual => vec![(0, value)],
            RequirementOperator::GreaterThan => vec![(value + 1, max)],
            RequirementOperator::GreaterThanOrEqual => vec![(value, max)],
            _ => return None,
        };
        Some(Self::new(ranges, max))
    }

    pub(super) fn intersect(&self, other: &Self) -> Self {
        let mut ranges = Vec::new();
        for &(a_low, a_high) in &self.ranges {
            for &(b_low, b_high) in &other.ranges {
                let low = a_low.max(b_low);
                let high = a_high.min(b_high);
                if low <= high {
                    ranges.push((low, high));
                }
            }
        }
        Self::new(ranges, self.max.min(other.max))
    }

    pub(super) fn union(&self, other: &Self) -> Self {
        let mut ranges = self.ranges.clone();
        ranges.extend(other.ranges.iter().copied());
        Self::new(ranges, self.max.max(other.max))
    }

    pub(super) fn is_subset(&self, other: &Self) -> bool {
        self.intersect(other) == *self
    }

    pub(super) fn bound(&self) -> Option<Bound> {
        let literal = |value: u64| u32::try_from(value).ok();
        match self.ranges.as_slice() {
            [] => Some(Bound::Empty),
            [(0, high)] if *high == self.max => Some(Bound::Full),
            [(low, high)] if low == high => {
                Some(Bound::Compare(RequirementOperator::Equal, literal(*low)?))
            }
            [(0, high)] => Some(Bound::Compare(
                RequirementOperator::LessThanOrEqual,
                literal(*high)?,
            )),
            [(low, high)] if *high == self.max => Some(Bound::Compare(
                RequirementOperator::GreaterThanOrEqual,
                literal(*low)?,
            )),
            [(0, below), (above, high)] if *high == self.max && below + 2 == *above => Some(
                Bound::Compare(RequirementOperator::NotEqual, literal(below + 1)?),
            ),
            _ => None,
        }
    }
}

/// Interval view of a clause comparing one quantity against a literal.
///
/// The leading rows may only move the read (`AddAddress`) or accumulate into
/// it (`AddSource`/`SubSource`); with accumulation the quantity spans the whole
/// 32-bit range.
pub(super) fn clause_set(clause: &RequirementClause) -> Option<ValueSet> {
    let terminal = clause.terminal();
    if !terminal.right.is_value() {
        return None;
    }
    let mut accumulates = false;
    for row in clause.prefix() {
        match row.kind {
            RequirementType::AddAddress => {}
            RequirementType::AddSource | RequirementType::SubSource => accumulates = true,
            _ => return None,
        }
    }
    let max = if accumulates {
        u64::from(u32::MAX)
    } else if terminal.left.is_memory() {
        u64::from(terminal.left.max_value())
    } else {
        return None;
    };
    ValueSet::from_comparison(terminal.operator, terminal.right.value, max)
}

/// Rewrite the terminal of `clause` to describe `set`. `None` when the set is
/// not a single comparison, or is empty or full.
pub(super) fn with_set(clause: &RequirementClause, set: &ValueSet) -> Option<RequirementClause> {
    match set.bound()? {
        Bound::Compare(operator, value) => {
            let mut merged = clause.clone();
            let terminal = merged.terminal_mut();
            terminal.operator = operator;
            terminal.right.value = value;
            Some(merged)
        }
        Bound::Empty | Bound::Full => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(op: RequirementOperator, value: u32) -> ValueSet {
        ValueSet::from_comparison(op, value, 255).unwrap()
    }

    #[test]
    fn intersection_tightens() {
        let merged = set(RequirementOperator::GreaterThan, 1)
            .intersect(&set(RequirementOperator::GreaterThan, 2));
        assert_eq!(merged, set(RequirementOperator::GreaterThan, 2));
    }

    #[test]
    fn intersection_collapses_to_equality() {
        let merged = set(RequirementOperator::LessThanOrEqual, 2)
            .intersect(&set(RequirementOperator::GreaterThanOrEqual, 2));
        assert_eq!(
            merged.bound(),
            Some(Bound::Compare(RequirementOperator::Equal, 2))
        );
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let merged = set(RequirementOperator::GreaterThan, 3)
            .intersect(&set(RequirementOperator::LessThan, 2));
        assert_eq!(merged.bound(), Some(Bound::Empty));
    }

    #[test]
    fn union_around_a_point_is_not_equal() {
        let merged =
            set(RequirementOperator::LessThan, 2).union(&set(RequirementOperator::GreaterThan, 2));
        assert_eq!(
            merged.bound(),
            Some(Bound::Compare(RequirementOperator::NotEqual, 2))
        );
    }

    #[test]
    fn union_can_cover_everything() {
        let merged = set(RequirementOperator::LessThan, 5)
            .union(&set(RequirementOperator::GreaterThanOrEqual, 3));
        assert_eq!(merged.bound(), Some(Bound::Full));
    }

    #[test]
    fn split_ranges_have_no_bound() {
        let merged =
            set(RequirementOperator::Equal, 2).union(&set(RequirementOperator::Equal, 7));
        assert_eq!(merged.bound(), None);
    }

    #[test]
    fn out_of_range_values_clip() {
        assert_eq!(set(RequirementOperator::Equal, 300).bound(), Some(Bound::Empty));
        assert_eq!(set(RequirementOperator::LessThan, 300).bound(), Some(Bound::Full));
        assert_eq!(set(RequirementOperator::GreaterThanOrEqual, 0).bound(), Some(Bound::Full));
    }

    #[test]
    fn subset() {
        assert!(set(RequirementOperator::Equal, 4).is_subset(&set(RequirementOperator::GreaterThan, 2)));
        assert!(!set(RequirementOperator::GreaterThan, 2).is_subset(&set(RequirementOperator::Equal, 4)));
    }
}
