use crate::types::{Requirement, RequirementClause, RequirementType, Trigger};

use super::interval::{clause_set, with_set, Bound};
use super::{always_true_group, is_plain, ClauseTrigger};

/// Pass 4: drop repeated clauses within a group, and alternate filters that
/// the core already enforces.
pub(super) fn remove_duplicates(trigger: &mut Trigger) -> bool {
    let mut view = ClauseTrigger::new(trigger);
    dedupe(&mut view.core);
    for alternate in &mut view.alternates {
        dedupe(alternate);
        alternate.retain(|clause| !(is_plain(clause) && view.core.contains(clause)));
        if alternate.is_empty() {
            *alternate = always_true_group();
        }
    }
    view.store(trigger)
}

fn dedupe(group: &mut Vec<RequirementClause>) {
    let mut seen: Vec<RequirementClause> = Vec::with_capacity(group.len());
    group.retain(|clause| {
        if seen.contains(clause) {
            false
        } else {
            seen.push(clause.clone());
            true
        }
    });
}

/// Outcome of comparing two clauses of one group.
#[derive(Debug)]
enum Merge {
    KeepFirst,
    KeepSecond,
    /// Both clauses collapse into this one.
    Replace(RequirementClause),
}

/// Pass 5: merge pairs of clauses that constrain the same quantity.
pub(super) fn remove_redundancies(trigger: &mut Trigger) -> bool {
    let has_hits = trigger.has_hit_count();
    let mut view = ClauseTrigger::new(trigger);
    while merge_once(&mut view.core, has_hits, true) {}
    for alternate in &mut view.alternates {
        while merge_once(alternate, has_hits, false) {}
    }
    view.store(trigger)
}

fn merge_once(clauses: &mut Vec<RequirementClause>, has_hits: bool, in_core: bool) -> bool {
    for first in 0..clauses.len() {
        for second in 0..clauses.len() {
            if first == second {
                continue;
            }
            let Some(merge) = merge_pair(&clauses[first], &clauses[second], has_hits, in_core) else {
                continue;
            };
            log::trace!("merged clauses {first} and {second}: {merge:?}");
            match merge {
                Merge::KeepFirst => {
                    clauses.remove(second);
                }
                Merge::KeepSecond => {
                    clauses.remove(first);
                }
                Merge::Replace(merged) => {
                    clauses[first] = merged;
                    clauses.remove(second);
                }
            }
            return true;
        }
    }
    false
}

fn merge_pair(
    a: &RequirementClause,
    b: &RequirementClause,
    has_hits: bool,
    in_core: bool,
) -> Option<Merge> {
    if a == b {
        return Some(Merge::KeepFirst);
    }
    if a.prefix() != b.prefix() {
        return None;
    }
    let (ta, tb) = (a.terminal(), b.terminal());

    // same condition, different targets: the larger target implies the smaller
    if a.kind() == RequirementType::None
        && ta.with_hit_count(0) == tb.with_hit_count(0)
        && ta.hit_count > tb.hit_count
    {
        return Some(Merge::KeepFirst);
    }

    if a.has_hit_count() || b.has_hit_count() {
        return None;
    }

    // reset paired with its own negation as a filter; an alternate's reset
    // clears the whole trigger, so only the core may keep just the filter
    if a.kind() == RequirementType::ResetIf
        && b.kind() == RequirementType::None
        && ta.left == tb.left
        && ta.right == tb.right
        && ta.operator.inverse() == tb.operator
    {
        return match (has_hits, in_core) {
            (true, _) => Some(Merge::KeepFirst),
            (false, true) => Some(Merge::KeepSecond),
            (false, false) => None,
        };
    }

    if a.kind() != b.kind() || !a.left_hand_equal(b) {
        return None;
    }
    let (set_a, set_b) = (clause_set(a)?, clause_set(b)?);
    match a.kind() {
        RequirementType::None => {
            let both = set_a.intersect(&set_b);
            if both == set_a {
                Some(Merge::KeepFirst)
            } else if both == set_b {
                Some(Merge::KeepSecond)
            } else if both.bound() == Some(Bound::Empty) {
                Some(Merge::Replace(RequirementClause::single(
                    Requirement::always_false(),
                )))
            } else {
                with_set(a, &both).map(Merge::Replace)
            }
        }
        RequirementType::ResetIf | RequirementType::PauseIf => {
            let either = set_a.union(&set_b);
            if either == set_a {
                Some(Merge::KeepFirst)
            } else if either == set_b {
                Some(Merge::KeepSecond)
            } else {
                with_set(a, &either).map(Merge::Replace)
            }
        }
        _ => None,
    }
}
