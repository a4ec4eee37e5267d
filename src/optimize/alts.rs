use crate::types::{RequirementClause, RequirementType, Trigger};

use super::interval::{clause_set, with_set, Bound};
use super::{
    always_true_group, contains_kind, has_hit_count, has_measured, is_always_true_group,
    is_pause_sensitive, is_plain, ClauseTrigger,
};

type Group = Vec<RequirementClause>;

/// Pass 6: collapse duplicate, impossible and trivially true alternates.
pub(super) fn merge_duplicate_alts(trigger: &mut Trigger) -> bool {
    let mut view = ClauseTrigger::new(trigger);
    if view.alternates.is_empty() {
        return false;
    }
    let mut dropped: Option<Group> = None;

    let mut alternates: Vec<Group> = Vec::with_capacity(view.alternates.len());
    for alternate in std::mem::take(&mut view.alternates) {
        if alternates.iter().any(|seen| same_clauses(seen, &alternate)) {
            dropped = Some(alternate);
        } else {
            alternates.push(alternate);
        }
    }

    while let Some((keep, remove, merged)) = find_union(&alternates) {
        log::trace!("merged alternate {remove} into alternate {keep}");
        alternates[keep] = merged;
        dropped = Some(alternates.remove(remove));
    }

    let (impossible, mut alternates): (Vec<Group>, Vec<Group>) =
        alternates.into_iter().partition(|alternate| {
            is_never_true(alternate) && !contains_kind(alternate, RequirementType::ResetIf)
        });
    if alternates.is_empty() {
        alternates.extend(impossible.into_iter().take(1));
    } else if let Some(last) = impossible.into_iter().last() {
        dropped = Some(last);
    }

    if alternates.iter().any(|alternate| is_always_true_group(alternate)) {
        let mut kept_true = false;
        alternates.retain(|alternate| {
            let keep = if is_always_true_group(alternate) {
                !std::mem::replace(&mut kept_true, true)
            } else {
                contains_kind(alternate, RequirementType::ResetIf)
                    || contains_kind(alternate, RequirementType::PauseIf)
                    || has_measured(alternate)
            };
            if !keep {
                dropped = Some(alternate.clone());
            }
            keep
        });
    }

    if alternates.len() == 1 {
        let lone = &alternates[0];
        let conflicting = (contains_kind(lone, RequirementType::PauseIf)
            && is_pause_sensitive(&view.core))
            || (contains_kind(&view.core, RequirementType::PauseIf) && is_pause_sensitive(lone));
        if !conflicting {
            view.core.extend(alternates.remove(0));
        } else if let Some(dropped) = dropped {
            alternates.push(dropped);
        }
    }

    view.alternates = alternates;
    view.store(trigger)
}

fn same_clauses(a: &[RequirementClause], b: &[RequirementClause]) -> bool {
    a.len() == b.len() && a.iter().all(|clause| b.contains(clause))
}

fn is_never_true(group: &[RequirementClause]) -> bool {
    group
        .iter()
        .any(|clause| clause.kind() == RequirementType::None && clause.as_constant() == Some(false))
}

/// Two plain alternates that differ in one comparison on the same quantity,
/// returned as (kept index, removed index, merged group).
fn find_union(alternates: &[Group]) -> Option<(usize, usize, Group)> {
    for (i, a) in alternates.iter().enumerate() {
        for (j, b) in alternates.iter().enumerate().skip(i + 1) {
            if let Some(merged) = union_of(a, b) {
                return Some((i, j, merged));
            }
        }
    }
    None
}

fn union_of(a: &[RequirementClause], b: &[RequirementClause]) -> Option<Group> {
    if a.len() != b.len() || !a.iter().chain(b).all(is_plain) {
        return None;
    }
    let mut only_a = a.iter().enumerate().filter(|(_, clause)| !b.contains(*clause));
    let (position, ca) = only_a.next()?;
    if only_a.next().is_some() {
        return None;
    }
    let mut only_b = b.iter().filter(|clause| !a.contains(*clause));
    let cb = only_b.next()?;
    if only_b.next().is_some() || !ca.left_hand_equal(cb) {
        return None;
    }

    let either = clause_set(ca)?.union(&clause_set(cb)?);
    let mut merged = a.to_vec();
    if either.bound() == Some(Bound::Full) {
        merged.remove(position);
        if merged.is_empty() {
            merged = always_true_group();
        }
    } else {
        merged[position] = with_set(ca, &either)?;
    }
    Some(merged)
}

/// Pass 7: drop plain alternates that imply a sibling.
///
/// When every comparison of `b` is implied by some comparison of `a`, any
/// frame where `a` holds also satisfies `b`, so `a` adds nothing to the
/// disjunction.
pub(super) fn merge_requirement_groups(trigger: &mut Trigger) -> bool {
    let mut view = ClauseTrigger::new(trigger);
    loop {
        let alternates = &view.alternates;
        let redundant = (0..alternates.len()).find(|&i| {
            is_simple_group(&alternates[i])
                && (0..alternates.len()).any(|j| j != i && implies(&alternates[i], &alternates[j]))
        });
        match redundant {
            Some(index) => {
                log::trace!("alternate {index} implies a sibling");
                view.alternates.remove(index);
            }
            None => break,
        }
    }
    view.store(trigger)
}

fn is_simple_group(group: &[RequirementClause]) -> bool {
    !has_hit_count(group)
        && !has_measured(group)
        && !contains_kind(group, RequirementType::ResetIf)
        && !contains_kind(group, RequirementType::PauseIf)
        && !contains_kind(group, RequirementType::MeasuredIf)
}

fn implies(a: &[RequirementClause], b: &[RequirementClause]) -> bool {
    b.iter().all(|needed| {
        (needed.as_constant() == Some(true) && needed.kind() == RequirementType::None)
            || a.iter().any(|held| clause_implies(held, needed))
    })
}

fn clause_implies(held: &RequirementClause, needed: &RequirementClause) -> bool {
    if held == needed {
        return true;
    }
    if !is_plain(held) || !is_plain(needed) || !held.left_hand_equal(needed) {
        return false;
    }
    match (clause_set(held), clause_set(needed)) {
        (Some(held), Some(needed)) => held.is_subset(&needed),
        _ => false,
    }
}
