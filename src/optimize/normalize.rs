use crate::types::{
    Requirement, RequirementClause, RequirementOperator, RequirementType, Trigger,
};

use super::{
    contains_kind, has_hit_count, has_measured, rewrite_groups, ClauseTrigger,
};

/// Pass 1: fold comparisons against the value range of their operands and
/// strip constant rows that cannot affect the result.
pub(super) fn normalize_comparisons(trigger: &mut Trigger) -> bool {
    let mut changed = false;
    let groups = std::iter::once(&mut trigger.core).chain(trigger.alternates.iter_mut());
    for group in groups {
        changed |= normalize_rows(group);
        changed |= remove_identity_links(group);
    }
    changed | rewrite_groups(trigger, fold_constant_clauses)
}

fn normalize_rows(group: &mut [Requirement]) -> bool {
    let mut changed = false;
    for index in 0..group.len() {
        let accumulated = index > 0 && group[index - 1].kind.is_modifier();
        if accumulated || group[index].kind.is_measured() {
            continue;
        }
        let normalized = normalize_row(group[index]);
        if normalized != group[index] {
            log::trace!("normalized {} to {}", group[index], normalized);
            group[index] = normalized;
            changed = true;
        }
    }
    changed
}

/// Same row with a constant comparison, keeping role and hit count.
fn constant(row: Requirement, value: bool) -> Requirement {
    let literal = if value {
        Requirement::always_true()
    } else {
        Requirement::always_false()
    };
    Requirement {
        kind: row.kind,
        hit_count: row.hit_count,
        ..literal
    }
}

pub(super) fn normalize_row(mut row: Requirement) -> Requirement {
    if !row.is_comparison() {
        return row;
    }
    if row.left.is_value() && !row.right.is_value() {
        std::mem::swap(&mut row.left, &mut row.right);
        row.operator = row.operator.reverse();
    }
    if let Some(value) = row.evaluate() {
        return constant(row, value);
    }
    if !row.left.is_memory() || !row.right.is_value() {
        return row;
    }

    let max = row.left.max_value();
    let value = row.right.value;
    let folded = match row.operator {
        RequirementOperator::LessThan if value == 0 => Some(false),
        RequirementOperator::LessThan if value > max => Some(true),
        RequirementOperator::LessThan if value == 1 => {
            row.operator = RequirementOperator::Equal;
            row.right.value = 0;
            None
        }
        RequirementOperator::LessThanOrEqual if value >= max => Some(true),
        RequirementOperator::LessThanOrEqual if value == 0 => {
            row.operator = RequirementOperator::Equal;
            None
        }
        RequirementOperator::GreaterThan if value >= max => Some(false),
        RequirementOperator::GreaterThan if value == 0 => {
            row.operator = RequirementOperator::NotEqual;
            None
        }
        RequirementOperator::GreaterThan if value == max - 1 => {
            row.operator = RequirementOperator::Equal;
            row.right.value = max;
            None
        }
        RequirementOperator::GreaterThanOrEqual if value == 0 => Some(true),
        RequirementOperator::GreaterThanOrEqual if value > max => Some(false),
        RequirementOperator::GreaterThanOrEqual if value == max => {
            row.operator = RequirementOperator::Equal;
            None
        }
        RequirementOperator::Equal if value > max => Some(false),
        RequirementOperator::NotEqual if value > max => Some(true),
        _ => None,
    };
    if let Some(value) = folded {
        return constant(row, value);
    }
    if max == 1 && row.operator == RequirementOperator::NotEqual && row.right.value <= 1 {
        row.operator = RequirementOperator::Equal;
        row.right.value = 1 - row.right.value;
    }
    row
}

/// Links that cannot change the outcome of their chain: a false `AddHits`,
/// `SubHits`, `OrNext` or `ResetNextIf`, and a true `AndNext`.
fn is_identity_link(row: &Requirement) -> bool {
    match row.kind {
        RequirementType::AddHits
        | RequirementType::SubHits
        | RequirementType::ResetNextIf
        | RequirementType::OrNext => row.evaluate() == Some(false),
        RequirementType::AndNext => row.hit_count == 0 && row.evaluate() == Some(true),
        _ => false,
    }
}

/// Drop identity links that start their chain or continue a chain of the same
/// link type. A link fed by a different junction is left alone.
fn remove_identity_links(group: &mut Vec<Requirement>) -> bool {
    let mut kept: Vec<Requirement> = Vec::with_capacity(group.len());
    for row in group.iter() {
        let removable = match kept.last() {
            None => true,
            Some(previous) if previous.kind.is_modifier() => false,
            Some(previous) => match previous.kind {
                RequirementType::AndNext | RequirementType::OrNext => previous.kind == row.kind,
                _ => true,
            },
        };
        if removable && is_identity_link(row) {
            log::trace!("removed identity link {row}");
            continue;
        }
        kept.push(*row);
    }
    if kept.len() == group.len() {
        return false;
    }
    *group = kept;
    true
}

fn is_truthy_kind(kind: RequirementType) -> bool {
    matches!(
        kind,
        RequirementType::None
            | RequirementType::Trigger
            | RequirementType::Measured
            | RequirementType::MeasuredPercent
    )
}

fn is_filler(clause: &RequirementClause) -> bool {
    clause.kind() == RequirementType::None
        && !clause.has_hit_count()
        && clause.as_constant() == Some(true)
}

fn is_guard(clause: &RequirementClause) -> bool {
    matches!(
        clause.kind(),
        RequirementType::ResetIf | RequirementType::PauseIf
    )
}

fn fold_constant_clauses(clauses: &mut Vec<RequirementClause>) {
    clauses.retain(|clause| !(is_guard(clause) && clause.as_constant() == Some(false)));

    let never_true = clauses
        .iter()
        .any(|clause| clause.kind() == RequirementType::None && clause.as_constant() == Some(false));
    if never_true {
        let mut collapsed: Vec<RequirementClause> =
            clauses.iter().filter(|clause| is_guard(clause)).cloned().collect();
        collapsed.push(RequirementClause::single(Requirement::always_false()));
        *clauses = collapsed;
        return;
    }

    let has_condition = clauses
        .iter()
        .any(|clause| is_truthy_kind(clause.kind()) && !is_filler(clause));
    let mut kept_filler = has_condition;
    clauses.retain(|clause| {
        if !is_filler(clause) {
            return true;
        }
        if kept_filler {
            return false;
        }
        kept_filler = true;
        true
    });
}

/// Pass 2: turn resets and pauses that guard nothing stateful into filters.
///
/// Without hit counts a firing `ResetIf` only makes the trigger false for the
/// frame, which the inverted comparison expresses directly. The same holds for
/// a `PauseIf` in a group with nothing a pause would suspend.
pub(super) fn normalize_resets_and_pauses(trigger: &mut Trigger) -> bool {
    let trigger_has_hits = trigger.has_hit_count();
    let mut view = ClauseTrigger::new(trigger);

    if !trigger_has_hits {
        view.core = invert_kind(&view.core, RequirementType::ResetIf);
        let mut promoted = Vec::new();
        for alternate in &mut view.alternates {
            if contains_kind(alternate, RequirementType::PauseIf) {
                continue;
            }
            let mut kept = Vec::with_capacity(alternate.len());
            for clause in alternate.drain(..) {
                match inverted(&clause).filter(|_| clause.kind() == RequirementType::ResetIf) {
                    Some(filters) => promoted.extend(filters),
                    None => kept.push(clause),
                }
            }
            if kept.is_empty() {
                kept.push(RequirementClause::single(Requirement::always_true()));
            }
            *alternate = kept;
        }
        view.core.extend(promoted);
    }

    let groups = std::iter::once(&mut view.core).chain(view.alternates.iter_mut());
    for group in groups {
        let stateful = has_hit_count(group)
            || contains_kind(group, RequirementType::ResetIf)
            || has_measured(group);
        if !stateful {
            *group = invert_kind(group, RequirementType::PauseIf);
        }
    }

    view.store(trigger)
}

fn invert_kind(group: &[RequirementClause], kind: RequirementType) -> Vec<RequirementClause> {
    let mut rewritten = Vec::with_capacity(group.len());
    for clause in group {
        match inverted(clause).filter(|_| clause.kind() == kind) {
            Some(filters) => rewritten.extend(filters),
            None => rewritten.push(clause.clone()),
        }
    }
    rewritten
}

fn invert_row(row: &Requirement) -> Requirement {
    Requirement {
        kind: RequirementType::None,
        operator: row.operator.inverse(),
        ..*row
    }
}

/// Filters equivalent to the negation of `clause`.
///
/// A single row or an accumulator chain inverts its comparison; an `OrNext`
/// chain becomes one inverted filter per link. `AndNext` chains would need a
/// disjunction and are not inverted.
fn inverted(clause: &RequirementClause) -> Option<Vec<RequirementClause>> {
    if clause.has_hit_count() || !clause.terminal().is_comparison() {
        return None;
    }
    let prefix = clause.prefix();
    if prefix.iter().all(|row| row.kind.is_modifier()) {
        let mut rows = prefix.to_vec();
        rows.push(invert_row(clause.terminal()));
        return Some(RequirementClause::split(&rows));
    }
    if prefix
        .iter()
        .all(|row| row.kind == RequirementType::OrNext && row.is_comparison())
    {
        return Some(
            clause
                .requirements()
                .map(|row| RequirementClause::single(invert_row(row)))
                .collect(),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldSize};

    fn row(size: FieldSize, operator: RequirementOperator, value: u32) -> Requirement {
        Requirement::new(Field::memory(size, 0x10), operator, Field::value(value))
    }

    #[test]
    fn range_folding() {
        use RequirementOperator as Op;
        assert!(normalize_row(row(FieldSize::Byte, Op::GreaterThan, 256)).is_always_false());
        assert!(normalize_row(row(FieldSize::Byte, Op::LessThan, 256)).is_always_true());
        assert!(normalize_row(row(FieldSize::Byte, Op::GreaterThanOrEqual, 0)).is_always_true());
        assert!(normalize_row(row(FieldSize::Byte, Op::LessThan, 0)).is_always_false());
        assert_eq!(
            normalize_row(row(FieldSize::Byte, Op::LessThanOrEqual, 0)),
            row(FieldSize::Byte, Op::Equal, 0)
        );
        assert_eq!(
            normalize_row(row(FieldSize::Byte, Op::GreaterThan, 0)),
            row(FieldSize::Byte, Op::NotEqual, 0)
        );
        assert_eq!(
            normalize_row(row(FieldSize::Byte, Op::GreaterThanOrEqual, 255)),
            row(FieldSize::Byte, Op::Equal, 255)
        );
        assert_eq!(
            normalize_row(row(FieldSize::Byte, Op::GreaterThan, 254)),
            row(FieldSize::Byte, Op::Equal, 255)
        );
    }

    #[test]
    fn bit_inequality_becomes_equality() {
        use RequirementOperator as Op;
        assert_eq!(
            normalize_row(row(FieldSize::Bit0, Op::NotEqual, 0)),
            row(FieldSize::Bit0, Op::Equal, 1)
        );
        assert_eq!(
            normalize_row(row(FieldSize::Bit3, Op::NotEqual, 1)),
            row(FieldSize::Bit3, Op::Equal, 0)
        );
    }

    #[test]
    fn less_than_one_becomes_zero_equality() {
        use RequirementOperator as Op;
        assert_eq!(
            normalize_row(row(FieldSize::Bit0, Op::LessThan, 1)),
            row(FieldSize::Bit0, Op::Equal, 0)
        );
        assert_eq!(
            normalize_row(row(FieldSize::Byte, Op::LessThan, 1)),
            row(FieldSize::Byte, Op::Equal, 0)
        );
    }

    #[test]
    fn literal_moves_right() {
        let swapped = normalize_row(Requirement::new(
            Field::value(3),
            RequirementOperator::LessThan,
            Field::memory(FieldSize::Byte, 0x10),
        ));
        assert_eq!(
            swapped,
            row(FieldSize::Byte, RequirementOperator::GreaterThan, 3)
        );
    }

    #[test]
    fn folding_keeps_role_and_hits() {
        let folded = normalize_row(
            row(FieldSize::Byte, RequirementOperator::GreaterThanOrEqual, 0)
                .with_kind(RequirementType::ResetIf)
                .with_hit_count(3),
        );
        assert_eq!(folded.kind, RequirementType::ResetIf);
        assert_eq!(folded.hit_count, 3);
        assert_eq!(folded.evaluate(), Some(true));
    }

    #[test]
    fn accumulated_rows_are_not_folded() {
        let mut trigger = Trigger::new(
            vec![
                Requirement::modifier(
                    RequirementType::AddSource,
                    Field::memory(FieldSize::Byte, 1),
                ),
                row(FieldSize::Byte, RequirementOperator::GreaterThan, 300),
            ],
            Vec::new(),
        );
        let before = trigger.clone();
        normalize_comparisons(&mut trigger);
        assert_eq!(trigger, before);
    }

    #[test]
    fn true_and_next_link_is_removed() {
        let mut group = vec![
            Requirement::always_true().with_kind(RequirementType::AndNext),
            row(FieldSize::Byte, RequirementOperator::Equal, 1),
        ];
        assert!(remove_identity_links(&mut group));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn link_fed_by_other_junction_is_kept() {
        let mut group = vec![
            row(FieldSize::Byte, RequirementOperator::Equal, 1).with_kind(RequirementType::OrNext),
            Requirement::always_true().with_kind(RequirementType::AndNext),
            row(FieldSize::Byte, RequirementOperator::Equal, 2),
        ];
        assert!(!remove_identity_links(&mut group));
    }

    #[test]
    fn false_filter_collapses_group() {
        let reset = row(FieldSize::Byte, RequirementOperator::Equal, 9)
            .with_kind(RequirementType::ResetIf);
        let mut trigger = Trigger::new(
            vec![
                row(FieldSize::Byte, RequirementOperator::Equal, 1),
                reset,
                row(FieldSize::Byte, RequirementOperator::GreaterThan, 300),
            ],
            Vec::new(),
        );
        normalize_comparisons(&mut trigger);
        assert_eq!(trigger.core, vec![reset, Requirement::always_false()]);
    }

    #[test]
    fn sole_true_row_is_kept() {
        let mut trigger = Trigger::new(
            vec![row(FieldSize::Byte, RequirementOperator::LessThan, 256)],
            Vec::new(),
        );
        normalize_comparisons(&mut trigger);
        assert_eq!(trigger.core, vec![Requirement::always_true()]);

        let mut trigger = Trigger::new(
            vec![
                Requirement::always_true(),
                row(FieldSize::Byte, RequirementOperator::Equal, 1),
            ],
            Vec::new(),
        );
        normalize_comparisons(&mut trigger);
        assert_eq!(trigger.core.len(), 1);
    }

    #[test]
    fn reset_without_hits_becomes_filter() {
        let mut trigger = Trigger::new(
            vec![
                row(FieldSize::Byte, RequirementOperator::Equal, 1),
                row(FieldSize::Word, RequirementOperator::Equal, 2)
                    .with_kind(RequirementType::ResetIf),
            ],
            Vec::new(),
        );
        assert!(normalize_resets_and_pauses(&mut trigger));
        assert_eq!(
            trigger.core[1],
            row(FieldSize::Word, RequirementOperator::NotEqual, 2)
        );
    }

    #[test]
    fn reset_with_hits_is_kept() {
        let reset =
            row(FieldSize::Word, RequirementOperator::Equal, 2).with_kind(RequirementType::ResetIf);
        let mut trigger = Trigger::new(
            vec![
                row(FieldSize::Byte, RequirementOperator::Equal, 1).with_hit_count(5),
                reset,
            ],
            Vec::new(),
        );
        assert!(!normalize_resets_and_pauses(&mut trigger));
    }

    #[test]
    fn or_next_reset_splits() {
        let mut trigger = Trigger::new(
            vec![
                row(FieldSize::Byte, RequirementOperator::Equal, 7),
                row(FieldSize::Byte, RequirementOperator::Equal, 1)
                    .with_kind(RequirementType::OrNext),
                row(FieldSize::Byte, RequirementOperator::Equal, 2)
                    .with_kind(RequirementType::ResetIf),
            ],
            Vec::new(),
        );
        normalize_resets_and_pauses(&mut trigger);
        assert_eq!(
            trigger.core,
            vec![
                row(FieldSize::Byte, RequirementOperator::Equal, 7),
                row(FieldSize::Byte, RequirementOperator::NotEqual, 1),
                row(FieldSize::Byte, RequirementOperator::NotEqual, 2),
            ]
        );
    }

    #[test]
    fn and_next_reset_is_kept() {
        let mut trigger = Trigger::new(
            vec![
                row(FieldSize::Byte, RequirementOperator::Equal, 7),
                row(FieldSize::Byte, RequirementOperator::Equal, 1)
                    .with_kind(RequirementType::AndNext),
                row(FieldSize::Byte, RequirementOperator::Equal, 2)
                    .with_kind(RequirementType::ResetIf),
            ],
            Vec::new(),
        );
        assert!(!normalize_resets_and_pauses(&mut trigger));
    }

    #[test]
    fn alternate_reset_moves_to_core() {
        let filter = row(FieldSize::Byte, RequirementOperator::Equal, 1);
        let reset =
            row(FieldSize::Byte, RequirementOperator::Equal, 9).with_kind(RequirementType::ResetIf);
        let mut trigger = Trigger::new(
            vec![filter],
            vec![vec![row(FieldSize::Word, RequirementOperator::Equal, 1), reset], vec![filter]],
        );
        normalize_resets_and_pauses(&mut trigger);
        assert_eq!(trigger.core.len(), 2);
        assert_eq!(
            trigger.core[1],
            row(FieldSize::Byte, RequirementOperator::NotEqual, 9)
        );
        assert_eq!(trigger.alternates[0].len(), 1);
    }

    #[test]
    fn alternate_reset_beside_pause_stays() {
        let reset =
            row(FieldSize::Byte, RequirementOperator::Equal, 9).with_kind(RequirementType::ResetIf);
        let pause =
            row(FieldSize::Byte, RequirementOperator::Equal, 8).with_kind(RequirementType::PauseIf);
        let mut trigger = Trigger::new(
            Vec::new(),
            vec![
                vec![row(FieldSize::Word, RequirementOperator::Equal, 1), reset, pause],
                vec![row(FieldSize::Word, RequirementOperator::Equal, 2)],
            ],
        );
        normalize_resets_and_pauses(&mut trigger);
        assert!(trigger.alternates[0].contains(&reset));
        assert!(trigger.alternates[0].contains(&pause));
    }

    #[test]
    fn pause_without_state_becomes_filter() {
        let mut trigger = Trigger::new(
            vec![
                row(FieldSize::Byte, RequirementOperator::Equal, 1),
                row(FieldSize::Byte, RequirementOperator::LessThan, 5)
                    .with_kind(RequirementType::PauseIf),
            ],
            Vec::new(),
        );
        normalize_resets_and_pauses(&mut trigger);
        assert_eq!(
            trigger.core[1],
            row(FieldSize::Byte, RequirementOperator::GreaterThanOrEqual, 5)
        );
    }
}
