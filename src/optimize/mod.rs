//! Algebraic simplification of compiled triggers.
//!
//! The passes run in a fixed order and the whole pipeline repeats until a run
//! leaves the trigger unchanged. No pass can fail; a rewrite that is not known
//! to preserve meaning is skipped.

mod alts;
mod bits;
mod interval;
mod normalize;
mod promote;
mod redundancy;

use crate::types::{RequirementClause, RequirementType, Trigger};

/// Upper bound on pipeline iterations before the optimizer gives up.
pub const MAX_OPTIMIZE_PASSES: usize = 32;

type Pass = fn(&mut Trigger) -> bool;

const PIPELINE: [(&str, Pass); 8] = [
    ("normalize comparisons", normalize::normalize_comparisons),
    (
        "normalize non-hit-count resets and pauses",
        normalize::normalize_resets_and_pauses,
    ),
    ("promote common alternates to core", promote::promote_common_alts),
    ("remove duplicates", redundancy::remove_duplicates),
    ("remove redundancies", redundancy::remove_redundancies),
    ("merge duplicate alternates", alts::merge_duplicate_alts),
    ("merge requirement groups", alts::merge_requirement_groups),
    ("merge bits", bits::merge_bits),
];

/// Optimize `trigger` in place to a fixpoint of the pass pipeline.
pub fn optimize(trigger: &mut Trigger) {
    for iteration in 1..=MAX_OPTIMIZE_PASSES {
        let mut changed = false;
        for (name, pass) in PIPELINE {
            if pass(trigger) {
                log::debug!("optimizer pass '{name}' rewrote the trigger");
                changed = true;
            }
        }
        if !changed {
            log::debug!("optimizer converged after {iteration} iterations");
            return;
        }
    }
    log::error!("optimizer stopped after {MAX_OPTIMIZE_PASSES} iterations without converging");
}

/// Clause view of every group. Returns whether any group changed.
fn rewrite_groups(
    trigger: &mut Trigger,
    mut rewrite: impl FnMut(&mut Vec<RequirementClause>),
) -> bool {
    let mut changed = false;
    let groups = std::iter::once(&mut trigger.core).chain(trigger.alternates.iter_mut());
    for group in groups {
        let mut clauses = RequirementClause::split(group);
        rewrite(&mut clauses);
        let rows = RequirementClause::join(&clauses);
        if rows != *group {
            *group = rows;
            changed = true;
        }
    }
    changed
}

/// Clause view of the whole trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClauseTrigger {
    core: Vec<RequirementClause>,
    alternates: Vec<Vec<RequirementClause>>,
}

impl ClauseTrigger {
    fn new(trigger: &Trigger) -> Self {
        Self {
            core: RequirementClause::split(&trigger.core),
            alternates: trigger
                .alternates
                .iter()
                .map(|alternate| RequirementClause::split(alternate))
                .collect(),
        }
    }

    /// Write back into `trigger`, reporting whether anything changed.
    fn store(self, trigger: &mut Trigger) -> bool {
        let rebuilt = Trigger::new(
            RequirementClause::join(&self.core),
            self.alternates
                .iter()
                .map(|alternate| RequirementClause::join(alternate))
                .collect(),
        );
        if rebuilt == *trigger {
            return false;
        }
        *trigger = rebuilt;
        true
    }
}

/// A filtering clause with no hit count.
fn is_plain(clause: &RequirementClause) -> bool {
    clause.kind() == RequirementType::None && !clause.has_hit_count()
}

fn contains_kind(group: &[RequirementClause], kind: RequirementType) -> bool {
    group.iter().any(|clause| clause.contains_kind(kind))
}

fn has_hit_count(group: &[RequirementClause]) -> bool {
    group.iter().any(RequirementClause::has_hit_count)
}

fn has_measured(group: &[RequirementClause]) -> bool {
    group.iter().any(|clause| {
        clause.contains_kind(RequirementType::Measured)
            || clause.contains_kind(RequirementType::MeasuredPercent)
    })
}

/// Hit counts, resets or measurements: anything a pause would suspend.
fn is_pause_sensitive(group: &[RequirementClause]) -> bool {
    has_hit_count(group) || contains_kind(group, RequirementType::ResetIf) || has_measured(group)
}

/// A group whose only clause is the canonical `1=1`.
fn is_always_true_group(group: &[RequirementClause]) -> bool {
    matches!(group, [clause] if clause.len() == 1 && clause.terminal().is_always_true())
}

fn always_true_group() -> Vec<RequirementClause> {
    vec![RequirementClause::single(
        crate::types::Requirement::always_true(),
    )]
}
