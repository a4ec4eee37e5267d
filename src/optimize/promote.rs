use crate::types::{RequirementClause, RequirementType, Trigger};

use super::{always_true_group, contains_kind, is_always_true_group, ClauseTrigger};

/// Pass 3: move clauses shared by every alternate into the core.
///
/// Hit-counted clauses and resets are only shared when no group can pause,
/// since a pause in one alternate would otherwise suspend a counter that the
/// other alternates still advance. A pause itself is never promoted.
pub(super) fn promote_common_alts(trigger: &mut Trigger) -> bool {
    let mut view = ClauseTrigger::new(trigger);

    if view.alternates.len() >= 2 {
        let pausing = contains_kind(&view.core, RequirementType::PauseIf)
            || view
                .alternates
                .iter()
                .any(|alternate| contains_kind(alternate, RequirementType::PauseIf));

        let candidates = view.alternates[0].clone();
        for clause in candidates {
            if !is_promotable(&clause, pausing) {
                continue;
            }
            let shared = view
                .alternates
                .iter()
                .all(|alternate| alternate.contains(&clause));
            if !shared {
                continue;
            }
            for alternate in &mut view.alternates {
                if let Some(position) = alternate.iter().position(|c| *c == clause) {
                    alternate.remove(position);
                }
            }
            log::trace!("promoted shared clause to core");
            if !view.core.contains(&clause) {
                view.core.push(clause);
            }
        }

        for alternate in &mut view.alternates {
            if alternate.is_empty() {
                *alternate = always_true_group();
            }
        }
    }

    if !view.alternates.is_empty() && is_always_true_group(&view.core) {
        view.core.clear();
    }

    view.store(trigger)
}

fn is_promotable(clause: &RequirementClause, pausing: bool) -> bool {
    match clause.kind() {
        RequirementType::None => !clause.has_hit_count() || !pausing,
        RequirementType::ResetIf => !pausing,
        _ => false,
    }
}
