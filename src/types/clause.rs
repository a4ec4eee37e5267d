use std::iter;

use super::requirement::{Requirement, RequirementType};

/// A maximal run of chained rows ending in a terminal row.
///
/// Every row of `prefix` has a combining role (`AddSource`, `AddAddress`,
/// `AndNext`, `AddHits`, ...). Clauses are the unit the optimizer compares,
/// merges and moves between groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequirementClause {
    prefix: Vec<Requirement>,
    terminal: Requirement,
}

impl RequirementClause {
    /// A clause holding a single row.
    #[must_use]
    pub fn single(requirement: Requirement) -> Self {
        Self {
            prefix: Vec::new(),
            terminal: requirement,
        }
    }

    /// Split a group of rows into clauses. Trailing combining rows with no
    /// terminal row form a final clause ending in the last of them.
    #[must_use]
    pub fn split(requirements: &[Requirement]) -> Vec<Self> {
        let mut clauses = Vec::new();
        let mut prefix = Vec::new();
        for requirement in requirements {
            if requirement.kind.is_combining() {
                prefix.push(*requirement);
            } else {
                clauses.push(Self {
                    prefix: std::mem::take(&mut prefix),
                    terminal: *requirement,
                });
            }
        }
        if let Some(terminal) = prefix.pop() {
            clauses.push(Self { prefix, terminal });
        }
        clauses
    }

    /// Flatten clauses back into rows.
    #[must_use]
    pub fn join(clauses: &[Self]) -> Vec<Requirement> {
        clauses
            .iter()
            .flat_map(RequirementClause::requirements)
            .copied()
            .collect()
    }

    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.prefix.iter().chain(iter::once(&self.terminal))
    }

    #[must_use]
    pub fn terminal(&self) -> &Requirement {
        &self.terminal
    }

    pub(crate) fn terminal_mut(&mut self) -> &mut Requirement {
        &mut self.terminal
    }

    #[must_use]
    pub fn prefix(&self) -> &[Requirement] {
        &self.prefix
    }

    /// Role of the terminal row.
    #[must_use]
    pub fn kind(&self) -> RequirementType {
        self.terminal.kind
    }

    /// Row count. Never zero: a clause always holds its terminal row.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.prefix.len() + 1
    }

    #[must_use]
    pub fn has_hit_count(&self) -> bool {
        self.requirements().any(|r| r.hit_count > 0)
    }

    #[must_use]
    pub fn contains_kind(&self, kind: RequirementType) -> bool {
        self.requirements().any(|r| r.kind == kind)
    }

    /// Static truth value of the clause.
    ///
    /// Only decidable for a single non-combining row comparing two literals or
    /// two identical fields. Roles are ignored: a `ResetIf` that is always true
    /// reports `Some(true)`.
    #[must_use]
    pub fn as_constant(&self) -> Option<bool> {
        if !self.prefix.is_empty() {
            return None;
        }
        self.terminal.evaluate()
    }

    /// Both clauses constrain the same quantity: identical leading chain and
    /// identical left operand on the terminal row.
    #[must_use]
    pub fn left_hand_equal(&self, other: &Self) -> bool {
        self.prefix == other.prefix && self.terminal.left == other.terminal.left
    }
}
