use super::clause::RequirementClause;
use super::requirement::{Requirement, RequirementType};

/// A compiled trigger: a core conjunction plus a disjunction of alternate
/// conjunctions.
///
/// The trigger is true when every core row holds and, if any alternates
/// exist, at least one alternate group holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trigger {
    pub core: Vec<Requirement>,
    pub alternates: Vec<Vec<Requirement>>,
}

impl Trigger {
    #[must_use]
    pub fn new(core: Vec<Requirement>, alternates: Vec<Vec<Requirement>>) -> Self {
        Self { core, alternates }
    }

    /// The core followed by every alternate group.
    pub fn groups(&self) -> impl Iterator<Item = &[Requirement]> {
        std::iter::once(self.core.as_slice()).chain(self.alternates.iter().map(Vec::as_slice))
    }

    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.groups().flatten()
    }

    /// Any row in any group accumulates hits.
    #[must_use]
    pub fn has_hit_count(&self) -> bool {
        self.requirements().any(|r| r.hit_count > 0)
    }

    #[must_use]
    pub fn contains_kind(&self, kind: RequirementType) -> bool {
        self.requirements().any(|r| r.kind == kind)
    }

    /// Core clauses, for callers that reason in clause units.
    #[must_use]
    pub fn core_clauses(&self) -> Vec<RequirementClause> {
        RequirementClause::split(&self.core)
    }

    /// Run the optimizer pipeline to a fixpoint.
    pub fn optimize(&mut self) {
        crate::optimize::optimize(self);
    }

    /// Consuming variant of [`optimize`](Self::optimize).
    #[must_use]
    pub fn optimized(mut self) -> Self {
        self.optimize();
        self
    }

    /// A trigger that can never fire: the core is exactly `always_false()`.
    #[must_use]
    pub fn is_always_false(&self) -> bool {
        self.core.len() == 1 && self.core[0].is_always_false()
    }

    /// A trigger that fires unconditionally: the core is exactly `always_true()`.
    #[must_use]
    pub fn is_always_true(&self) -> bool {
        self.alternates.is_empty() && self.core.len() == 1 && self.core[0].is_always_true()
    }
}
