//! Lowering of nested conditions into single clauses joined by `AndNext` /
//! `OrNext` links.

use crate::types::{CompileError, Condition, Requirement, RequirementType};

use super::Compiler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Junction {
    And,
    Or,
}

impl Junction {
    fn link(self) -> RequirementType {
        match self {
            Junction::And => RequirementType::AndNext,
            Junction::Or => RequirementType::OrNext,
        }
    }

    pub(super) fn matches(self, condition: &Condition) -> bool {
        matches!(
            (self, condition.unlocated()),
            (Junction::And, Condition::And(..)) | (Junction::Or, Condition::Or(..))
        )
    }

    fn opposite(self) -> Self {
        match self {
            Junction::And => Junction::Or,
            Junction::Or => Junction::And,
        }
    }
}

/// Flatten nested `junction` nodes into their operands, left to right.
pub(super) fn flatten(condition: &Condition, junction: Junction) -> Vec<&Condition> {
    let mut items = Vec::new();
    flatten_into(condition, junction, &mut items);
    items
}

fn flatten_into<'c>(condition: &'c Condition, junction: Junction, items: &mut Vec<&'c Condition>) {
    match condition.unlocated() {
        Condition::And(a, b) | Condition::Or(a, b) if junction.matches(condition) => {
            flatten_into(a, junction, items);
            flatten_into(b, junction, items);
        }
        _ => items.push(condition),
    }
}

impl Compiler<'_> {
    /// Lower `condition` into one clause whose terminal row has role `terminal`.
    pub(super) fn chain(
        &mut self,
        condition: &Condition,
        terminal: RequirementType,
    ) -> Result<Vec<Requirement>, CompileError> {
        let mut rows = self.chain_rows(condition)?;
        if let Some(last) = rows.last_mut() {
            last.kind = terminal;
        }
        Ok(rows)
    }

    fn chain_rows(&mut self, condition: &Condition) -> Result<Vec<Requirement>, CompileError> {
        match condition {
            Condition::Located {
                location,
                condition,
            } => self
                .chain_rows(condition)
                .map_err(|err| err.located(*location)),
            Condition::Compare { left, op, right } => self.compare_rows(left, *op, right),
            Condition::Literal(value) => Ok(vec![super::literal(*value)]),
            Condition::And(..) => self.link(condition, Junction::And),
            Condition::Or(..) => self.link(condition, Junction::Or),
            Condition::Repeated { count, condition } => self.repeated(*count, condition),
            Condition::Tally { count, items } => self.tally(*count, items),
            Condition::ResetIf(_) => Err(nesting("never()")),
            Condition::PauseIf(_) => Err(nesting("unless()")),
            Condition::Measured { .. } => Err(nesting("measured()")),
            Condition::TriggerWhen(_) => Err(nesting("trigger_when()")),
        }
    }

    /// Left-to-right chain over the operands of `condition`.
    ///
    /// Links evaluate strictly in order, so at most one operand may itself be a
    /// chain of the opposite junction; it is emitted first.
    fn link(
        &mut self,
        condition: &Condition,
        junction: Junction,
    ) -> Result<Vec<Requirement>, CompileError> {
        self.link_items(&flatten(condition, junction), junction)
    }

    /// [`link`](Self::link) over operands that are already flattened.
    pub(super) fn link_items(
        &mut self,
        items: &[&Condition],
        junction: Junction,
    ) -> Result<Vec<Requirement>, CompileError> {
        let (compound, simple): (Vec<&Condition>, Vec<&Condition>) = items
            .iter()
            .copied()
            .partition(|item| junction.opposite().matches(item));
        if compound.len() > 1 {
            return Err(CompileError::ChainTooComplex { location: None });
        }

        let mut rows = Vec::new();
        for item in compound.into_iter().chain(simple) {
            let mut item_rows = self.chain_rows(item)?;
            if let Some(last) = item_rows.last_mut() {
                last.kind = junction.link();
            }
            rows.extend(item_rows);
        }
        if let Some(last) = rows.last_mut() {
            last.kind = RequirementType::None;
        }
        Ok(rows)
    }
}

fn nesting(construct: &'static str) -> CompileError {
    CompileError::UnsupportedNesting {
        construct,
        location: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::StandardAccessors;
    use crate::types::{byte, never, once, CompileOptions};

    fn chain(condition: &Condition) -> Result<Vec<Requirement>, CompileError> {
        let options = CompileOptions::default();
        let mut compiler = Compiler::new(&StandardAccessors, &options);
        compiler.chain(condition, RequirementType::ResetIf)
    }

    fn kinds(rows: &[Requirement]) -> Vec<RequirementType> {
        rows.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn and_chain() {
        let rows = chain(&byte(1).eq(1).and(byte(2).eq(2)).and(byte(3).eq(3))).unwrap();
        assert_eq!(
            kinds(&rows),
            vec![
                RequirementType::AndNext,
                RequirementType::AndNext,
                RequirementType::ResetIf
            ]
        );
    }

    #[test]
    fn or_inside_and_goes_first() {
        let condition = byte(1).eq(1).and(byte(2).eq(2).or(byte(3).eq(3)));
        let rows = chain(&condition).unwrap();
        assert_eq!(
            kinds(&rows),
            vec![
                RequirementType::OrNext,
                RequirementType::AndNext,
                RequirementType::ResetIf
            ]
        );
        assert_eq!(rows[0].left.value, 2);
        assert_eq!(rows[2].left.value, 1);
    }

    #[test]
    fn two_compound_operands_rejected() {
        let condition = byte(1)
            .eq(1)
            .or(byte(2).eq(2))
            .and(byte(3).eq(3).or(byte(4).eq(4)));
        assert!(matches!(
            chain(&condition),
            Err(CompileError::ChainTooComplex { .. })
        ));
    }

    #[test]
    fn repeated_leaf_keeps_hits() {
        let rows = chain(&once(byte(1).eq(1)).and(byte(2).eq(2))).unwrap();
        assert_eq!(rows[0].hit_count, 1);
        assert_eq!(rows[0].kind, RequirementType::AndNext);
    }

    #[test]
    fn flag_inside_chain_rejected() {
        let err = chain(&byte(1).eq(1).and(never(byte(2).eq(2)))).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedNesting { construct: "never()", .. }));
    }

    #[test]
    fn flatten_sees_through_locations() {
        let condition = byte(1)
            .eq(1)
            .and(byte(2).eq(2).located(10, 20))
            .located(0, 30)
            .and(byte(3).eq(3));
        assert_eq!(flatten(&condition, Junction::And).len(), 3);
        assert_eq!(flatten(&condition, Junction::Or).len(), 1);
    }
}
