use super::expr::CompareOp;
use super::field::Field;

/// Role of a [`Requirement`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequirementType {
    /// Plain filtering condition.
    #[default]
    None,
    ResetIf,
    PauseIf,
    Trigger,
    AddSource,
    SubSource,
    AddAddress,
    AndNext,
    OrNext,
    AddHits,
    SubHits,
    ResetNextIf,
    Measured,
    MeasuredIf,
    MeasuredPercent,
}

impl RequirementType {
    /// Rows that feed a value into the next row instead of comparing.
    #[must_use]
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            RequirementType::AddSource | RequirementType::SubSource | RequirementType::AddAddress
        )
    }

    /// Rows that cannot end a clause because they chain into the next row.
    #[must_use]
    pub fn is_combining(self) -> bool {
        self.is_modifier()
            || matches!(
                self,
                RequirementType::AndNext
                    | RequirementType::OrNext
                    | RequirementType::AddHits
                    | RequirementType::SubHits
                    | RequirementType::ResetNextIf
            )
    }

    #[must_use]
    pub fn is_measured(self) -> bool {
        matches!(
            self,
            RequirementType::Measured | RequirementType::MeasuredPercent
        )
    }
}

/// Relation of a comparison row, or the arithmetic modifier of a modifier row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequirementOperator {
    #[default]
    None,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Multiply,
    Divide,
    BitwiseAnd,
}

impl RequirementOperator {
    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            RequirementOperator::Equal
                | RequirementOperator::NotEqual
                | RequirementOperator::LessThan
                | RequirementOperator::LessThanOrEqual
                | RequirementOperator::GreaterThan
                | RequirementOperator::GreaterThanOrEqual
        )
    }

    #[must_use]
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            RequirementOperator::Multiply
                | RequirementOperator::Divide
                | RequirementOperator::BitwiseAnd
        )
    }

    /// Logical negation: `x op y` is false exactly when `x op.inverse() y` is true.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            RequirementOperator::Equal => RequirementOperator::NotEqual,
            RequirementOperator::NotEqual => RequirementOperator::Equal,
            RequirementOperator::LessThan => RequirementOperator::GreaterThanOrEqual,
            RequirementOperator::LessThanOrEqual => RequirementOperator::GreaterThan,
            RequirementOperator::GreaterThan => RequirementOperator::LessThanOrEqual,
            RequirementOperator::GreaterThanOrEqual => RequirementOperator::LessThan,
            other => other,
        }
    }

    /// Operand swap: `x op y` holds exactly when `y op.reverse() x` holds.
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            RequirementOperator::LessThan => RequirementOperator::GreaterThan,
            RequirementOperator::LessThanOrEqual => RequirementOperator::GreaterThanOrEqual,
            RequirementOperator::GreaterThan => RequirementOperator::LessThan,
            RequirementOperator::GreaterThanOrEqual => RequirementOperator::LessThanOrEqual,
            other => other,
        }
    }

    /// Apply a comparison to two concrete values. `None` for non-comparisons.
    #[must_use]
    pub fn compare(self, left: u32, right: u32) -> Option<bool> {
        Some(match self {
            RequirementOperator::Equal => left == right,
            RequirementOperator::NotEqual => left != right,
            RequirementOperator::LessThan => left < right,
            RequirementOperator::LessThanOrEqual => left <= right,
            RequirementOperator::GreaterThan => left > right,
            RequirementOperator::GreaterThanOrEqual => left >= right,
            _ => return None,
        })
    }
}

impl From<CompareOp> for RequirementOperator {
    fn from(op: CompareOp) -> Self {
        match op {
            CompareOp::Eq => RequirementOperator::Equal,
            CompareOp::Neq => RequirementOperator::NotEqual,
            CompareOp::Lt => RequirementOperator::LessThan,
            CompareOp::Lte => RequirementOperator::LessThanOrEqual,
            CompareOp::Gt => RequirementOperator::GreaterThan,
            CompareOp::Gte => RequirementOperator::GreaterThanOrEqual,
        }
    }
}

/// One row of a compiled trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Requirement {
    pub left: Field,
    pub operator: RequirementOperator,
    pub right: Field,
    pub kind: RequirementType,
    /// Number of frames the row must be true before it latches; 0 disables.
    pub hit_count: u32,
}

impl Requirement {
    #[must_use]
    pub fn new(left: Field, operator: RequirementOperator, right: Field) -> Self {
        Self {
            left,
            operator,
            right,
            ..Self::default()
        }
    }

    /// A modifier row (`AddSource`, `SubSource`, `AddAddress`) with no arithmetic.
    #[must_use]
    pub fn modifier(kind: RequirementType, left: Field) -> Self {
        Self {
            left,
            kind,
            ..Self::default()
        }
    }

    /// `1=1`
    #[must_use]
    pub fn always_true() -> Self {
        Self::new(Field::value(1), RequirementOperator::Equal, Field::value(1))
    }

    /// `0=1`
    #[must_use]
    pub fn always_false() -> Self {
        Self::new(Field::value(0), RequirementOperator::Equal, Field::value(1))
    }

    #[must_use]
    pub fn with_kind(self, kind: RequirementType) -> Self {
        Self { kind, ..self }
    }

    #[must_use]
    pub fn with_hit_count(self, hit_count: u32) -> Self {
        Self { hit_count, ..self }
    }

    #[must_use]
    pub fn is_comparison(&self) -> bool {
        self.operator.is_comparison()
    }

    /// Statically evaluate the comparison, ignoring the row's role and hit count.
    ///
    /// Decidable for two literals or two identical memory operands; anything
    /// else depends on memory and yields `None`.
    #[must_use]
    pub fn evaluate(&self) -> Option<bool> {
        if !self.is_comparison() {
            return None;
        }
        if self.left.is_value() && self.right.is_value() {
            return self.operator.compare(self.left.value, self.right.value);
        }
        if self.left.is_memory() && self.left == self.right {
            return self.operator.compare(0, 0);
        }
        None
    }

    /// Exactly the canonical `1=1` row with no role or hits.
    #[must_use]
    pub fn is_always_true(&self) -> bool {
        *self == Self::always_true()
    }

    /// Exactly the canonical `0=1` row with no role or hits.
    #[must_use]
    pub fn is_always_false(&self) -> bool {
        *self == Self::always_false()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::field::FieldSize;

    #[test]
    fn inverse_is_involution() {
        let ops = [
            RequirementOperator::Equal,
            RequirementOperator::NotEqual,
            RequirementOperator::LessThan,
            RequirementOperator::LessThanOrEqual,
            RequirementOperator::GreaterThan,
            RequirementOperator::GreaterThanOrEqual,
        ];
        for op in ops {
            assert_eq!(op.inverse().inverse(), op);
            assert_ne!(op.inverse(), op);
        }
    }

    #[test]
    fn reverse_matches_swapped_operands() {
        for op in [
            RequirementOperator::LessThan,
            RequirementOperator::LessThanOrEqual,
            RequirementOperator::GreaterThan,
            RequirementOperator::GreaterThanOrEqual,
            RequirementOperator::Equal,
            RequirementOperator::NotEqual,
        ] {
            for (a, b) in [(1_u32, 2_u32), (2, 2), (3, 2)] {
                assert_eq!(op.compare(a, b), op.reverse().compare(b, a), "{op:?}");
            }
        }
    }

    #[test]
    fn modifiers_do_not_compare() {
        assert_eq!(RequirementOperator::Multiply.compare(1, 1), None);
        assert!(!RequirementOperator::BitwiseAnd.is_comparison());
        assert!(RequirementOperator::Divide.is_modifier());
    }

    #[test]
    fn constants_evaluate() {
        assert_eq!(Requirement::always_true().evaluate(), Some(true));
        assert_eq!(Requirement::always_false().evaluate(), Some(false));
    }

    #[test]
    fn self_comparison_evaluates() {
        let byte = Field::memory(FieldSize::Byte, 0x1234);
        let le = Requirement::new(byte, RequirementOperator::LessThanOrEqual, byte);
        let gt = Requirement::new(byte, RequirementOperator::GreaterThan, byte);
        assert_eq!(le.evaluate(), Some(true));
        assert_eq!(gt.evaluate(), Some(false));
    }

    #[test]
    fn different_memory_is_indeterminate() {
        let a = Field::memory(FieldSize::Byte, 1);
        let b = Field::memory(FieldSize::Byte, 2);
        assert_eq!(
            Requirement::new(a, RequirementOperator::Equal, b).evaluate(),
            None
        );
        let prev = Field::delta(FieldSize::Byte, 1);
        assert_eq!(
            Requirement::new(a, RequirementOperator::Equal, prev).evaluate(),
            None
        );
    }

    #[test]
    fn combining_roles() {
        assert!(RequirementType::AddAddress.is_modifier());
        assert!(RequirementType::AndNext.is_combining());
        assert!(RequirementType::AddHits.is_combining());
        assert!(!RequirementType::AndNext.is_modifier());
        assert!(!RequirementType::ResetIf.is_combining());
        assert!(!RequirementType::None.is_combining());
    }
}
