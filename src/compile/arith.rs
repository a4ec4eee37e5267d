//! Linear normalization of value arithmetic and lowering of comparisons into
//! accumulator chains.

use crate::types::{
    CompareOp, CompileError, Field, FieldKind, FieldSize, Requirement, RequirementOperator,
    RequirementType, ValueExpr,
};

use super::Compiler;

/// A memory field together with the `AddAddress` rows that locate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Operand {
    pointer: Vec<Requirement>,
    field: Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Modifier {
    operator: RequirementOperator,
    right: Field,
}

/// `coefficient * (operand [modifier])`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    operand: Operand,
    modifier: Option<Modifier>,
    coefficient: i64,
}

impl Term {
    /// Can sit on a comparison row as-is.
    fn is_plain(&self) -> bool {
        self.modifier.is_none() && self.coefficient.abs() == 1
    }
}

/// Sum of memory terms plus a constant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct Linear {
    terms: Vec<Term>,
    constant: i64,
}

/// A lowered comparison: rows, or a statically known truth value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Comparison {
    Rows(Vec<Requirement>),
    Constant(bool),
}

fn out_of_range(value: i64) -> CompileError {
    CompileError::ValueOutOfRange {
        value,
        location: None,
    }
}

fn literal(value: i64) -> Result<Field, CompileError> {
    u32::try_from(value)
        .map(Field::value)
        .map_err(|_| out_of_range(value))
}

impl Linear {
    fn constant(value: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    fn term(term: Term) -> Self {
        Self {
            terms: vec![term],
            constant: 0,
        }
    }

    fn operand(operand: Operand) -> Self {
        Self::term(Term {
            operand,
            modifier: None,
            coefficient: 1,
        })
    }

    fn add_term(&mut self, term: Term) -> Result<(), CompileError> {
        let existing = self
            .terms
            .iter_mut()
            .find(|t| t.operand == term.operand && t.modifier == term.modifier);
        match existing {
            Some(existing) => {
                existing.coefficient = existing
                    .coefficient
                    .checked_add(term.coefficient)
                    .ok_or_else(|| out_of_range(term.coefficient))?;
            }
            None => self.terms.push(term),
        }
        self.terms.retain(|t| t.coefficient != 0);
        Ok(())
    }

    fn plus(mut self, other: Linear) -> Result<Self, CompileError> {
        self.constant = self
            .constant
            .checked_add(other.constant)
            .ok_or_else(|| out_of_range(other.constant))?;
        for term in other.terms {
            self.add_term(term)?;
        }
        Ok(self)
    }

    fn scaled(mut self, factor: i64) -> Result<Self, CompileError> {
        self.constant = self
            .constant
            .checked_mul(factor)
            .ok_or_else(|| out_of_range(factor))?;
        for term in &mut self.terms {
            term.coefficient = term
                .coefficient
                .checked_mul(factor)
                .ok_or_else(|| out_of_range(factor))?;
        }
        self.terms.retain(|t| t.coefficient != 0);
        Ok(self)
    }

    /// The expression is exactly one unscaled, unmodified memory read.
    fn single_plain(&self) -> Option<&Operand> {
        match self.terms.as_slice() {
            [term] if self.constant == 0 && term.coefficient == 1 && term.modifier.is_none() => {
                Some(&term.operand)
            }
            _ => None,
        }
    }

    fn with_modifier(operand: &Operand, operator: RequirementOperator, right: Field) -> Self {
        Self::term(Term {
            operand: operand.clone(),
            modifier: Some(Modifier { operator, right }),
            coefficient: 1,
        })
    }
}

/// Largest value a term can contribute.
fn term_max(term: &Term) -> i64 {
    let max = match term.modifier {
        None => term.operand.field.max_value(),
        Some(_) => u32::MAX,
    };
    i64::from(max).saturating_mul(term.coefficient.abs())
}

impl Compiler<'_> {
    pub(super) fn linear(&self, value: &ValueExpr) -> Result<Linear, CompileError> {
        match value {
            ValueExpr::Constant(value) => Ok(Linear::constant(*value)),
            ValueExpr::Read { accessor, address } => {
                let size =
                    self.resolver
                        .resolve(accessor)
                        .ok_or_else(|| CompileError::UnknownAccessor {
                            accessor: accessor.clone(),
                            location: None,
                        })?;
                Ok(Linear::operand(self.address(size, address)?))
            }
            ValueExpr::Prev(inner) => self.memory_kind(inner, FieldKind::Delta, "prev"),
            ValueExpr::Prior(inner) => self.memory_kind(inner, FieldKind::Prior, "prior"),
            ValueExpr::Bcd(inner) => self.memory_kind(inner, FieldKind::Bcd, "bcd"),
            ValueExpr::Add(a, b) => self.linear(a)?.plus(self.linear(b)?),
            ValueExpr::Sub(a, b) => self.linear(a)?.plus(self.linear(b)?.scaled(-1)?),
            ValueExpr::Mul(a, b) => multiply(self.linear(a)?, self.linear(b)?),
            ValueExpr::Div(a, b) => divide(self.linear(a)?, self.linear(b)?),
            ValueExpr::BitAnd(a, b) => mask(self.linear(a)?, self.linear(b)?),
        }
    }

    fn address(&self, size: FieldSize, address: &ValueExpr) -> Result<Operand, CompileError> {
        let linear = self.linear(address)?;
        let offset = linear.constant;
        let to_address = |value: i64| {
            u32::try_from(value).map_err(|_| CompileError::AddressOutOfRange {
                address: value,
                location: None,
            })
        };
        match linear.terms.as_slice() {
            [] => Ok(Operand {
                pointer: Vec::new(),
                field: Field::memory(size, to_address(offset)?),
            }),
            [term] if term.coefficient > 0 => {
                if offset < 0 {
                    return Err(CompileError::NegativeOffset {
                        offset,
                        location: None,
                    });
                }
                let mut row =
                    Requirement::modifier(RequirementType::AddAddress, term.operand.field);
                match (term.modifier, term.coefficient) {
                    (Some(modifier), 1) => {
                        row.operator = modifier.operator;
                        row.right = modifier.right;
                    }
                    (None, 1) => {}
                    (None, scale) => {
                        row.operator = RequirementOperator::Multiply;
                        row.right = literal(scale)?;
                    }
                    (Some(_), _) => return Err(CompileError::ComplexAddress { location: None }),
                }
                let mut pointer = term.operand.pointer.clone();
                pointer.push(row);
                Ok(Operand {
                    pointer,
                    field: Field::memory(size, to_address(offset)?),
                })
            }
            _ => Err(CompileError::ComplexAddress { location: None }),
        }
    }

    fn memory_kind(
        &self,
        inner: &ValueExpr,
        kind: FieldKind,
        modifier: &'static str,
    ) -> Result<Linear, CompileError> {
        let linear = self.linear(inner)?;
        match linear.single_plain() {
            Some(operand) if operand.field.kind == FieldKind::Memory => {
                Ok(Linear::operand(Operand {
                    pointer: operand.pointer.clone(),
                    field: operand.field.with_kind(kind),
                }))
            }
            Some(_) => Err(CompileError::NestedMemoryModifier {
                modifier,
                location: None,
            }),
            None => Err(CompileError::ModifierWithoutMemory {
                modifier,
                location: None,
            }),
        }
    }

    /// Lower `left op right`, folding comparisons that do not depend on memory.
    pub(super) fn comparison(
        &self,
        left: &ValueExpr,
        op: CompareOp,
        right: &ValueExpr,
    ) -> Result<Comparison, CompileError> {
        let left = self.linear(left)?;
        let right = self.linear(right)?;
        let difference = left.clone().plus(right.clone().scaled(-1)?)?;
        let bound = difference
            .constant
            .checked_neg()
            .ok_or_else(|| out_of_range(difference.constant))?;

        if difference.terms.is_empty() {
            return Ok(Comparison::Constant(op.holds(0, i128::from(bound))));
        }
        if let (Some(l), Some(r)) = (left.single_plain(), right.single_plain()) {
            if l.pointer == r.pointer {
                let mut rows = l.pointer.clone();
                rows.push(Requirement::new(l.field, op.into(), r.field));
                return Ok(Comparison::Rows(rows));
            }
        }
        match difference.terms.as_slice() {
            [term] => single_term(term, op, bound),
            terms => match op {
                CompareOp::Eq | CompareOp::Neq => {
                    let (offset, right) = if bound < 0 { (-bound, 0) } else { (0, bound) };
                    assemble(offset, terms, literal(right)?, op).map(Comparison::Rows)
                }
                CompareOp::Gt | CompareOp::Gte => match rearranged(terms, op, bound)? {
                    Some(rows) => Ok(Comparison::Rows(rows)),
                    None => compensated(&left, &right, terms, op, bound),
                },
                CompareOp::Lt | CompareOp::Lte => {
                    let written_subtraction = left.terms.iter().any(|t| t.coefficient < 0);
                    let rows = if written_subtraction {
                        None
                    } else {
                        rearranged(terms, op, bound)?
                    };
                    match rows {
                        Some(rows) => Ok(Comparison::Rows(rows)),
                        None => compensated(&left, &right, terms, op, bound),
                    }
                }
            },
        }
    }
}

fn multiply(a: Linear, b: Linear) -> Result<Linear, CompileError> {
    if b.terms.is_empty() {
        return a.scaled(b.constant);
    }
    if a.terms.is_empty() {
        return b.scaled(a.constant);
    }
    match (a.single_plain(), b.single_plain()) {
        (Some(left), Some(right)) if left.pointer == right.pointer => Ok(Linear::with_modifier(
            left,
            RequirementOperator::Multiply,
            right.field,
        )),
        _ => Err(CompileError::CannotEliminateMultiplication { location: None }),
    }
}

fn divide(a: Linear, b: Linear) -> Result<Linear, CompileError> {
    if !b.terms.is_empty() {
        return match (a.single_plain(), b.single_plain()) {
            (Some(left), Some(right)) if left.pointer == right.pointer => Ok(
                Linear::with_modifier(left, RequirementOperator::Divide, right.field),
            ),
            _ => Err(CompileError::CannotNormalizeDivision { location: None }),
        };
    }
    let divisor = b.constant;
    if divisor == 0 {
        return Err(CompileError::DivisionByZero { location: None });
    }
    if divisor == 1 {
        return Ok(a);
    }
    if a.terms.is_empty() {
        return Ok(Linear::constant(a.constant / divisor));
    }
    let exact =
        a.constant % divisor == 0 && a.terms.iter().all(|t| t.coefficient % divisor == 0);
    if exact {
        let mut quotient = a;
        quotient.constant /= divisor;
        for term in &mut quotient.terms {
            term.coefficient /= divisor;
        }
        return Ok(quotient);
    }
    match a.single_plain() {
        Some(operand) if divisor > 0 => Ok(Linear::with_modifier(
            operand,
            RequirementOperator::Divide,
            literal(divisor)?,
        )),
        _ => Err(CompileError::CannotNormalizeDivision { location: None }),
    }
}

fn mask(a: Linear, b: Linear) -> Result<Linear, CompileError> {
    let (value, mask) = if a.terms.is_empty() && !b.terms.is_empty() {
        (b, a)
    } else {
        (a, b)
    };
    if mask.terms.is_empty() {
        if value.terms.is_empty() {
            return Ok(Linear::constant(value.constant & mask.constant));
        }
        return match value.single_plain() {
            Some(operand) => Ok(Linear::with_modifier(
                operand,
                RequirementOperator::BitwiseAnd,
                literal(mask.constant)?,
            )),
            None => Err(CompileError::UnsupportedNesting {
                construct: "masking a compound value",
                location: None,
            }),
        };
    }
    match (value.single_plain(), mask.single_plain()) {
        (Some(left), Some(right)) if left.pointer == right.pointer => Ok(Linear::with_modifier(
            left,
            RequirementOperator::BitwiseAnd,
            right.field,
        )),
        _ => Err(CompileError::UnsupportedNesting {
            construct: "masking a compound value",
            location: None,
        }),
    }
}

/// `coefficient * term op bound`, solved for the term.
fn single_term(term: &Term, op: CompareOp, bound: i64) -> Result<Comparison, CompileError> {
    let (op, bound, scale) = if term.coefficient < 0 {
        let bound = bound.checked_neg().ok_or_else(|| out_of_range(bound))?;
        (op.reverse(), bound, -term.coefficient)
    } else {
        (op, bound, term.coefficient)
    };
    let bound = if scale > 1 {
        let divisible = bound % scale == 0;
        match op {
            CompareOp::Eq if !divisible => return Ok(Comparison::Constant(false)),
            CompareOp::Neq if !divisible => return Ok(Comparison::Constant(true)),
            CompareOp::Eq | CompareOp::Neq | CompareOp::Gt | CompareOp::Lte => {
                bound.div_euclid(scale)
            }
            CompareOp::Gte | CompareOp::Lt => -(-bound).div_euclid(scale),
        }
    } else {
        bound
    };

    if bound < 0 {
        return Ok(Comparison::Constant(matches!(
            op,
            CompareOp::Neq | CompareOp::Gt | CompareOp::Gte
        )));
    }
    if bound > i64::from(u32::MAX) {
        return Ok(Comparison::Constant(matches!(
            op,
            CompareOp::Neq | CompareOp::Lt | CompareOp::Lte
        )));
    }

    let right = literal(bound)?;
    let mut rows = term.operand.pointer.clone();
    match term.modifier {
        None => rows.push(Requirement::new(term.operand.field, op.into(), right)),
        Some(modifier) => {
            rows.push(accumulator(term.operand.field, modifier, RequirementType::AddSource));
            rows.push(Requirement::new(Field::value(0), op.into(), right));
        }
    }
    Ok(Comparison::Rows(rows))
}

fn accumulator(field: Field, modifier: Modifier, kind: RequirementType) -> Requirement {
    Requirement {
        operator: modifier.operator,
        right: modifier.right,
        ..Requirement::modifier(kind, field)
    }
}

/// Rows feeding `term` into the accumulator with the given role.
fn accumulate(term: &Term, kind: RequirementType) -> Result<Vec<Requirement>, CompileError> {
    let scale = term.coefficient.abs();
    let mut rows = term.operand.pointer.clone();
    let row = match (term.modifier, scale) {
        (None, 1) => Requirement::modifier(kind, term.operand.field),
        (None, scale) => accumulator(
            term.operand.field,
            Modifier {
                operator: RequirementOperator::Multiply,
                right: literal(scale)?,
            },
            kind,
        ),
        (Some(modifier), 1) => accumulator(term.operand.field, modifier, kind),
        (Some(_), _) => return Err(CompileError::CannotEliminateMultiplication { location: None }),
    };
    rows.push(row);
    Ok(rows)
}

fn last_plain(terms: &[Term], positive: bool) -> Option<usize> {
    terms
        .iter()
        .rposition(|t| t.is_plain() && (t.coefficient > 0) == positive)
}

/// Offset row, then every term in written order, then the comparison row.
///
/// The comparison row reads the last positive plain term, or a zero literal
/// when every term must go through the accumulator.
fn assemble(
    offset: i64,
    terms: &[Term],
    right: Field,
    op: CompareOp,
) -> Result<Vec<Requirement>, CompileError> {
    let mut rows = Vec::new();
    if offset > 0 {
        rows.push(Requirement::modifier(
            RequirementType::AddSource,
            literal(offset)?,
        ));
    }
    let terminal = last_plain(terms, true);
    for (index, term) in terms.iter().enumerate() {
        if Some(index) == terminal {
            continue;
        }
        let kind = if term.coefficient > 0 {
            RequirementType::AddSource
        } else {
            RequirementType::SubSource
        };
        rows.extend(accumulate(term, kind)?);
    }
    match terminal.map(|index| &terms[index]) {
        Some(term) => {
            rows.extend(term.operand.pointer.iter().copied());
            rows.push(Requirement::new(term.operand.field, op.into(), right));
        }
        None => rows.push(Requirement::new(Field::value(0), op.into(), right)),
    }
    Ok(rows)
}

/// Move the subtracted side across so every accumulation is additive:
/// `P + |k| op Q` when the bound is not positive, `Q + k op' P` otherwise.
/// Only possible when the side left on the right of the row is one plain
/// term sharing the pointer of the row's left operand.
fn rearranged(
    terms: &[Term],
    op: CompareOp,
    bound: i64,
) -> Result<Option<Vec<Requirement>>, CompileError> {
    let positives: Vec<&Term> = terms.iter().filter(|t| t.coefficient > 0).collect();
    let negatives: Vec<&Term> = terms.iter().filter(|t| t.coefficient < 0).collect();

    let (sum, other, offset, op) = if bound <= 0 {
        (positives, negatives, -bound, op)
    } else {
        (negatives, positives, bound, op.reverse())
    };
    let [compared] = other.as_slice() else {
        return Ok(None);
    };
    if !compared.is_plain() {
        return Ok(None);
    }
    let Some(terminal) = sum.iter().rposition(|t| t.is_plain()) else {
        return Ok(None);
    };
    if sum[terminal].operand.pointer != compared.operand.pointer {
        return Ok(None);
    }

    let mut rows = Vec::new();
    if offset > 0 {
        rows.push(Requirement::modifier(
            RequirementType::AddSource,
            literal(offset)?,
        ));
    }
    for (index, term) in sum.iter().enumerate() {
        if index != terminal {
            rows.extend(accumulate(term, RequirementType::AddSource)?);
        }
    }
    let term = sum[terminal];
    rows.extend(term.operand.pointer.iter().copied());
    rows.push(Requirement::new(
        term.operand.field,
        op.into(),
        compared.operand.field,
    ));
    Ok(Some(rows))
}

/// Add the largest value of every subtracted term to both sides so the
/// accumulator can never wrap below zero. When the left side subtracts memory
/// and is compared against a literal, a positive constant written on the left
/// is kept as the offset instead.
fn compensated(
    left: &Linear,
    right: &Linear,
    terms: &[Term],
    op: CompareOp,
    bound: i64,
) -> Result<Comparison, CompileError> {
    let written_subtraction = left.terms.iter().any(|t| t.coefficient < 0);
    let explicit_offset = written_subtraction
        && left.constant > 0
        && right.terms.is_empty()
        && right.constant >= 0;
    let (offset, right) = if explicit_offset {
        (left.constant, right.constant)
    } else {
        let offset = terms
            .iter()
            .filter(|t| t.coefficient < 0)
            .fold(0_i64, |sum, t| sum.saturating_add(term_max(t)));
        (offset, bound.saturating_add(offset))
    };
    if right < 0 {
        return Ok(Comparison::Constant(matches!(
            op,
            CompareOp::Gt | CompareOp::Gte
        )));
    }
    let limit = i64::from(u32::MAX);
    if offset > limit || right > limit {
        return Err(CompileError::CannotCompensateSubtraction { location: None });
    }
    assemble(offset, terms, literal(right)?, op).map(Comparison::Rows)
}
