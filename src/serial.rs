//! Serialization of compiled triggers into the legacy trigger text.
//!
//! ## Wire Format
//!
//! ```text
//! trigger  := core ('S' group)*
//! group    := row ('_' row)*
//! row      := flag? operand (operator operand)? ('.' hits '.')?
//! flag     := one of R P A B C D N O M G Q I T Z, followed by ':'
//! operand  := ('d' | 'p' | 'b')? '0x' size address | decimal
//! ```
//!
//! Addresses are written as six lowercase hex digits. An empty core followed
//! by alternates is written as `1=1`, which older runtimes require.

use std::fmt;

use crate::types::{
    Field, FieldKind, FieldSize, Requirement, RequirementOperator, RequirementType, Trigger,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Flag letter for every role except plain filters.
pub(crate) const FLAGS: [(char, RequirementType); 14] = [
    ('R', RequirementType::ResetIf),
    ('P', RequirementType::PauseIf),
    ('A', RequirementType::AddSource),
    ('B', RequirementType::SubSource),
    ('C', RequirementType::AddHits),
    ('D', RequirementType::SubHits),
    ('N', RequirementType::AndNext),
    ('O', RequirementType::OrNext),
    ('M', RequirementType::Measured),
    ('G', RequirementType::MeasuredPercent),
    ('Q', RequirementType::MeasuredIf),
    ('I', RequirementType::AddAddress),
    ('T', RequirementType::Trigger),
    ('Z', RequirementType::ResetNextIf),
];

/// Size letter following `0x`. A word read is written with a space.
pub(crate) const SIZES: [(char, FieldSize); 18] = [
    ('M', FieldSize::Bit0),
    ('N', FieldSize::Bit1),
    ('O', FieldSize::Bit2),
    ('P', FieldSize::Bit3),
    ('Q', FieldSize::Bit4),
    ('R', FieldSize::Bit5),
    ('S', FieldSize::Bit6),
    ('T', FieldSize::Bit7),
    ('L', FieldSize::LowNibble),
    ('U', FieldSize::HighNibble),
    ('H', FieldSize::Byte),
    (' ', FieldSize::Word),
    ('W', FieldSize::TByte),
    ('X', FieldSize::DWord),
    ('I', FieldSize::BigEndianWord),
    ('J', FieldSize::BigEndianTByte),
    ('G', FieldSize::BigEndianDWord),
    ('K', FieldSize::BitCount),
];

fn flag_letter(kind: RequirementType) -> Option<char> {
    FLAGS
        .iter()
        .find(|(_, flag)| *flag == kind)
        .map(|(letter, _)| *letter)
}

fn size_letter(size: FieldSize) -> char {
    SIZES
        .iter()
        .find(|(_, candidate)| *candidate == size)
        .map_or(' ', |(letter, _)| *letter)
}

pub(crate) fn operator_symbol(operator: RequirementOperator) -> &'static str {
    match operator {
        RequirementOperator::None => "",
        RequirementOperator::Equal => "=",
        RequirementOperator::NotEqual => "!=",
        RequirementOperator::LessThan => "<",
        RequirementOperator::LessThanOrEqual => "<=",
        RequirementOperator::GreaterThan => ">",
        RequirementOperator::GreaterThanOrEqual => ">=",
        RequirementOperator::Multiply => "*",
        RequirementOperator::Divide => "/",
        RequirementOperator::BitwiseAnd => "&",
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            FieldKind::Value => return write!(f, "{}", self.value),
            FieldKind::None => return Ok(()),
            FieldKind::Memory => "",
            FieldKind::Delta => "d",
            FieldKind::Prior => "p",
            FieldKind::Bcd => "b",
        };
        write!(f, "{prefix}0x{}{:06x}", size_letter(self.size), self.value)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(letter) = flag_letter(self.kind) {
            write!(f, "{letter}:")?;
        }
        write!(f, "{}", self.left)?;
        if self.operator != RequirementOperator::None {
            write!(f, "{}{}", operator_symbol(self.operator), self.right)?;
        }
        if self.hit_count > 0 {
            write!(f, ".{}.", self.hit_count)?;
        }
        Ok(())
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, group: &[Requirement]) -> fmt::Result {
    for (index, requirement) in group.iter().enumerate() {
        if index > 0 {
            f.write_str("_")?;
        }
        write!(f, "{requirement}")?;
    }
    Ok(())
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.core.is_empty() && !self.alternates.is_empty() {
            write!(f, "{}", Requirement::always_true())?;
        } else {
            write_group(f, &self.core)?;
        }
        for alternate in &self.alternates {
            f.write_str("S")?;
            write_group(f, alternate)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Write `trigger` in the legacy trigger text.
#[must_use]
pub fn serialize(trigger: &Trigger) -> String {
    trigger.to_string()
}
