use thiserror::Error;

use super::expr::Location;

/// Broad class of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The expression is malformed.
    Structural,
    /// Well-formed, but not expressible in the flat trigger format.
    Unsupported,
    /// A comparison reduces to a constant.
    Impossible,
    /// Nothing meaningful is left to emit.
    Degenerate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("unknown memory accessor '{accessor}'")]
    UnknownAccessor {
        accessor: String,
        location: Option<Location>,
    },

    #[error("repeat count must be greater than zero")]
    ZeroRepeatCount { location: Option<Location> },

    #[error("division by zero")]
    DivisionByZero { location: Option<Location> },

    #[error("address {address} is outside the 32-bit address space")]
    AddressOutOfRange {
        address: i64,
        location: Option<Location>,
    },

    #[error("{modifier}() cannot wrap another prev/prior/bcd")]
    NestedMemoryModifier {
        modifier: &'static str,
        location: Option<Location>,
    },

    #[error("{modifier}() requires a memory read")]
    ModifierWithoutMemory {
        modifier: &'static str,
        location: Option<Location>,
    },

    #[error("cannot normalize expression to eliminate multiplication")]
    CannotEliminateMultiplication { location: Option<Location> },

    #[error("cannot normalize expression containing division")]
    CannotNormalizeDivision { location: Option<Location> },

    #[error("negative pointer offset {offset}")]
    NegativeOffset {
        offset: i64,
        location: Option<Location>,
    },

    #[error("cannot compensate subtraction: offset exceeds the 32-bit range")]
    CannotCompensateSubtraction { location: Option<Location> },

    #[error("address must be a constant or a pointer read plus a constant offset")]
    ComplexAddress { location: Option<Location> },

    #[error("measured target {second} does not match earlier target {first}")]
    MismatchedMeasuredTargets {
        first: u32,
        second: u32,
        location: Option<Location>,
    },

    #[error("condition chain mixes && and || too deeply")]
    ChainTooComplex { location: Option<Location> },

    #[error("{construct} is not supported here")]
    UnsupportedNesting {
        construct: &'static str,
        location: Option<Location>,
    },

    #[error("tally requires at least one non-deducted condition")]
    NoCountedTallyItem { location: Option<Location> },

    #[error("value {value} cannot be represented as an unsigned 32-bit value")]
    ValueOutOfRange {
        value: i64,
        location: Option<Location>,
    },

    #[error("expression can never be true")]
    NeverTrue { location: Option<Location> },

    #[error("expression is always true")]
    AlwaysTrue { location: Option<Location> },

    #[error("tally requires at least one condition")]
    EmptyTally { location: Option<Location> },

    #[error("trigger has no truthy conditions")]
    NoTruthyConditions { location: Option<Location> },
}

impl CompileError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::UnknownAccessor { .. }
            | CompileError::ZeroRepeatCount { .. }
            | CompileError::DivisionByZero { .. }
            | CompileError::AddressOutOfRange { .. }
            | CompileError::NestedMemoryModifier { .. }
            | CompileError::ModifierWithoutMemory { .. } => ErrorKind::Structural,
            CompileError::CannotEliminateMultiplication { .. }
            | CompileError::CannotNormalizeDivision { .. }
            | CompileError::CannotCompensateSubtraction { .. }
            | CompileError::NegativeOffset { .. }
            | CompileError::ComplexAddress { .. }
            | CompileError::MismatchedMeasuredTargets { .. }
            | CompileError::ChainTooComplex { .. }
            | CompileError::UnsupportedNesting { .. }
            | CompileError::NoCountedTallyItem { .. }
            | CompileError::ValueOutOfRange { .. } => ErrorKind::Unsupported,
            CompileError::NeverTrue { .. } | CompileError::AlwaysTrue { .. } => {
                ErrorKind::Impossible
            }
            CompileError::EmptyTally { .. } | CompileError::NoTruthyConditions { .. } => {
                ErrorKind::Degenerate
            }
        }
    }

    /// Span of the innermost located condition that produced the error.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            CompileError::UnknownAccessor { location, .. }
            | CompileError::ZeroRepeatCount { location }
            | CompileError::DivisionByZero { location }
            | CompileError::AddressOutOfRange { location, .. }
            | CompileError::NestedMemoryModifier { location, .. }
            | CompileError::ModifierWithoutMemory { location, .. }
            | CompileError::CannotEliminateMultiplication { location }
            | CompileError::CannotNormalizeDivision { location }
            | CompileError::CannotCompensateSubtraction { location }
            | CompileError::NegativeOffset { location, .. }
            | CompileError::ComplexAddress { location }
            | CompileError::MismatchedMeasuredTargets { location, .. }
            | CompileError::ChainTooComplex { location }
            | CompileError::UnsupportedNesting { location, .. }
            | CompileError::NoCountedTallyItem { location }
            | CompileError::ValueOutOfRange { location, .. }
            | CompileError::NeverTrue { location }
            | CompileError::AlwaysTrue { location }
            | CompileError::EmptyTally { location }
            | CompileError::NoTruthyConditions { location } => *location,
        }
    }

    fn location_mut(&mut self) -> &mut Option<Location> {
        match self {
            CompileError::UnknownAccessor { location, .. }
            | CompileError::ZeroRepeatCount { location }
            | CompileError::DivisionByZero { location }
            | CompileError::AddressOutOfRange { location, .. }
            | CompileError::NestedMemoryModifier { location, .. }
            | CompileError::ModifierWithoutMemory { location, .. }
            | CompileError::CannotEliminateMultiplication { location }
            | CompileError::CannotNormalizeDivision { location }
            | CompileError::CannotCompensateSubtraction { location }
            | CompileError::NegativeOffset { location, .. }
            | CompileError::ComplexAddress { location }
            | CompileError::MismatchedMeasuredTargets { location, .. }
            | CompileError::ChainTooComplex { location }
            | CompileError::UnsupportedNesting { location, .. }
            | CompileError::NoCountedTallyItem { location }
            | CompileError::ValueOutOfRange { location, .. }
            | CompileError::NeverTrue { location }
            | CompileError::AlwaysTrue { location }
            | CompileError::EmptyTally { location }
            | CompileError::NoTruthyConditions { location } => location,
        }
    }

    /// Attach `location` unless a more specific one is already set.
    #[must_use]
    pub(crate) fn located(mut self, location: Location) -> Self {
        let slot = self.location_mut();
        if slot.is_none() {
            *slot = Some(location);
        }
        self
    }
}
