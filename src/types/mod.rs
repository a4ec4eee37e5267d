mod clause;
mod error;
mod expr;
mod field;
mod options;
mod requirement;
mod trigger;

pub use clause::RequirementClause;
pub use error::{CompileError, ErrorKind};
pub use expr::{
    bcd, bit, bitcount, byte, deduct, dword, dword_be, high4, low4, measured, measured_percent,
    measured_when, never, once, prev, prior, read, repeated, tally, tbyte, tbyte_be, trigger_when,
    unless, word, word_be, CompareOp, Condition, Location, MeasuredFormat, TallyItem, ValueExpr,
};
pub use field::{Field, FieldKind, FieldSize};
pub use options::{CompileOptions, NumberFormat, RenderOptions};
pub use requirement::{Requirement, RequirementOperator, RequirementType};
pub use trigger::Trigger;
