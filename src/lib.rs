//! Compiles achievement conditions into memory-polling triggers.
//!
//! A [`Condition`] tree built with the script-style helpers ([`byte`],
//! [`once`], [`never`], ...) is lowered by [`compile()`] into a [`Trigger`]:
//! a core group of [`Requirement`] rows plus optional alternate groups. The
//! optimizer then simplifies it, and [`serial`] writes it in the legacy
//! trigger text that runtimes consume.

mod compile;
mod error;
mod optimize;
pub mod parse;
pub mod render;
pub mod serial;
mod types;

pub use compile::{compile, compile_with, AccessorResolver, StandardAccessors};
pub use error::TriggerError;
pub use optimize::{optimize, MAX_OPTIMIZE_PASSES};
pub use types::{
    bcd, bit, bitcount, byte, deduct, dword, dword_be, high4, low4, measured, measured_percent,
    measured_when, never, once, prev, prior, read, repeated, tally, tbyte, tbyte_be, trigger_when,
    unless, word, word_be, CompareOp, CompileError, CompileOptions, Condition, ErrorKind, Field,
    FieldKind, FieldSize, Location, MeasuredFormat, NumberFormat, RenderOptions, Requirement,
    RequirementClause, RequirementOperator, RequirementType, TallyItem, Trigger, ValueExpr,
};

/// Compile `condition` and write the result as trigger text.
///
/// # Errors
///
/// Returns [`TriggerError::Compile`] if the condition cannot be compiled.
pub fn compile_to_wire(condition: &Condition, options: &CompileOptions) -> Result<String, TriggerError> {
    let trigger = compile(condition, options)?;
    Ok(serial::serialize(&trigger))
}

/// Re-optimize existing trigger text.
///
/// # Errors
///
/// Returns [`TriggerError::Parse`] if `text` is not valid trigger text.
pub fn optimize_wire(text: &str) -> Result<String, TriggerError> {
    let trigger = parse::parse(text)?.optimized();
    Ok(serial::serialize(&trigger))
}
