use thiserror::Error;

use crate::parse::ParseError;
use crate::CompileError;

/// Unified error type covering trigger text parsing and condition compilation.
///
/// Returned by convenience functions like [`compile_to_wire()`](crate::compile_to_wire).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_without_changing_the_message() {
        let compile = CompileError::ZeroRepeatCount { location: None };
        let message = compile.to_string();
        let err: TriggerError = compile.into();
        assert_eq!(err.to_string(), message);

        let parse = crate::parse::parse("R:").unwrap_err();
        let message = parse.to_string();
        let err: TriggerError = parse.into();
        assert!(matches!(err, TriggerError::Parse(_)));
        assert_eq!(err.to_string(), message);
    }
}
