mod error;
mod grammar;

use std::str::FromStr;

pub use error::ParseError;

use crate::types::Trigger;

/// Parse legacy trigger text into a [`Trigger`].
///
/// The result is exactly what the text describes; no optimization runs.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid trigger text.
pub fn parse(input: &str) -> Result<Trigger, ParseError> {
    use winnow::Parser;
    grammar::parse_trigger
        .parse(input)
        .map_err(|e| ParseError::new(e.inner().to_string(), e.offset()))
}

impl FromStr for Trigger {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}
