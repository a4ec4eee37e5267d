use std::fmt;

/// Errors produced when parsing trigger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    message: String,
    offset: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// Byte offset into the input where parsing stopped.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "parse error at offset {}", self.offset)
        } else {
            write!(f, "parse error at offset {}: {}", self.offset, self.message)
        }
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParseError::new("expected operand", 4);
        assert_eq!(err.to_string(), "parse error at offset 4: expected operand");
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn error_display_without_message() {
        assert_eq!(ParseError::new("", 0).to_string(), "parse error at offset 0");
    }

    #[test]
    fn offset_points_at_failure() {
        let err = crate::parse::parse("0xH000001=1_0xH000002=").unwrap_err();
        assert_eq!(err.offset(), 22);
    }
}
