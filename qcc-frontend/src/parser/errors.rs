//! Parse error types
//!
//! Local error forms raised while matching tokens, converted into the
//! shared `CompilerError` at the parser boundary.

use crate::lexer::TokenKind;
use qcc_common::{CompilerError, SourceLocation};

#[derive(Debug, Clone)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        location: SourceLocation,
    },
    UnexpectedEndOfFile {
        expected: String,
        location: SourceLocation,
    },
}

impl From<ParseError> for CompilerError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnexpectedToken {
                expected,
                found,
                location,
            } => CompilerError::syntax(
                format!("expected {expected}, found '{found}'"),
                location,
            ),
            ParseError::UnexpectedEndOfFile { expected, location } => {
                CompilerError::syntax(format!("unexpected end of file, expected {expected}"), location)
            }
        }
    }
}
