//! Error handling for the Quill C compiler
//!
//! One variant per error kind the translator can report. Every parser
//! entry point returns `Result<_, CompilerError>`; the driver is the only
//! place that turns an error into a process exit.

use crate::source_loc::SourceLocation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Compiler error carrying kind, location and a human-readable message
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompilerError {
    #[error("lexical error at {location}: {message}")]
    Lex {
        location: SourceLocation,
        message: String,
    },

    /// Unexpected token, missing punctuation
    #[error("syntax error at {location}: {message}")]
    Syntax {
        location: SourceLocation,
        message: String,
    },

    /// Undefined identifier, duplicate definition, wrong kind of tag
    #[error("symbol error at {location}: {message}")]
    Symbol {
        location: SourceLocation,
        message: String,
    },

    /// Invalid specifier combination, incomplete type, wrong arity, ...
    #[error("type error at {location}: {message}")]
    Type {
        location: SourceLocation,
        message: String,
    },

    /// Extern with initializer, stray case/default, non-constant load-time
    /// initializer, ...
    #[error("semantic error at {location}: {message}")]
    Semantic {
        location: SourceLocation,
        message: String,
    },

    #[error("{message}")]
    Io { message: String },

    /// Should be unreachable
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl CompilerError {
    pub fn lex(message: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::Lex {
            location,
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::Syntax {
            location,
            message: message.into(),
        }
    }

    pub fn symbol(message: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::Symbol {
            location,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::Type {
            location,
            message: message.into(),
        }
    }

    pub fn semantic(message: impl Into<String>, location: SourceLocation) -> Self {
        CompilerError::Semantic {
            location,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompilerError::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompilerError::syntax("expected ';'", SourceLocation::new(3, 14));
        assert_eq!(format!("{}", err), "syntax error at 3:14: expected ';'");
    }

    #[test]
    fn test_type_error_display() {
        let err = CompilerError::type_error("invalid type specification", SourceLocation::new(1, 1));
        assert_eq!(
            format!("{}", err),
            "type error at 1:1: invalid type specification"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.c");
        let err: CompilerError = io.into();
        assert!(matches!(err, CompilerError::Io { .. }));
    }
}
