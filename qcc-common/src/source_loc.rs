//! Source location tracking for error reporting
//!
//! Every token carries the location it was scanned at; errors raised
//! anywhere in the translator point back to one of these.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in the translation unit (line and column are 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Location for errors with no useful position (end of input, internal)
    pub fn none() -> Self {
        Self { line: 0, column: 0 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let loc = SourceLocation::new(42, 10);
        assert_eq!(format!("{}", loc), "42:10");
    }

    #[test]
    fn test_none_location() {
        let loc = SourceLocation::none();
        assert_eq!(loc.line, 0);
        assert_eq!(loc.column, 0);
    }
}
