//! Common identifiers shared by the compiler phases
//!
//! The type tree, symbol table and control-flow graph are all arena
//! allocated; these aliases are the handles that cross crate boundaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index into the type arena
pub type TypeId = u32;

/// Index into the symbol arena
pub type SymbolId = u32;

/// Index into a CFG's block arena
pub type BlockId = u32;

/// Symbol storage classes
///
/// `Declaration` is an extern declaration, `Tentative` a file-scope object
/// that becomes a zero-initialized definition unless an explicit definition
/// appears later in the translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Storage {
    Declaration,
    Tentative,
    Definition,
    Typedef,
    EnumValue,
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Declaration => write!(f, "declaration"),
            Storage::Tentative => write!(f, "tentative"),
            Storage::Definition => write!(f, "definition"),
            Storage::Typedef => write!(f, "typedef"),
            Storage::EnumValue => write!(f, "enum value"),
        }
    }
}

/// Symbol linkage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Linkage {
    None,
    Intern,
    Extern,
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Linkage::None => write!(f, "none"),
            Linkage::Intern => write!(f, "internal"),
            Linkage::Extern => write!(f, "external"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_display() {
        assert_eq!(format!("{}", Storage::Tentative), "tentative");
        assert_eq!(format!("{}", Storage::EnumValue), "enum value");
    }

    #[test]
    fn test_linkage_display() {
        assert_eq!(format!("{}", Linkage::Extern), "external");
    }
}
