//! Expression values
//!
//! Every sub-expression the parser evaluates reduces to one `Var`: a
//! compile-time constant, a direct reference to a symbol (with an offset
//! for member and element access), or the result of a pointer dereference.

use crate::symbols::SymbolTable;
use crate::types::TypeTable;
use qcc_common::{Storage, SymbolId, TypeId};
use serde::{Deserialize, Serialize};

/// Immediate payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Imm {
    Int(i64),
    Str(String),
}

/// Operand handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Var {
    Immediate {
        ty: TypeId,
        value: Imm,
    },
    Direct {
        sym: SymbolId,
        ty: TypeId,
        offset: i64,
        lvalue: bool,
    },
    Deref {
        sym: SymbolId,
        ty: TypeId,
        offset: i64,
        lvalue: bool,
    },
}

impl Var {
    /// Integer constant of type int
    pub fn int(value: i64) -> Var {
        Var::Immediate {
            ty: TypeTable::INT,
            value: Imm::Int(value),
        }
    }

    /// Zero of the given type
    pub fn zero(ty: TypeId) -> Var {
        Var::Immediate {
            ty,
            value: Imm::Int(0),
        }
    }

    /// String literal: immediate of type char [n + 1], decaying to a char
    /// pointer when evaluated.
    pub fn string(text: &str, types: &mut TypeTable) -> Var {
        let ty = types.array_of(TypeTable::CHAR, text.len() as u32 + 1);
        Var::Immediate {
            ty,
            value: Imm::Str(text.to_string()),
        }
    }

    /// Reference to a declared symbol. Enumeration constants collapse to
    /// their integer value here.
    pub fn direct(sym: SymbolId, symbols: &SymbolTable) -> Var {
        let symbol = symbols.symbol(sym);
        if symbol.storage == Storage::EnumValue {
            return Var::int(symbol.enum_value.unwrap_or(0));
        }
        Var::Direct {
            sym,
            ty: symbol.ty,
            offset: 0,
            lvalue: true,
        }
    }

    pub fn ty(&self) -> TypeId {
        match self {
            Var::Immediate { ty, .. } | Var::Direct { ty, .. } | Var::Deref { ty, .. } => *ty,
        }
    }

    pub fn set_ty(&mut self, new_ty: TypeId) {
        match self {
            Var::Immediate { ty, .. } | Var::Direct { ty, .. } | Var::Deref { ty, .. } => {
                *ty = new_ty
            }
        }
    }

    pub fn offset(&self) -> i64 {
        match self {
            Var::Immediate { .. } => 0,
            Var::Direct { offset, .. } | Var::Deref { offset, .. } => *offset,
        }
    }

    pub fn set_offset(&mut self, new_offset: i64) {
        if let Var::Direct { offset, .. } | Var::Deref { offset, .. } = self {
            *offset = new_offset;
        }
    }

    pub fn is_lvalue(&self) -> bool {
        match self {
            Var::Immediate { .. } => false,
            Var::Direct { lvalue, .. } | Var::Deref { lvalue, .. } => *lvalue,
        }
    }

    pub fn clear_lvalue(&mut self) {
        if let Var::Direct { lvalue, .. } | Var::Deref { lvalue, .. } = self {
            *lvalue = false;
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Var::Immediate {
                value: Imm::Int(i), ..
            } => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Var::Immediate {
                value: Imm::Str(s), ..
            } => Some(s),
            _ => None,
        }
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, Var::Immediate { .. })
    }

    /// Integer immediate with a non-zero value
    pub fn is_immediate_true(&self, types: &TypeTable) -> bool {
        types.is_integer(self.ty()) && matches!(self.as_int(), Some(i) if i != 0)
    }

    /// Integer immediate with value zero
    pub fn is_immediate_false(&self, types: &TypeTable) -> bool {
        types.is_integer(self.ty()) && self.as_int() == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_truth() {
        let types = TypeTable::new();
        assert!(Var::int(1).is_immediate_true(&types));
        assert!(!Var::int(1).is_immediate_false(&types));
        assert!(Var::int(0).is_immediate_false(&types));
        assert!(!Var::zero(TypeTable::DOUBLE).is_immediate_false(&types));
    }

    #[test]
    fn test_string_type() {
        let mut types = TypeTable::new();
        let s = Var::string("hi", &mut types);
        assert_eq!(types.size_of(s.ty()), 3);
        assert!(types.is_array(s.ty()));
    }

    #[test]
    fn test_lvalue_flag() {
        let mut v = Var::Direct {
            sym: 0,
            ty: TypeTable::INT,
            offset: 0,
            lvalue: true,
        };
        assert!(v.is_lvalue());
        v.clear_lvalue();
        assert!(!v.is_lvalue());
        assert!(!Var::int(3).is_lvalue());
    }
}
