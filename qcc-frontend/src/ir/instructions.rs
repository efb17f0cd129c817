//! IR instructions
//!
//! Three-address quadruples. Operands are `Var`s of any kind; memory
//! operands (direct references and dereferences) stay symbolic, so there
//! are no separate load/store opcodes.

use crate::ir::{BinOp, Var};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// target := value
    Assign { target: Var, value: Var },
    /// target := left op right
    Binary {
        op: BinOp,
        target: Var,
        left: Var,
        right: Var,
    },
    /// target := ~value
    Not { target: Var, value: Var },
    /// target := &value
    Addr { target: Var, value: Var },
    /// target := (type of target) value
    Cast { target: Var, value: Var },
    /// Push one argument for the next call
    Param { value: Var },
    /// target := call func, or a plain call for void results
    Call { target: Option<Var>, func: Var },
    /// Return from the current function
    Return { value: Option<Var> },
    /// Initialize a variable argument list
    VaStart { list: Var },
    /// target := next variable argument
    VaArg { target: Var, list: Var },
}
