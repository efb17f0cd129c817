//! Three-address intermediate representation
//!
//! The parser lowers every construct through this module:
//! - `values` - `Var`, the compile-time handle to an operand
//! - `ops` - binary opcodes
//! - `instructions` - IR quadruples
//! - `blocks` - basic blocks and the per-definition CFG arena
//! - `builder` - the evaluator commanded by the parser
//! - `display` - human-readable CFG dump

pub use self::blocks::{Block, Cfg};
pub use self::builder::IrBuilder;
pub use self::display::CfgPrinter;
pub use self::instructions::Instruction;
pub use self::ops::BinOp;
pub use self::values::{Imm, Var};

mod blocks;
mod builder;
mod display;
mod instructions;
mod ops;
mod values;
