//! Quill C Compiler - Frontend
//!
//! This crate translates C89/C99 source into a typed three-address IR:
//! - Lexer: tokenizes the source text
//! - Types: arena-allocated type trees
//! - Symbols: two-namespace symbol table with nested scopes
//! - IR: basic blocks, CFGs and the evaluator that fills them
//! - Parser: single-pass recursive descent from tokens straight to IR

pub mod ir;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod types;
mod cfg_tests;

pub use ir::{BinOp, Block, Cfg, CfgPrinter, Imm, Instruction, IrBuilder, Var};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ParseError, Parser, SwitchContext};
pub use symbols::{Namespace, Symbol, SymbolTable};
pub use types::{Member, Qualifiers, TypeKind, TypeNode, TypeTable};

use qcc_common::CompilerError;

/// Result of translating one source text: the CFGs in definition order,
/// plus the tables they reference.
pub struct Translation {
    pub cfgs: Vec<Cfg>,
    pub types: TypeTable,
    pub symbols: SymbolTable,
}

/// High-level frontend interface
pub struct Frontend;

impl Frontend {
    /// Tokenize source text
    pub fn tokenize(source: &str) -> Result<Vec<Token>, CompilerError> {
        Lexer::new(source).tokenize()
    }

    /// Translate a whole translation unit
    pub fn translate(source: &str) -> Result<Translation, CompilerError> {
        let tokens = Self::tokenize(source)?;
        let mut parser = Parser::new(tokens);
        let mut cfgs = Vec::new();
        while let Some(cfg) = parser.parse()? {
            cfgs.push(cfg);
        }
        let (types, symbols) = parser.into_parts();
        Ok(Translation {
            cfgs,
            types,
            symbols,
        })
    }
}
