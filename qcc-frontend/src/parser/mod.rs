//! Single-pass C translator
//!
//! A recursive descent parser that lowers declarations, expressions and
//! statements straight into typed three-address IR, building one CFG per
//! external definition. There is no AST: each sub-expression reduces to a
//! `Var` threaded through the current basic block, and control flow is
//! wired as blocks are allocated.
//!
//! The grammar is split across the submodules the way the constructs group:
//! declarations (specifiers, declarators, tags), expressions (the
//! precedence chain), statements (selection, iteration, jumps, labels) and
//! initializers.

pub mod declarations;
pub mod errors;
pub mod expressions;
pub mod initializers;
pub mod statements;

pub use errors::ParseError;

use crate::ir::{Cfg, IrBuilder, Var};
use crate::lexer::{Token, TokenKind};
use crate::symbols::SymbolTable;
use crate::types::TypeTable;
use log::debug;
use qcc_common::{BlockId, CompilerError, SourceLocation, Storage};

/// Labels collected for one switch statement
pub struct SwitchContext {
    pub default_label: Option<BlockId>,
    pub cases: Vec<(Var, BlockId)>,
}

/// Parser state for one translation unit
///
/// The ambient cursors of the translation (current CFG, break/continue
/// targets, active switch) live here and are saved and restored by local
/// binding around nested constructs.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    pub types: TypeTable,
    pub symbols: SymbolTable,
    pub(crate) cfg: Cfg,
    pub(crate) break_target: Option<BlockId>,
    pub(crate) continue_target: Option<BlockId>,
    pub(crate) switch_stack: Vec<SwitchContext>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::EndOfFile, SourceLocation::none()));
        }
        let mut types = TypeTable::new();
        let symbols = SymbolTable::new(&mut types);
        Self {
            tokens,
            position: 0,
            types,
            symbols,
            cfg: Cfg::new(),
            break_target: None,
            continue_target: None,
            switch_stack: Vec::new(),
        }
    }

    // ---- token stream pull interface -----------------------------------

    /// Current token without consuming it
    pub(crate) fn peek(&self) -> &Token {
        self.peekn(1)
    }

    /// Lookahead of k tokens; `peekn(1)` is the current token. The grammar
    /// needs at most two.
    pub(crate) fn peekn(&self, k: usize) -> &Token {
        let index = (self.position + k - 1).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    /// Consume and return the current token
    pub(crate) fn next_token(&mut self) -> Token {
        let token = self.tokens[self.position.min(self.tokens.len() - 1)].clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek().kind.same_kind(kind)
    }

    /// Consume the current token, failing unless it has the given kind
    pub(crate) fn consume(&mut self, kind: TokenKind) -> Result<Token, CompilerError> {
        if self.check(&kind) {
            Ok(self.next_token())
        } else {
            let found = self.peek();
            let err = if matches!(found.kind, TokenKind::EndOfFile) {
                ParseError::UnexpectedEndOfFile {
                    expected: format!("'{kind}'"),
                    location: found.location,
                }
            } else {
                ParseError::UnexpectedToken {
                    expected: format!("'{kind}'"),
                    found: found.kind.clone(),
                    location: found.location,
                }
            };
            Err(err.into())
        }
    }

    pub(crate) fn location(&self) -> SourceLocation {
        self.peek().location
    }

    // ---- classifiers ---------------------------------------------------

    /// FIRST(type-name): a type specifier or qualifier keyword
    pub(crate) fn is_type_specifier_start(kind: &TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Void
                | TokenKind::Char
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Signed
                | TokenKind::Unsigned
                | TokenKind::Struct
                | TokenKind::Union
                | TokenKind::Enum
                | TokenKind::Const
                | TokenKind::Volatile
        )
    }

    /// Identifier currently bound to a typedef
    pub(crate) fn is_typedef_name(&self, kind: &TokenKind) -> bool {
        match kind {
            TokenKind::Identifier(name) => self
                .symbols
                .lookup_ident(name)
                .is_some_and(|id| self.symbols.symbol(id).storage == Storage::Typedef),
            _ => false,
        }
    }

    /// True when the token could begin a type-name (used to disambiguate
    /// casts and sizeof with two-token lookahead)
    pub(crate) fn begins_type_name(&self, kind: &TokenKind) -> bool {
        Self::is_type_specifier_start(kind) || self.is_typedef_name(kind)
    }

    // ---- evaluator access ----------------------------------------------

    pub(crate) fn ir(&mut self) -> IrBuilder<'_> {
        IrBuilder::new(&mut self.types, &mut self.symbols, &mut self.cfg)
    }

    /// Give up the tables once parsing is done
    pub fn into_parts(self) -> (TypeTable, SymbolTable) {
        (self.types, self.symbols)
    }

    // ---- driver --------------------------------------------------------

    /// Translate external declarations until one produces output: a
    /// function body, or load-time initialization code. Returns the
    /// completed CFG, or `None` at end of input.
    pub fn parse(&mut self) -> Result<Option<Cfg>, CompilerError> {
        if self.check(&TokenKind::EndOfFile) {
            return Ok(None);
        }
        self.cfg = Cfg::new();

        while !self.check(&TokenKind::EndOfFile) {
            self.cfg.fun = None;
            let body = self.cfg.body;
            self.declaration(body)?;
            if self.cfg.has_output() {
                debug!(
                    "external definition complete ({})",
                    match self.cfg.fun {
                        Some(sym) => self.symbols.symbol(sym).name.clone(),
                        None => "load-time init".to_string(),
                    }
                );
                return Ok(Some(std::mem::take(&mut self.cfg)));
            }
        }
        Ok(None)
    }
}
