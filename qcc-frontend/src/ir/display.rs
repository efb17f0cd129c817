//! Human-readable CFG dump
//!
//! Rendering needs the symbol and type tables to resolve names, so the
//! printer borrows all three and implements `Display`.

use crate::ir::{Cfg, Imm, Instruction, Var};
use crate::symbols::SymbolTable;
use crate::types::TypeTable;
use std::fmt;

pub struct CfgPrinter<'a> {
    cfg: &'a Cfg,
    symbols: &'a SymbolTable,
    types: &'a TypeTable,
}

impl<'a> CfgPrinter<'a> {
    pub fn new(cfg: &'a Cfg, symbols: &'a SymbolTable, types: &'a TypeTable) -> Self {
        Self {
            cfg,
            symbols,
            types,
        }
    }

    fn fmt_var(&self, f: &mut fmt::Formatter<'_>, var: &Var) -> fmt::Result {
        match var {
            Var::Immediate {
                value: Imm::Int(i), ..
            } => write!(f, "{i}"),
            Var::Immediate {
                value: Imm::Str(s), ..
            } => write!(f, "{:?}", s),
            Var::Direct { sym, offset, .. } => {
                let name = &self.symbols.symbol(*sym).name;
                if *offset != 0 {
                    write!(f, "{name}+{offset}")
                } else {
                    write!(f, "{name}")
                }
            }
            Var::Deref { sym, offset, .. } => {
                let name = &self.symbols.symbol(*sym).name;
                if *offset != 0 {
                    write!(f, "*({name}+{offset})")
                } else {
                    write!(f, "*{name}")
                }
            }
        }
    }

    fn fmt_instruction(&self, f: &mut fmt::Formatter<'_>, instr: &Instruction) -> fmt::Result {
        write!(f, "    ")?;
        match instr {
            Instruction::Assign { target, value } => {
                self.fmt_var(f, target)?;
                write!(f, " := ")?;
                self.fmt_var(f, value)
            }
            Instruction::Binary {
                op,
                target,
                left,
                right,
            } => {
                self.fmt_var(f, target)?;
                write!(f, " := ")?;
                self.fmt_var(f, left)?;
                write!(f, " {op} ")?;
                self.fmt_var(f, right)
            }
            Instruction::Not { target, value } => {
                self.fmt_var(f, target)?;
                write!(f, " := ~")?;
                self.fmt_var(f, value)
            }
            Instruction::Addr { target, value } => {
                self.fmt_var(f, target)?;
                write!(f, " := &")?;
                self.fmt_var(f, value)
            }
            Instruction::Cast { target, value } => {
                self.fmt_var(f, target)?;
                write!(f, " := ({}) ", self.types.to_string(target.ty()))?;
                self.fmt_var(f, value)
            }
            Instruction::Param { value } => {
                write!(f, "param ")?;
                self.fmt_var(f, value)
            }
            Instruction::Call { target, func } => {
                if let Some(target) = target {
                    self.fmt_var(f, target)?;
                    write!(f, " := ")?;
                }
                write!(f, "call ")?;
                self.fmt_var(f, func)
            }
            Instruction::Return { value } => {
                write!(f, "ret")?;
                if let Some(value) = value {
                    write!(f, " ")?;
                    self.fmt_var(f, value)?;
                }
                Ok(())
            }
            Instruction::VaStart { list } => {
                write!(f, "va_start ")?;
                self.fmt_var(f, list)
            }
            Instruction::VaArg { target, list } => {
                self.fmt_var(f, target)?;
                write!(f, " := va_arg ")?;
                self.fmt_var(f, list)
            }
        }
    }
}

impl fmt::Display for CfgPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cfg.fun {
            Some(sym) => {
                let symbol = self.symbols.symbol(sym);
                writeln!(f, "{} {}:", self.types.to_string(symbol.ty), symbol.name)?;
            }
            None => writeln!(f, "(load-time initialization):")?,
        }

        let mut order = self.cfg.reachable_from(self.cfg.init_entry());
        if self.cfg.fun.is_some() {
            for id in self.cfg.reachable_from(self.cfg.body) {
                if !order.contains(&id) {
                    order.push(id);
                }
            }
        }

        for id in order {
            let block = self.cfg.block(id);
            if block.is_empty() && block.jump == [None, None] && id != self.cfg.body {
                continue;
            }
            writeln!(f, ".L{id}:")?;
            for instr in &block.code {
                self.fmt_instruction(f, instr)?;
                writeln!(f)?;
            }
            match block.jump {
                [Some(fallthrough), Some(taken)] => {
                    write!(f, "    if ")?;
                    if let Some(expr) = &block.expr {
                        self.fmt_var(f, expr)?;
                    }
                    writeln!(f, " goto .L{taken} else .L{fallthrough}")?;
                }
                [Some(target), None] => writeln!(f, "    jump .L{target}")?,
                _ => {}
            }
        }
        Ok(())
    }
}
