//! Statement parsing
//!
//! Selection, iteration, jump and labeled statements, wiring the edges
//! between basic blocks as they are parsed. Loop and switch targets are
//! saved and restored by local binding, so nesting unwinds naturally on
//! both success and error paths.

use crate::ir::BinOp;
use crate::lexer::TokenKind;
use crate::parser::{Parser, SwitchContext};
use log::debug;
use qcc_common::{BlockId, CompilerError};

impl Parser {
    pub(crate) fn statement(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        let location = self.location();
        match self.peek().kind.clone() {
            TokenKind::Semicolon => {
                self.next_token();
                Ok(parent)
            }
            TokenKind::LeftBrace => self.block(parent),
            TokenKind::If => self.if_statement(parent),
            TokenKind::Do => self.do_statement(parent),
            TokenKind::While => self.while_statement(parent),
            TokenKind::For => self.for_statement(parent),
            TokenKind::Switch => self.switch_statement(parent),
            TokenKind::Goto => {
                // Accepted syntactically; labels are not wired into the CFG
                self.next_token();
                self.consume(TokenKind::Identifier(String::new()))?;
                self.consume(TokenKind::Semicolon)?;
                Ok(parent)
            }
            kind @ (TokenKind::Break | TokenKind::Continue) => {
                self.next_token();
                let target = match kind {
                    TokenKind::Break => self.break_target,
                    _ => self.continue_target,
                };
                let Some(target) = target else {
                    return Err(CompilerError::semantic(
                        format!("'{kind}' outside of a loop or switch"),
                        location,
                    ));
                };
                self.cfg.block_mut(parent).jump[0] = Some(target);
                self.consume(TokenKind::Semicolon)?;
                // Orphan block for whatever unreachable code follows
                Ok(self.cfg.new_block())
            }
            TokenKind::Return => self.return_statement(parent),
            TokenKind::Case => self.case_label(parent),
            TokenKind::Default => self.default_label(parent),
            kind @ TokenKind::Identifier(_) => {
                if self.is_typedef_name(&kind) {
                    self.declaration(parent)
                } else {
                    let parent = self.expression(parent)?;
                    self.consume(TokenKind::Semicolon)?;
                    Ok(parent)
                }
            }
            TokenKind::IntConstant(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::Star
            | TokenKind::LeftParen => {
                let parent = self.expression(parent)?;
                self.consume(TokenKind::Semicolon)?;
                Ok(parent)
            }
            _ => self.declaration(parent),
        }
    }

    /// Compound statement: a fresh scope in both namespaces, popped on
    /// every exit path.
    pub(crate) fn block(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        self.consume(TokenKind::LeftBrace)?;
        self.symbols.ident.push_scope();
        self.symbols.tag.push_scope();

        let mut parent = parent;
        let mut failure = None;
        while !self.check(&TokenKind::RightBrace) && !self.check(&TokenKind::EndOfFile) {
            match self.statement(parent) {
                Ok(block) => parent = block,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        if failure.is_none() {
            failure = self.consume(TokenKind::RightBrace).err();
        }

        self.symbols.tag.pop_scope();
        self.symbols.ident.pop_scope();
        match failure {
            Some(err) => Err(err),
            None => Ok(parent),
        }
    }

    /// `if (e) s [else s]`; an immediate condition folds to a single edge
    fn if_statement(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        let right = self.cfg.new_block();
        let next = self.cfg.new_block();

        self.consume(TokenKind::If)?;
        self.consume(TokenKind::LeftParen)?;
        let parent = self.expression(parent)?;
        self.consume(TokenKind::RightParen)?;

        let condition = self.block_expr(parent)?;
        let always = condition.is_immediate_true(&self.types);
        let never = condition.is_immediate_false(&self.types);
        if always {
            self.cfg.block_mut(parent).jump[0] = Some(right);
        } else if never {
            self.cfg.block_mut(parent).jump[0] = Some(next);
        } else {
            self.cfg.block_mut(parent).jump[0] = Some(next);
            self.cfg.block_mut(parent).jump[1] = Some(right);
        }

        let right_tail = self.statement(right)?;
        self.cfg.block_mut(right_tail).jump[0] = Some(next);

        if self.check(&TokenKind::Else) {
            self.next_token();
            let left = self.cfg.new_block();
            // With an always-true condition the else branch stays an orphan
            if !always {
                self.cfg.block_mut(parent).jump[0] = Some(left);
            }
            let left_tail = self.statement(left)?;
            self.cfg.block_mut(left_tail).jump[0] = Some(next);
        }

        Ok(next)
    }

    /// `do s while (e);` with `continue` entering the condition block
    fn do_statement(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        let top = self.cfg.new_block();
        let cond = self.cfg.new_block();
        let next = self.cfg.new_block();

        self.cfg.block_mut(parent).jump[0] = Some(top);
        self.consume(TokenKind::Do)?;

        let saved = (self.break_target, self.continue_target);
        self.break_target = Some(next);
        self.continue_target = Some(cond);
        let body_result = self.statement(top);
        (self.break_target, self.continue_target) = saved;
        let body_tail = body_result?;
        self.cfg.block_mut(body_tail).jump[0] = Some(cond);

        self.consume(TokenKind::While)?;
        self.consume(TokenKind::LeftParen)?;
        let cond_tail = self.expression(cond)?;
        self.consume(TokenKind::RightParen)?;
        self.consume(TokenKind::Semicolon)?;

        let condition = self.block_expr(cond_tail)?;
        if condition.is_immediate_true(&self.types) {
            self.cfg.block_mut(cond_tail).jump[0] = Some(top);
        } else if condition.is_immediate_false(&self.types) {
            self.cfg.block_mut(cond_tail).jump[0] = Some(next);
        } else {
            self.cfg.block_mut(cond_tail).jump[0] = Some(next);
            self.cfg.block_mut(cond_tail).jump[1] = Some(top);
        }

        Ok(next)
    }

    /// `while (e) s`; the condition block is the loop top
    fn while_statement(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        let top = self.cfg.new_block();
        let body = self.cfg.new_block();
        let next = self.cfg.new_block();

        self.cfg.block_mut(parent).jump[0] = Some(top);
        self.consume(TokenKind::While)?;
        self.consume(TokenKind::LeftParen)?;
        let cond_tail = self.expression(top)?;
        self.consume(TokenKind::RightParen)?;

        let condition = self.block_expr(cond_tail)?;
        if condition.is_immediate_true(&self.types) {
            self.cfg.block_mut(cond_tail).jump[0] = Some(body);
        } else if condition.is_immediate_false(&self.types) {
            self.cfg.block_mut(cond_tail).jump[0] = Some(next);
        } else {
            self.cfg.block_mut(cond_tail).jump[0] = Some(next);
            self.cfg.block_mut(cond_tail).jump[1] = Some(body);
        }

        let saved = (self.break_target, self.continue_target);
        self.break_target = Some(next);
        self.continue_target = Some(top);
        let body_result = self.statement(body);
        (self.break_target, self.continue_target) = saved;
        let body_tail = body_result?;
        self.cfg.block_mut(body_tail).jump[0] = Some(top);

        Ok(next)
    }

    /// `for (init; cond; step) s`; any clause may be absent. `continue`
    /// enters the step block, which always jumps back to the loop top.
    fn for_statement(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        let top = self.cfg.new_block();
        let body = self.cfg.new_block();
        let step = self.cfg.new_block();
        let next = self.cfg.new_block();

        self.consume(TokenKind::For)?;
        self.consume(TokenKind::LeftParen)?;

        let mut parent = parent;
        if !self.check(&TokenKind::Semicolon) {
            parent = self.expression(parent)?;
        }
        self.consume(TokenKind::Semicolon)?;

        let loop_top;
        if !self.check(&TokenKind::Semicolon) {
            self.cfg.block_mut(parent).jump[0] = Some(top);
            let cond_tail = self.expression(top)?;
            let condition = self.block_expr(cond_tail)?;
            if condition.is_immediate_true(&self.types) {
                self.cfg.block_mut(cond_tail).jump[0] = Some(body);
            } else if condition.is_immediate_false(&self.types) {
                self.cfg.block_mut(cond_tail).jump[0] = Some(next);
            } else {
                self.cfg.block_mut(cond_tail).jump[0] = Some(next);
                self.cfg.block_mut(cond_tail).jump[1] = Some(body);
            }
            loop_top = top;
        } else {
            // No condition: unconditional loop entering the body directly
            self.cfg.block_mut(parent).jump[0] = Some(body);
            loop_top = body;
        }
        self.consume(TokenKind::Semicolon)?;

        if !self.check(&TokenKind::RightParen) {
            let step_tail = self.expression(step)?;
            self.cfg.block_mut(step_tail).jump[0] = Some(loop_top);
        } else {
            self.cfg.block_mut(step).jump[0] = Some(loop_top);
        }
        self.consume(TokenKind::RightParen)?;

        let saved = (self.break_target, self.continue_target);
        self.break_target = Some(next);
        self.continue_target = Some(step);
        let body_result = self.statement(body);
        (self.break_target, self.continue_target) = saved;
        let body_tail = body_result?;
        self.cfg.block_mut(body_tail).jump[0] = Some(step);

        Ok(next)
    }

    /// `switch (e) s`: the body is parsed first, collecting labels into a
    /// fresh context; afterwards a linear cascade of comparison blocks is
    /// emitted, one per case, falling through to the default label or out.
    fn switch_statement(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        let body = self.cfg.new_block();
        let next = self.cfg.new_block();
        let location = self.location();

        self.consume(TokenKind::Switch)?;
        self.consume(TokenKind::LeftParen)?;
        let parent = self.expression(parent)?;
        self.consume(TokenKind::RightParen)?;

        let saved_break = self.break_target;
        self.break_target = Some(next);
        self.switch_stack.push(SwitchContext {
            default_label: None,
            cases: Vec::new(),
        });
        let body_result = self.statement(body);
        self.break_target = saved_break;
        let context = self
            .switch_stack
            .pop()
            .ok_or_else(|| CompilerError::internal("switch context missing"))?;
        let body_tail = body_result?;
        self.cfg.block_mut(body_tail).jump[0] = Some(next);

        if context.cases.is_empty() && context.default_label.is_none() {
            self.cfg.block_mut(parent).jump[0] = Some(next);
            return Ok(next);
        }

        debug!("switch cascade with {} cases", context.cases.len());
        let condition = self.block_expr(parent)?;
        let mut compare = parent;
        for (value, label) in context.cases {
            let previous = compare;
            compare = self.cfg.new_block();
            let equal = self.ir().eval_expr(
                location,
                compare,
                BinOp::Eq,
                value,
                condition.clone(),
            )?;
            self.cfg.set_expr(compare, equal);
            self.cfg.block_mut(compare).jump[1] = Some(label);
            self.cfg.block_mut(previous).jump[0] = Some(compare);
        }
        self.cfg.block_mut(compare).jump[0] = Some(context.default_label.unwrap_or(next));

        Ok(next)
    }

    /// `case const-expr :` labeled statement inside a switch body
    fn case_label(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        let location = self.location();
        self.consume(TokenKind::Case)?;
        if self.switch_stack.is_empty() {
            return Err(CompilerError::semantic(
                "stray 'case' label, must be inside a switch statement",
                location,
            ));
        }
        let value = self.constant_expression()?;
        self.consume(TokenKind::Colon)?;

        let label = self.cfg.new_block();
        let context = self
            .switch_stack
            .last_mut()
            .ok_or_else(|| CompilerError::internal("switch context missing"))?;
        context.cases.push((value, label));
        self.cfg.block_mut(parent).jump[0] = Some(label);
        self.statement(label)
    }

    /// `default :` labeled statement inside a switch body
    fn default_label(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        let location = self.location();
        self.consume(TokenKind::Default)?;
        self.consume(TokenKind::Colon)?;
        if self.switch_stack.is_empty() {
            return Err(CompilerError::semantic(
                "stray 'default' label, must be inside a switch statement",
                location,
            ));
        }
        let label = self.cfg.new_block();
        let context = self
            .switch_stack
            .last_mut()
            .ok_or_else(|| CompilerError::internal("switch context missing"))?;
        if context.default_label.is_some() {
            return Err(CompilerError::semantic(
                "multiple 'default' labels inside the same switch",
                location,
            ));
        }
        context.default_label = Some(label);
        self.cfg.block_mut(parent).jump[0] = Some(label);
        self.statement(label)
    }

    /// `return [e];` checked against the enclosing function's return type
    fn return_statement(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        let location = self.location();
        self.consume(TokenKind::Return)?;
        let Some(fun) = self.cfg.fun else {
            return Err(CompilerError::semantic(
                "'return' outside of a function",
                location,
            ));
        };
        let fn_ty = self.symbols.symbol(fun).ty;
        let ret = self
            .types
            .ret(fn_ty)
            .ok_or_else(|| CompilerError::internal("function symbol without function type"))?;

        let mut parent = parent;
        if self.types.is_void(ret) {
            if !self.check(&TokenKind::Semicolon) {
                return Err(CompilerError::type_error(
                    "void function cannot return a value",
                    location,
                ));
            }
        } else {
            parent = self.expression(parent)?;
            let value = self.block_expr(parent)?;
            self.ir().eval_return(location, parent, value, ret)?;
        }
        self.consume(TokenKind::Semicolon)?;

        // Code after return is dead; give it an orphan block
        Ok(self.cfg.new_block())
    }
}
