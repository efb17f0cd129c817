//! Expression parsing
//!
//! Classical precedence climb, lowering as it goes. Each method takes the
//! current block, may allocate and enter new blocks (short-circuit
//! operators, the ternary), and returns the block that now holds the
//! expression's value.

use crate::ir::{BinOp, Var};
use crate::lexer::TokenKind;
use crate::parser::Parser;
use qcc_common::{BlockId, CompilerError, SourceLocation, TypeId};

impl Parser {
    /// Value left behind by an expression block
    pub(crate) fn block_expr(&self, block: BlockId) -> Result<Var, CompilerError> {
        self.cfg
            .expr(block)
            .ok_or_else(|| CompilerError::internal("expression block has no value"))
    }

    /// `va_start(list, last_param)`; the second argument must name the
    /// last declared parameter of the current function.
    fn builtin_va_start(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        self.consume(TokenKind::LeftParen)?;
        let block = self.assignment_expression(block)?;
        self.consume(TokenKind::Comma)?;
        let param = self.consume(TokenKind::Identifier(String::new()))?;
        let TokenKind::Identifier(name) = param.kind else {
            return Err(CompilerError::internal("identifier token without name"));
        };

        let valid = self.symbols.lookup_ident(&name).is_some_and(|sym| {
            if self.symbols.symbol(sym).depth != 1 {
                return false;
            }
            let Some(fun) = self.cfg.fun else {
                return false;
            };
            let fn_ty = self.symbols.symbol(fun).ty;
            let n = self.types.nmembers(fn_ty);
            n > 0 && self.types.member(fn_ty, n - 1).name.as_deref() == Some(name.as_str())
        });
        if !valid {
            return Err(CompilerError::semantic(
                "second parameter of va_start must be the last named parameter",
                param.location,
            ));
        }

        self.consume(TokenKind::RightParen)?;
        let list = self.block_expr(block)?;
        let value = self.ir().eval_va_start(block, list);
        self.cfg.set_expr(block, value);
        Ok(block)
    }

    /// `va_arg(list, type)`
    fn builtin_va_arg(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        self.consume(TokenKind::LeftParen)?;
        let block = self.assignment_expression(block)?;
        self.consume(TokenKind::Comma)?;
        let ty = self.type_name()?;
        self.consume(TokenKind::RightParen)?;
        let list = self.block_expr(block)?;
        let value = self.ir().eval_va_arg(block, list, ty);
        self.cfg.set_expr(block, value);
        Ok(block)
    }

    fn primary_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let token = self.next_token();
        match token.kind {
            TokenKind::Identifier(name) => {
                let Some(sym) = self.symbols.lookup_ident(&name) else {
                    return Err(CompilerError::symbol(
                        format!("undefined symbol '{name}'"),
                        token.location,
                    ));
                };
                // The builtin pseudo functions behave like macros and are
                // parsed as calls right here.
                if name == "__builtin_va_start" {
                    return self.builtin_va_start(block);
                }
                if name == "__builtin_va_arg" {
                    return self.builtin_va_arg(block);
                }
                let value = Var::direct(sym, &self.symbols);
                self.cfg.set_expr(block, value);
                Ok(block)
            }
            TokenKind::IntConstant(value) => {
                self.cfg.set_expr(block, Var::int(value));
                Ok(block)
            }
            TokenKind::StringLiteral(text) => {
                let value = Var::string(&text, &mut self.types);
                self.cfg.set_expr(block, value);
                Ok(block)
            }
            TokenKind::LeftParen => {
                let block = self.expression(block)?;
                self.consume(TokenKind::RightParen)?;
                Ok(block)
            }
            other => Err(CompilerError::syntax(
                format!("unexpected token '{other}', not a valid primary expression"),
                token.location,
            )),
        }
    }

    /// Function call postfix: arity against the callee's parameter list,
    /// extra arguments only for variadic functions.
    fn call_arguments(
        &mut self,
        block: BlockId,
        root: Var,
        location: SourceLocation,
    ) -> Result<(BlockId, Var), CompilerError> {
        let root_ty = root.ty();
        let fn_ty = if self.types.is_pointer(root_ty)
            && self.types.deref(root_ty).is_some_and(|t| self.types.is_function(t))
        {
            self.types.deref(root_ty).unwrap_or(root_ty)
        } else if self.types.is_function(root_ty) {
            root_ty
        } else {
            return Err(CompilerError::type_error(
                format!(
                    "expression must have type pointer to function, was '{}'",
                    self.types.to_string(root_ty)
                ),
                location,
            ));
        };

        self.consume(TokenKind::LeftParen)?;
        let n = self.types.nmembers(fn_ty);
        let declared: Vec<Option<TypeId>> = (0..n).map(|i| self.types.member(fn_ty, i).ty).collect();
        let vararg = self.types.is_vararg(fn_ty);

        let mut block = block;
        let mut arguments: Vec<(Var, Option<TypeId>, SourceLocation)> = Vec::new();
        for (i, expected) in declared.into_iter().enumerate() {
            if self.check(&TokenKind::RightParen) {
                return Err(CompilerError::type_error(
                    format!("too few arguments, expected {n} but got {i}"),
                    self.location(),
                ));
            }
            let arg_location = self.location();
            block = self.assignment_expression(block)?;
            arguments.push((self.block_expr(block)?, expected, arg_location));
            if i < n - 1 {
                self.consume(TokenKind::Comma)?;
            }
        }
        while vararg && !self.check(&TokenKind::RightParen) {
            self.consume(TokenKind::Comma)?;
            let arg_location = self.location();
            block = self.assignment_expression(block)?;
            arguments.push((self.block_expr(block)?, None, arg_location));
        }
        self.consume(TokenKind::RightParen)?;

        for (argument, expected, arg_location) in arguments {
            self.ir().param(arg_location, block, argument, expected)?;
        }
        let result = self.ir().eval_call(block, root)?;
        Ok((block, result))
    }

    fn postfix_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let mut block = self.primary_expression(block)?;
        let mut root = self.block_expr(block)?;

        loop {
            let location = self.location();
            match self.peek().kind.clone() {
                TokenKind::LeftBracket => {
                    // a[b] is *(a + b); pointer arithmetic supplies the
                    // element scaling
                    self.next_token();
                    block = self.expression(block)?;
                    let index = self.block_expr(block)?;
                    root = self.ir().eval_expr(location, block, BinOp::Add, root, index)?;
                    root = self.ir().eval_deref(location, block, root)?;
                    self.consume(TokenKind::RightBracket)?;
                }
                TokenKind::LeftParen => {
                    (block, root) = self.call_arguments(block, root, location)?;
                }
                TokenKind::Dot => {
                    self.next_token();
                    let token = self.consume(TokenKind::Identifier(String::new()))?;
                    let TokenKind::Identifier(field_name) = token.kind else {
                        return Err(CompilerError::internal("identifier token without name"));
                    };
                    if !self.types.is_struct_or_union(root.ty()) {
                        return Err(CompilerError::type_error(
                            "invalid field access on non-aggregate value",
                            token.location,
                        ));
                    }
                    let Some(field) = self.types.find_member(root.ty(), &field_name) else {
                        return Err(CompilerError::type_error(
                            format!("invalid field access, no member named '{field_name}'"),
                            token.location,
                        ));
                    };
                    let field_ty = field
                        .ty
                        .ok_or_else(|| CompilerError::internal("member without type"))?;
                    root.set_offset(root.offset() + field.offset as i64);
                    root.set_ty(field_ty);
                }
                TokenKind::Arrow => {
                    self.next_token();
                    let token = self.consume(TokenKind::Identifier(String::new()))?;
                    let TokenKind::Identifier(field_name) = token.kind else {
                        return Err(CompilerError::internal("identifier token without name"));
                    };
                    let aggregate = self.types.deref(root.ty());
                    if !self.types.is_pointer(root.ty())
                        || !aggregate.is_some_and(|t| self.types.is_struct_or_union(t))
                    {
                        return Err(CompilerError::type_error(
                            "invalid field access",
                            token.location,
                        ));
                    }
                    let aggregate = aggregate.unwrap_or(root.ty());
                    let Some(field) = self.types.find_member(aggregate, &field_name) else {
                        return Err(CompilerError::type_error(
                            format!("invalid field access, no member named '{field_name}'"),
                            token.location,
                        ));
                    };
                    let field_ty = field
                        .ty
                        .ok_or_else(|| CompilerError::internal("member without type"))?;
                    // Retype as pointer to the field, dereference, then
                    // displace to the member
                    let field_ptr = self.types.pointer_to(field_ty);
                    root.set_ty(field_ptr);
                    root = self.ir().eval_deref(location, block, root)?;
                    root.set_offset(field.offset as i64);
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = match self.next_token().kind {
                        TokenKind::PlusPlus => BinOp::Add,
                        _ => BinOp::Sub,
                    };
                    // Yield the original value from a copy, then store the
                    // stepped value back; exactly one store to the operand.
                    let copy = {
                        let mut ir = self.ir();
                        ir.temporary(root.ty())
                    };
                    self.ir()
                        .eval_assign(location, block, copy.clone(), root.clone())?;
                    let stepped =
                        self.ir()
                            .eval_expr(location, block, op, root.clone(), Var::int(1))?;
                    self.ir().eval_assign(location, block, root, stepped)?;
                    root = copy;
                }
                _ => {
                    self.cfg.set_expr(block, root);
                    return Ok(block);
                }
            }
        }
    }

    fn unary_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let location = self.location();
        match self.peek().kind.clone() {
            TokenKind::Ampersand => {
                self.next_token();
                let block = self.cast_expression(block)?;
                let value = self.block_expr(block)?;
                let value = self.ir().eval_addr(location, block, value)?;
                self.cfg.set_expr(block, value);
                Ok(block)
            }
            TokenKind::Star => {
                self.next_token();
                let block = self.cast_expression(block)?;
                let value = self.block_expr(block)?;
                let value = self.ir().eval_deref(location, block, value)?;
                self.cfg.set_expr(block, value);
                Ok(block)
            }
            TokenKind::Bang => {
                self.next_token();
                let block = self.cast_expression(block)?;
                let value = self.block_expr(block)?;
                let value = self
                    .ir()
                    .eval_expr(location, block, BinOp::Eq, Var::int(0), value)?;
                self.cfg.set_expr(block, value);
                Ok(block)
            }
            TokenKind::Tilde => {
                self.next_token();
                let block = self.cast_expression(block)?;
                let value = self.block_expr(block)?;
                let value = self.ir().eval_not(location, block, value)?;
                self.cfg.set_expr(block, value);
                Ok(block)
            }
            TokenKind::Plus => {
                self.next_token();
                let block = self.cast_expression(block)?;
                let mut value = self.block_expr(block)?;
                value.clear_lvalue();
                self.cfg.set_expr(block, value);
                Ok(block)
            }
            TokenKind::Minus => {
                self.next_token();
                let block = self.cast_expression(block)?;
                let value = self.block_expr(block)?;
                let value = self
                    .ir()
                    .eval_expr(location, block, BinOp::Sub, Var::int(0), value)?;
                self.cfg.set_expr(block, value);
                Ok(block)
            }
            TokenKind::Sizeof => {
                self.next_token();
                let ty = if self.check(&TokenKind::LeftParen)
                    && self.begins_type_name(&self.peekn(2).kind.clone())
                {
                    self.consume(TokenKind::LeftParen)?;
                    let ty = self.type_name()?;
                    self.consume(TokenKind::RightParen)?;
                    ty
                } else {
                    // Evaluate into a scratch block; only the type is kept
                    let scratch = self.cfg.new_block();
                    let tail = self.unary_expression(scratch)?;
                    self.block_expr(tail)?.ty()
                };
                if self.types.is_function(ty) {
                    return Err(CompilerError::type_error(
                        "cannot apply 'sizeof' to function type",
                        location,
                    ));
                }
                let size = self.types.size_of(ty);
                if size == 0 {
                    return Err(CompilerError::type_error(
                        "cannot apply 'sizeof' to incomplete type",
                        location,
                    ));
                }
                self.cfg.set_expr(block, Var::int(size as i64));
                Ok(block)
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = match self.next_token().kind {
                    TokenKind::PlusPlus => BinOp::Add,
                    _ => BinOp::Sub,
                };
                let block = self.unary_expression(block)?;
                let value = self.block_expr(block)?;
                let stepped =
                    self.ir()
                        .eval_expr(location, block, op, value.clone(), Var::int(1))?;
                let value = self.ir().eval_assign(location, block, value, stepped)?;
                self.cfg.set_expr(block, value);
                Ok(block)
            }
            _ => self.postfix_expression(block),
        }
    }

    /// Two-token lookahead separates `( type-name )` from a parenthesized
    /// expression; a typedef name counts as a type-name starter.
    fn cast_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        if self.check(&TokenKind::LeftParen) {
            let second = self.peekn(2).kind.clone();
            if self.begins_type_name(&second) {
                let location = self.location();
                self.consume(TokenKind::LeftParen)?;
                let ty = self.type_name()?;
                self.consume(TokenKind::RightParen)?;
                let block = self.cast_expression(block)?;
                let value = self.block_expr(block)?;
                let value = self.ir().eval_cast(location, block, value, ty)?;
                self.cfg.set_expr(block, value);
                return Ok(block);
            }
        }
        self.unary_expression(block)
    }

    fn multiplicative_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let mut block = self.cast_expression(block)?;
        loop {
            let location = self.location();
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => return Ok(block),
            };
            self.next_token();
            let value = self.block_expr(block)?;
            block = self.cast_expression(block)?;
            let rhs = self.block_expr(block)?;
            let result = self.ir().eval_expr(location, block, op, value, rhs)?;
            self.cfg.set_expr(block, result);
        }
    }

    fn additive_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let mut block = self.multiplicative_expression(block)?;
        loop {
            let location = self.location();
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(block),
            };
            self.next_token();
            let value = self.block_expr(block)?;
            block = self.multiplicative_expression(block)?;
            let rhs = self.block_expr(block)?;
            let result = self.ir().eval_expr(location, block, op, value, rhs)?;
            self.cfg.set_expr(block, result);
        }
    }

    fn shift_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let mut block = self.additive_expression(block)?;
        loop {
            let location = self.location();
            let op = match self.peek().kind {
                TokenKind::LeftShift => BinOp::Shl,
                TokenKind::RightShift => BinOp::Shr,
                _ => return Ok(block),
            };
            self.next_token();
            let value = self.block_expr(block)?;
            block = self.additive_expression(block)?;
            let rhs = self.block_expr(block)?;
            let result = self.ir().eval_expr(location, block, op, value, rhs)?;
            self.cfg.set_expr(block, result);
        }
    }

    /// `<` and `<=` lower through the swapped `>` and `>=` forms
    fn relational_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let mut block = self.shift_expression(block)?;
        loop {
            let location = self.location();
            let (op, swap) = match self.peek().kind {
                TokenKind::Less => (BinOp::Gt, true),
                TokenKind::Greater => (BinOp::Gt, false),
                TokenKind::LessEqual => (BinOp::Ge, true),
                TokenKind::GreaterEqual => (BinOp::Ge, false),
                _ => return Ok(block),
            };
            self.next_token();
            let value = self.block_expr(block)?;
            block = self.shift_expression(block)?;
            let rhs = self.block_expr(block)?;
            let result = if swap {
                self.ir().eval_expr(location, block, op, rhs, value)?
            } else {
                self.ir().eval_expr(location, block, op, value, rhs)?
            };
            self.cfg.set_expr(block, result);
        }
    }

    /// `!=` lowers as equality-with-zero of the equality
    fn equality_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let mut block = self.relational_expression(block)?;
        loop {
            let location = self.location();
            let negate = match self.peek().kind {
                TokenKind::EqualEqual => false,
                TokenKind::BangEqual => true,
                _ => return Ok(block),
            };
            self.next_token();
            let value = self.block_expr(block)?;
            block = self.relational_expression(block)?;
            let rhs = self.block_expr(block)?;
            let mut result = self.ir().eval_expr(location, block, BinOp::Eq, value, rhs)?;
            if negate {
                result = self
                    .ir()
                    .eval_expr(location, block, BinOp::Eq, Var::int(0), result)?;
            }
            self.cfg.set_expr(block, result);
        }
    }

    fn and_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let mut block = self.equality_expression(block)?;
        while self.check(&TokenKind::Ampersand) {
            let location = self.location();
            self.next_token();
            let value = self.block_expr(block)?;
            block = self.equality_expression(block)?;
            let rhs = self.block_expr(block)?;
            let result = self.ir().eval_expr(location, block, BinOp::And, value, rhs)?;
            self.cfg.set_expr(block, result);
        }
        Ok(block)
    }

    fn exclusive_or_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let mut block = self.and_expression(block)?;
        while self.check(&TokenKind::Caret) {
            let location = self.location();
            self.next_token();
            let value = self.block_expr(block)?;
            block = self.and_expression(block)?;
            let rhs = self.block_expr(block)?;
            let result = self.ir().eval_expr(location, block, BinOp::Xor, value, rhs)?;
            self.cfg.set_expr(block, result);
        }
        Ok(block)
    }

    fn inclusive_or_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let mut block = self.exclusive_or_expression(block)?;
        while self.check(&TokenKind::Pipe) {
            let location = self.location();
            self.next_token();
            let value = self.block_expr(block)?;
            block = self.exclusive_or_expression(block)?;
            let rhs = self.block_expr(block)?;
            let result = self.ir().eval_expr(location, block, BinOp::Or, value, rhs)?;
            self.cfg.set_expr(block, result);
        }
        Ok(block)
    }

    /// Right-recursive so a chain of `&&` shares a single join per level
    fn logical_and_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let block = self.inclusive_or_expression(block)?;
        if self.check(&TokenKind::AmpersandAmpersand) {
            let location = self.location();
            self.next_token();
            let right_top = self.cfg.new_block();
            let right_tail = self.logical_and_expression(right_top)?;
            return self
                .ir()
                .eval_logical_and(location, block, right_top, right_tail);
        }
        Ok(block)
    }

    fn logical_or_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let block = self.logical_and_expression(block)?;
        if self.check(&TokenKind::PipePipe) {
            let location = self.location();
            self.next_token();
            let right_top = self.cfg.new_block();
            let right_tail = self.logical_or_expression(right_top)?;
            return self
                .ir()
                .eval_logical_or(location, block, right_top, right_tail);
        }
        Ok(block)
    }

    /// `a ? b : c` with the uniform edge convention: jump[1] on true
    pub(crate) fn conditional_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let block = self.logical_or_expression(block)?;
        if !self.check(&TokenKind::Question) {
            return Ok(block);
        }
        let location = self.location();
        let condition = self.block_expr(block)?;
        let true_top = self.cfg.new_block();
        let false_top = self.cfg.new_block();
        let next = self.cfg.new_block();

        self.next_token();
        self.cfg.block_mut(block).jump[0] = Some(false_top);
        self.cfg.block_mut(block).jump[1] = Some(true_top);

        let true_tail = self.expression(true_top)?;
        self.cfg.block_mut(true_tail).jump[0] = Some(next);

        self.consume(TokenKind::Colon)?;
        let false_tail = self.conditional_expression(false_top)?;
        self.cfg.block_mut(false_tail).jump[0] = Some(next);

        let value = self
            .ir()
            .eval_conditional(location, condition, true_tail, false_tail)?;
        self.cfg.set_expr(next, value);
        Ok(next)
    }

    /// Evaluate into a private scratch block and require an immediate
    /// result with no emitted side effects.
    pub(crate) fn constant_expression(&mut self) -> Result<Var, CompilerError> {
        let location = self.location();
        let head = self.cfg.new_block();
        let tail = self.conditional_expression(head)?;
        let value = self.block_expr(tail)?;
        if tail != head || !value.is_immediate() {
            return Err(CompilerError::semantic(
                "constant expression must be computable at compile time",
                location,
            ));
        }
        Ok(value)
    }

    /// Right-associative; compound forms compute `target op rhs`, then
    /// assign back.
    pub(crate) fn assignment_expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let block = self.conditional_expression(block)?;
        let target = self.block_expr(block)?;
        let location = self.location();
        let compound = match self.peek().kind {
            TokenKind::Equal => None,
            TokenKind::StarEqual => Some(BinOp::Mul),
            TokenKind::SlashEqual => Some(BinOp::Div),
            TokenKind::PercentEqual => Some(BinOp::Mod),
            TokenKind::PlusEqual => Some(BinOp::Add),
            TokenKind::MinusEqual => Some(BinOp::Sub),
            TokenKind::AmpersandEqual => Some(BinOp::And),
            TokenKind::PipeEqual => Some(BinOp::Or),
            TokenKind::CaretEqual => Some(BinOp::Xor),
            _ => return Ok(block),
        };
        self.next_token();

        let block = self.assignment_expression(block)?;
        let mut value = self.block_expr(block)?;
        if let Some(op) = compound {
            value = self
                .ir()
                .eval_expr(location, block, op, target.clone(), value)?;
        }
        let result = self.ir().eval_assign(location, block, target, value)?;
        self.cfg.set_expr(block, result);
        Ok(block)
    }

    /// Comma operator: left results are discarded
    pub(crate) fn expression(&mut self, block: BlockId) -> Result<BlockId, CompilerError> {
        let mut block = self.assignment_expression(block)?;
        while self.check(&TokenKind::Comma) {
            self.next_token();
            block = self.assignment_expression(block)?;
        }
        Ok(block)
    }
}
