//! IR evaluator
//!
//! The parser commands this builder to materialize operations into basic
//! blocks. All typing decisions for generated code live here: usual
//! arithmetic conversions, pointer arithmetic scaling, assignment
//! compatibility, and the wiring of short-circuit diamonds.
//!
//! Binary operations on two integer immediates fold to an immediate, which
//! is what lets `constant_expression` accept forms like `1 + 2` without a
//! side-effecting block.

use crate::ir::{BinOp, Cfg, Imm, Instruction, Var};
use crate::symbols::SymbolTable;
use crate::types::{TypeKind, TypeTable};
use qcc_common::{BlockId, CompilerError, SourceLocation, TypeId};

pub struct IrBuilder<'a> {
    pub types: &'a mut TypeTable,
    pub symbols: &'a mut SymbolTable,
    pub cfg: &'a mut Cfg,
}

impl<'a> IrBuilder<'a> {
    pub fn new(
        types: &'a mut TypeTable,
        symbols: &'a mut SymbolTable,
        cfg: &'a mut Cfg,
    ) -> Self {
        Self {
            types,
            symbols,
            cfg,
        }
    }

    /// Fresh temporary registered as a local of the current CFG
    pub fn temporary(&mut self, ty: TypeId) -> Var {
        let sym = self.symbols.temporary(ty);
        self.cfg.register_local(sym);
        Var::Direct {
            sym,
            ty,
            offset: 0,
            lvalue: true,
        }
    }

    /// Promote small integer types to int
    fn promote(&self, ty: TypeId) -> TypeId {
        if self.types.is_integer(ty) && self.types.size_of(ty) < 4 {
            TypeTable::INT
        } else {
            ty
        }
    }

    /// Usual arithmetic conversions, reduced to the type lattice this
    /// front-end works with.
    fn usual_arithmetic(&self, a: TypeId, b: TypeId) -> TypeId {
        let (ka, kb) = (self.types.kind(a), self.types.kind(b));
        if ka == TypeKind::Double || kb == TypeKind::Double {
            return TypeTable::DOUBLE;
        }
        if ka == TypeKind::Float || kb == TypeKind::Float {
            return TypeTable::FLOAT;
        }
        let size = self.types.size_of(a).max(self.types.size_of(b)).max(4);
        let unsigned = (ka == TypeKind::Unsigned && self.types.size_of(a) == size)
            || (kb == TypeKind::Unsigned && self.types.size_of(b) == size);
        match (size, unsigned) {
            (8, true) => TypeTable::UNSIGNED_LONG,
            (8, false) => TypeTable::LONG,
            (_, true) => TypeTable::UNSIGNED_INT,
            (_, false) => TypeTable::INT,
        }
    }

    /// Convert to the value read from an object: arrays decay to a pointer
    /// to their first element.
    fn rvalue(&mut self, block: BlockId, value: Var) -> Var {
        if !self.types.is_array(value.ty()) {
            return value;
        }
        let element = self.types.deref(value.ty()).unwrap_or(TypeTable::CHAR);
        let pointer = self.types.pointer_to(element);
        match value {
            Var::Immediate { value, .. } => Var::Immediate { ty: pointer, value },
            other => {
                let mut target = self.temporary(pointer);
                self.cfg.emit(
                    block,
                    Instruction::Addr {
                        target: target.clone(),
                        value: other,
                    },
                );
                target.clear_lvalue();
                target
            }
        }
    }

    fn fold(&self, op: BinOp, left: i64, right: i64) -> Option<i64> {
        Some(match op {
            BinOp::Add => left.wrapping_add(right),
            BinOp::Sub => left.wrapping_sub(right),
            BinOp::Mul => left.wrapping_mul(right),
            BinOp::Div => left.checked_div(right)?,
            BinOp::Mod => left.checked_rem(right)?,
            BinOp::Shl => left.wrapping_shl(right as u32 & 63),
            BinOp::Shr => left.wrapping_shr(right as u32 & 63),
            BinOp::Gt => (left > right) as i64,
            BinOp::Ge => (left >= right) as i64,
            BinOp::Eq => (left == right) as i64,
            BinOp::And => left & right,
            BinOp::Or => left | right,
            BinOp::Xor => left ^ right,
        })
    }

    fn scale_pointer_step(
        &mut self,
        location: SourceLocation,
        block: BlockId,
        pointer_ty: TypeId,
        index: Var,
    ) -> Result<Var, CompilerError> {
        let element = self.types.deref(pointer_ty).ok_or_else(|| {
            CompilerError::type_error("pointer arithmetic on non-pointer type", location)
        })?;
        let width = self.types.size_of(element);
        if width == 0 {
            return Err(CompilerError::type_error(
                "pointer arithmetic on incomplete type",
                location,
            ));
        }
        self.eval_expr(location, block, BinOp::Mul, index, Var::int(width as i64))
    }

    /// Evaluate a binary operation; the workhorse behind every arithmetic,
    /// relational and bitwise expression.
    pub fn eval_expr(
        &mut self,
        location: SourceLocation,
        block: BlockId,
        op: BinOp,
        left: Var,
        right: Var,
    ) -> Result<Var, CompilerError> {
        let left = self.rvalue(block, left);
        let right = self.rvalue(block, right);
        let (lt, rt) = (left.ty(), right.ty());

        // Constant fold integer immediates
        if self.types.is_integer(lt) && self.types.is_integer(rt) {
            if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
                if let Some(value) = self.fold(op, a, b) {
                    let ty = if op.is_comparison() {
                        TypeTable::INT
                    } else {
                        self.usual_arithmetic(lt, rt)
                    };
                    return Ok(Var::Immediate {
                        ty,
                        value: Imm::Int(value),
                    });
                }
            }
        }

        // Pointer arithmetic: the index operand scales by the element width
        let (lp, rp) = (self.types.is_pointer(lt), self.types.is_pointer(rt));
        if !op.is_comparison() {
            match (op, lp, rp) {
                (BinOp::Add, true, false) if self.types.is_integer(rt) => {
                    let step = self.scale_pointer_step(location, block, lt, right)?;
                    return self.emit_binary(block, BinOp::Add, lt, left, step);
                }
                (BinOp::Add, false, true) if self.types.is_integer(lt) => {
                    let step = self.scale_pointer_step(location, block, rt, left)?;
                    return self.emit_binary(block, BinOp::Add, rt, right, step);
                }
                (BinOp::Sub, true, false) if self.types.is_integer(rt) => {
                    let step = self.scale_pointer_step(location, block, lt, right)?;
                    return self.emit_binary(block, BinOp::Sub, lt, left, step);
                }
                (BinOp::Sub, true, true) => {
                    let element = self.types.deref(lt).unwrap_or(TypeTable::CHAR);
                    let width = self.types.size_of(element).max(1);
                    let diff =
                        self.emit_binary(block, BinOp::Sub, TypeTable::LONG, left, right)?;
                    return self.eval_expr(
                        location,
                        block,
                        BinOp::Div,
                        diff,
                        Var::int(width as i64),
                    );
                }
                _ => {}
            }
        }

        // Remaining forms are arithmetic-on-arithmetic, or comparisons that
        // may also take two pointers (or a pointer against a constant).
        let comparable_pointers = op.is_comparison()
            && ((lp && rp)
                || (lp && right.is_immediate() && self.types.is_integer(rt))
                || (rp && left.is_immediate() && self.types.is_integer(lt)));
        if !comparable_pointers
            && !(self.types.is_arithmetic(lt) && self.types.is_arithmetic(rt))
        {
            return Err(CompilerError::type_error(
                format!(
                    "invalid operands to '{}' ('{}' and '{}')",
                    op,
                    self.types.to_string(lt),
                    self.types.to_string(rt)
                ),
                location,
            ));
        }
        if op.integer_only() && !(self.types.is_integer(lt) && self.types.is_integer(rt)) {
            return Err(CompilerError::type_error(
                format!("operands of '{}' must have integer type", op),
                location,
            ));
        }

        let ty = if op.is_comparison() {
            TypeTable::INT
        } else if matches!(op, BinOp::Shl | BinOp::Shr) {
            self.promote(lt)
        } else {
            self.usual_arithmetic(lt, rt)
        };
        self.emit_binary(block, op, ty, left, right)
    }

    fn emit_binary(
        &mut self,
        block: BlockId,
        op: BinOp,
        ty: TypeId,
        left: Var,
        right: Var,
    ) -> Result<Var, CompilerError> {
        let mut target = self.temporary(ty);
        self.cfg.emit(
            block,
            Instruction::Binary {
                op,
                target: target.clone(),
                left,
                right,
            },
        );
        target.clear_lvalue();
        Ok(target)
    }

    /// Bitwise complement
    pub fn eval_not(
        &mut self,
        location: SourceLocation,
        block: BlockId,
        value: Var,
    ) -> Result<Var, CompilerError> {
        if !self.types.is_integer(value.ty()) {
            return Err(CompilerError::type_error(
                "operand of '~' must have integer type",
                location,
            ));
        }
        if let Some(i) = value.as_int() {
            return Ok(Var::Immediate {
                ty: self.promote(value.ty()),
                value: Imm::Int(!i),
            });
        }
        let ty = self.promote(value.ty());
        let mut target = self.temporary(ty);
        self.cfg.emit(
            block,
            Instruction::Not {
                target: target.clone(),
                value,
            },
        );
        target.clear_lvalue();
        Ok(target)
    }

    fn assignable(&self, target_ty: TypeId, value: &Var) -> bool {
        let value_ty = value.ty();
        if self.types.is_arithmetic(target_ty) && self.types.is_arithmetic(value_ty) {
            return true;
        }
        if self.types.is_pointer(target_ty) {
            // Any pointer, or a constant (null in the common case)
            return self.types.is_pointer(value_ty)
                || (value.is_immediate() && self.types.is_integer(value_ty));
        }
        if self.types.is_struct_or_union(target_ty) {
            return self.types.compatible(target_ty, value_ty);
        }
        false
    }

    /// Store `value` into `target`, which must designate an object
    pub fn eval_assign(
        &mut self,
        location: SourceLocation,
        block: BlockId,
        target: Var,
        value: Var,
    ) -> Result<Var, CompilerError> {
        if !target.is_lvalue() {
            return Err(CompilerError::type_error(
                "lvalue required as left operand of assignment",
                location,
            ));
        }

        // char array initialized from a string literal
        let char_array_init = self.types.is_array(target.ty())
            && value.as_str().is_some()
            && self.types.size_of(value.ty()) <= self.types.size_of(target.ty());
        let value = if char_array_init {
            value
        } else {
            let value = self.rvalue(block, value);
            if !self.assignable(target.ty(), &value) {
                return Err(CompilerError::type_error(
                    format!(
                        "incompatible types in assignment ('{}' from '{}')",
                        self.types.to_string(target.ty()),
                        self.types.to_string(value.ty())
                    ),
                    location,
                ));
            }
            value
        };

        self.cfg.emit(
            block,
            Instruction::Assign {
                target: target.clone(),
                value,
            },
        );
        let mut result = target;
        result.clear_lvalue();
        Ok(result)
    }

    /// Explicit conversion
    pub fn eval_cast(
        &mut self,
        location: SourceLocation,
        block: BlockId,
        value: Var,
        ty: TypeId,
    ) -> Result<Var, CompilerError> {
        if self.types.is_void(ty) {
            return Ok(Var::zero(TypeTable::VOID));
        }
        let value = self.rvalue(block, value);
        if self.types.is_struct_or_union(ty) || self.types.is_struct_or_union(value.ty()) {
            return Err(CompilerError::type_error(
                "cannot cast to or from aggregate type",
                location,
            ));
        }
        if self.types.is_integer(ty) {
            if let Some(i) = value.as_int() {
                // Truncate the constant to the destination width
                let size = self.types.size_of(ty);
                let truncated = if size >= 8 {
                    i
                } else {
                    let bits = size * 8;
                    let mask = (1i64 << bits) - 1;
                    let cut = i & mask;
                    if self.types.kind(ty) == TypeKind::Unsigned || cut < (1i64 << (bits - 1)) {
                        cut
                    } else {
                        cut - (1i64 << bits)
                    }
                };
                return Ok(Var::Immediate {
                    ty,
                    value: Imm::Int(truncated),
                });
            }
        }
        let mut target = self.temporary(ty);
        self.cfg.emit(
            block,
            Instruction::Cast {
                target: target.clone(),
                value,
            },
        );
        target.clear_lvalue();
        Ok(target)
    }

    /// Pointer dereference
    pub fn eval_deref(
        &mut self,
        location: SourceLocation,
        block: BlockId,
        value: Var,
    ) -> Result<Var, CompilerError> {
        let value = self.rvalue(block, value);
        if !self.types.is_pointer(value.ty()) {
            return Err(CompilerError::type_error(
                format!(
                    "cannot dereference value of type '{}'",
                    self.types.to_string(value.ty())
                ),
                location,
            ));
        }
        let pointee = self
            .types
            .deref(value.ty())
            .ok_or_else(|| CompilerError::internal("pointer without pointee"))?;

        match value {
            // Direct pointer with no displacement dereferences in place
            Var::Direct {
                sym, offset: 0, ..
            } => Ok(Var::Deref {
                sym,
                ty: pointee,
                offset: 0,
                lvalue: true,
            }),
            // Anything else goes through a temporary holding the address
            other => {
                let holder = self.temporary(other.ty());
                self.cfg.emit(
                    block,
                    Instruction::Assign {
                        target: holder.clone(),
                        value: other,
                    },
                );
                let Var::Direct { sym, .. } = holder else {
                    return Err(CompilerError::internal("temporary is always direct"));
                };
                Ok(Var::Deref {
                    sym,
                    ty: pointee,
                    offset: 0,
                    lvalue: true,
                })
            }
        }
    }

    /// Address-of
    pub fn eval_addr(
        &mut self,
        location: SourceLocation,
        block: BlockId,
        value: Var,
    ) -> Result<Var, CompilerError> {
        match value {
            Var::Direct { lvalue: true, ty, .. } => {
                let pointer = self.types.pointer_to(ty);
                let mut target = self.temporary(pointer);
                self.cfg.emit(
                    block,
                    Instruction::Addr {
                        target: target.clone(),
                        value,
                    },
                );
                target.clear_lvalue();
                Ok(target)
            }
            // The address of a dereference is the pointer value itself,
            // displaced by the accumulated offset.
            Var::Deref { sym, ty, offset, .. } => {
                let base_ty = self.symbols.symbol(sym).ty;
                let base = Var::Direct {
                    sym,
                    ty: base_ty,
                    offset: 0,
                    lvalue: false,
                };
                let pointer = self.types.pointer_to(ty);
                let mut target = self.temporary(pointer);
                if offset == 0 {
                    self.cfg.emit(
                        block,
                        Instruction::Assign {
                            target: target.clone(),
                            value: base,
                        },
                    );
                } else {
                    self.cfg.emit(
                        block,
                        Instruction::Binary {
                            op: BinOp::Add,
                            target: target.clone(),
                            left: base,
                            right: Var::int(offset),
                        },
                    );
                }
                target.clear_lvalue();
                Ok(target)
            }
            _ => Err(CompilerError::type_error(
                "lvalue required as operand of '&'",
                location,
            )),
        }
    }

    /// Pass one call argument, converting to the declared parameter type
    /// when one is known.
    pub fn param(
        &mut self,
        location: SourceLocation,
        block: BlockId,
        argument: Var,
        expected: Option<TypeId>,
    ) -> Result<(), CompilerError> {
        let mut argument = self.rvalue(block, argument);
        if let Some(expected) = expected {
            if !self.types.compatible(argument.ty(), expected) {
                if self.types.is_arithmetic(argument.ty()) && self.types.is_arithmetic(expected) {
                    argument = self.eval_cast(location, block, argument, expected)?;
                } else if !self.assignable(expected, &argument) {
                    return Err(CompilerError::type_error(
                        format!(
                            "incompatible argument type '{}', expected '{}'",
                            self.types.to_string(argument.ty()),
                            self.types.to_string(expected)
                        ),
                        location,
                    ));
                }
            }
        }
        self.cfg.emit(block, Instruction::Param { value: argument });
        Ok(())
    }

    /// Call through a function or function pointer value; arguments have
    /// already been passed with `param`.
    pub fn eval_call(&mut self, block: BlockId, func: Var) -> Result<Var, CompilerError> {
        let fn_ty = if self.types.is_pointer(func.ty()) {
            self.types
                .deref(func.ty())
                .ok_or_else(|| CompilerError::internal("pointer without pointee"))?
        } else {
            func.ty()
        };
        let ret = self
            .types
            .ret(fn_ty)
            .ok_or_else(|| CompilerError::internal("call target is not a function"))?;

        if self.types.is_void(ret) {
            self.cfg
                .emit(block, Instruction::Call { target: None, func });
            Ok(Var::zero(TypeTable::VOID))
        } else {
            let mut target = self.temporary(ret);
            self.cfg.emit(
                block,
                Instruction::Call {
                    target: Some(target.clone()),
                    func,
                },
            );
            target.clear_lvalue();
            Ok(target)
        }
    }

    /// Return a value from the current function
    pub fn eval_return(
        &mut self,
        location: SourceLocation,
        block: BlockId,
        value: Var,
        ret: TypeId,
    ) -> Result<Var, CompilerError> {
        let value = self.rvalue(block, value);
        if !self.assignable(ret, &value) {
            return Err(CompilerError::type_error(
                format!(
                    "incompatible return type '{}', expected '{}'",
                    self.types.to_string(value.ty()),
                    self.types.to_string(ret)
                ),
                location,
            ));
        }
        self.cfg.emit(
            block,
            Instruction::Return {
                value: Some(value.clone()),
            },
        );
        Ok(value)
    }

    /// Normalize a scalar to 0 or 1
    fn normalize_bool(
        &mut self,
        location: SourceLocation,
        block: BlockId,
        value: Var,
    ) -> Result<Var, CompilerError> {
        if self.types.is_integer(value.ty()) {
            if let Some(i) = value.as_int() {
                return Ok(Var::int((i != 0) as i64));
            }
        }
        let zero = if self.types.is_pointer(value.ty()) {
            Var::zero(TypeTable::INT)
        } else {
            Var::zero(value.ty())
        };
        let equal_zero = self.eval_expr(location, block, BinOp::Eq, value, zero)?;
        self.eval_expr(location, block, BinOp::Eq, Var::int(0), equal_zero)
    }

    /// Short-circuit conjunction. `left` holds the left operand's value;
    /// the right operand has been evaluated from `right_top` through
    /// `right_tail`. Returns the join block, whose expression is the 0/1
    /// result.
    pub fn eval_logical_and(
        &mut self,
        location: SourceLocation,
        left: BlockId,
        right_top: BlockId,
        right_tail: BlockId,
    ) -> Result<BlockId, CompilerError> {
        self.eval_logical(location, left, right_top, right_tail, true)
    }

    /// Short-circuit disjunction; see `eval_logical_and`
    pub fn eval_logical_or(
        &mut self,
        location: SourceLocation,
        left: BlockId,
        right_top: BlockId,
        right_tail: BlockId,
    ) -> Result<BlockId, CompilerError> {
        self.eval_logical(location, left, right_top, right_tail, false)
    }

    fn eval_logical(
        &mut self,
        location: SourceLocation,
        left: BlockId,
        right_top: BlockId,
        right_tail: BlockId,
        conjunction: bool,
    ) -> Result<BlockId, CompilerError> {
        let left_expr = self
            .cfg
            .expr(left)
            .ok_or_else(|| CompilerError::internal("left operand has no value"))?;
        let right_expr = self
            .cfg
            .expr(right_tail)
            .ok_or_else(|| CompilerError::internal("right operand has no value"))?;

        let join = self.cfg.new_block();
        let result = self.temporary(TypeTable::INT);

        // Right path: normalize into the result and fall through to join
        let right_bool = self.normalize_bool(location, right_tail, right_expr)?;
        self.cfg.emit(
            right_tail,
            Instruction::Assign {
                target: result.clone(),
                value: right_bool,
            },
        );
        self.cfg.block_mut(right_tail).jump[0] = Some(join);

        // The short-circuit value taken when the right side is skipped
        let short_value = Var::int(if conjunction { 0 } else { 1 });

        if (conjunction && left_expr.is_immediate_true(self.types))
            || (!conjunction && left_expr.is_immediate_false(self.types))
        {
            // Left side decides nothing; fall straight into the right side
            self.cfg.block_mut(left).jump[0] = Some(right_top);
        } else if (conjunction && left_expr.is_immediate_false(self.types))
            || (!conjunction && left_expr.is_immediate_true(self.types))
        {
            // Left side decides everything; the right blocks become orphans
            self.cfg.emit(
                left,
                Instruction::Assign {
                    target: result.clone(),
                    value: short_value,
                },
            );
            self.cfg.block_mut(left).jump[0] = Some(join);
        } else {
            let skip = self.cfg.new_block();
            self.cfg.emit(
                skip,
                Instruction::Assign {
                    target: result.clone(),
                    value: short_value,
                },
            );
            self.cfg.block_mut(skip).jump[0] = Some(join);
            if conjunction {
                self.cfg.block_mut(left).jump[1] = Some(right_top);
                self.cfg.block_mut(left).jump[0] = Some(skip);
            } else {
                self.cfg.block_mut(left).jump[1] = Some(skip);
                self.cfg.block_mut(left).jump[0] = Some(right_top);
            }
        }

        let mut value = result;
        value.clear_lvalue();
        self.cfg.set_expr(join, value);
        Ok(join)
    }

    /// Join of a conditional expression: both branch values land in one
    /// temporary of the unified type.
    pub fn eval_conditional(
        &mut self,
        location: SourceLocation,
        condition: Var,
        true_block: BlockId,
        false_block: BlockId,
    ) -> Result<Var, CompilerError> {
        if !(self.types.is_arithmetic(condition.ty()) || self.types.is_pointer(condition.ty())) {
            return Err(CompilerError::type_error(
                "conditional expression requires a scalar condition",
                location,
            ));
        }
        let t_expr = self
            .cfg
            .expr(true_block)
            .ok_or_else(|| CompilerError::internal("true branch has no value"))?;
        let f_expr = self
            .cfg
            .expr(false_block)
            .ok_or_else(|| CompilerError::internal("false branch has no value"))?;
        let t_expr = self.rvalue(true_block, t_expr);
        let f_expr = self.rvalue(false_block, f_expr);

        if self.types.is_void(t_expr.ty()) && self.types.is_void(f_expr.ty()) {
            return Ok(Var::zero(TypeTable::VOID));
        }

        let ty = if self.types.is_arithmetic(t_expr.ty()) && self.types.is_arithmetic(f_expr.ty())
        {
            self.usual_arithmetic(t_expr.ty(), f_expr.ty())
        } else if self.types.compatible(t_expr.ty(), f_expr.ty()) {
            t_expr.ty()
        } else {
            return Err(CompilerError::type_error(
                format!(
                    "type mismatch in conditional expression ('{}' and '{}')",
                    self.types.to_string(t_expr.ty()),
                    self.types.to_string(f_expr.ty())
                ),
                location,
            ));
        };

        let result = self.temporary(ty);
        self.cfg.emit(
            true_block,
            Instruction::Assign {
                target: result.clone(),
                value: t_expr,
            },
        );
        self.cfg.emit(
            false_block,
            Instruction::Assign {
                target: result.clone(),
                value: f_expr,
            },
        );
        let mut value = result;
        value.clear_lvalue();
        Ok(value)
    }

    pub fn eval_va_start(&mut self, block: BlockId, list: Var) -> Var {
        self.cfg.emit(block, Instruction::VaStart { list });
        Var::zero(TypeTable::VOID)
    }

    pub fn eval_va_arg(&mut self, block: BlockId, list: Var, ty: TypeId) -> Var {
        let mut target = self.temporary(ty);
        self.cfg.emit(
            block,
            Instruction::VaArg {
                target: target.clone(),
                list,
            },
        );
        target.clear_lvalue();
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        types: TypeTable,
        symbols: SymbolTable,
        cfg: Cfg,
    }

    impl Fixture {
        fn new() -> Self {
            let mut types = TypeTable::new();
            let symbols = SymbolTable::new(&mut types);
            Self {
                types,
                symbols,
                cfg: Cfg::new(),
            }
        }

        fn builder(&mut self) -> IrBuilder<'_> {
            IrBuilder::new(&mut self.types, &mut self.symbols, &mut self.cfg)
        }
    }

    fn loc() -> SourceLocation {
        SourceLocation::none()
    }

    #[test]
    fn test_immediate_folding() {
        let mut fx = Fixture::new();
        let block = fx.cfg.body;
        let result = fx
            .builder()
            .eval_expr(loc(), block, BinOp::Add, Var::int(1), Var::int(2))
            .unwrap();
        assert_eq!(result.as_int(), Some(3));
        assert!(fx.cfg.block(block).is_empty());

        let cmp = fx
            .builder()
            .eval_expr(loc(), block, BinOp::Gt, Var::int(1), Var::int(2))
            .unwrap();
        assert_eq!(cmp.as_int(), Some(0));
    }

    #[test]
    fn test_division_by_zero_not_folded() {
        let mut fx = Fixture::new();
        let block = fx.cfg.body;
        let result = fx
            .builder()
            .eval_expr(loc(), block, BinOp::Div, Var::int(1), Var::int(0))
            .unwrap();
        assert!(!result.is_immediate());
        assert_eq!(fx.cfg.block(block).code.len(), 1);
    }

    #[test]
    fn test_pointer_arithmetic_scales() {
        let mut fx = Fixture::new();
        let block = fx.cfg.body;
        let ptr_ty = fx.types.pointer_to(TypeTable::INT);
        let p = {
            let mut b = fx.builder();
            b.temporary(ptr_ty)
        };
        let idx = {
            let mut b = fx.builder();
            b.temporary(TypeTable::INT)
        };
        let result = fx
            .builder()
            .eval_expr(loc(), block, BinOp::Add, p, idx)
            .unwrap();
        assert_eq!(result.ty(), ptr_ty);

        // One multiply by the element width, one add
        let code = &fx.cfg.block(block).code;
        assert!(matches!(
            code[0],
            Instruction::Binary {
                op: BinOp::Mul,
                right: Var::Immediate { value: Imm::Int(4), .. },
                ..
            }
        ));
        assert!(matches!(code[1], Instruction::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn test_assign_requires_lvalue() {
        let mut fx = Fixture::new();
        let block = fx.cfg.body;
        let err = fx
            .builder()
            .eval_assign(loc(), block, Var::int(1), Var::int(2));
        assert!(matches!(err, Err(CompilerError::Type { .. })));
    }

    #[test]
    fn test_assign_pointer_from_integer_rejected() {
        let mut fx = Fixture::new();
        let block = fx.cfg.body;
        let ptr_ty = fx.types.pointer_to(TypeTable::INT);
        let p = {
            let mut b = fx.builder();
            b.temporary(ptr_ty)
        };
        let i = {
            let mut b = fx.builder();
            b.temporary(TypeTable::INT)
        };
        let mut rvalue_int = i;
        rvalue_int.clear_lvalue();
        let err = fx.builder().eval_assign(loc(), block, p, rvalue_int);
        assert!(matches!(err, Err(CompilerError::Type { .. })));
    }

    #[test]
    fn test_cast_truncates_constant() {
        let mut fx = Fixture::new();
        let block = fx.cfg.body;
        let result = fx
            .builder()
            .eval_cast(loc(), block, Var::int(300), TypeTable::CHAR)
            .unwrap();
        assert_eq!(result.as_int(), Some(44));
        assert_eq!(result.ty(), TypeTable::CHAR);
    }

    #[test]
    fn test_logical_and_wires_diamond() {
        let mut fx = Fixture::new();
        let left = fx.cfg.body;
        let a = {
            let mut b = fx.builder();
            let mut v = b.temporary(TypeTable::INT);
            v.clear_lvalue();
            v
        };
        fx.cfg.set_expr(left, a);
        let right_top = fx.cfg.new_block();
        let b_val = {
            let mut b = fx.builder();
            let mut v = b.temporary(TypeTable::INT);
            v.clear_lvalue();
            v
        };
        fx.cfg.set_expr(right_top, b_val);

        let join = fx
            .builder()
            .eval_logical_and(loc(), left, right_top, right_top)
            .unwrap();

        // True edge enters the right operand, false edge short-circuits
        let left_block = fx.cfg.block(left);
        assert_eq!(left_block.jump[1], Some(right_top));
        let skip = left_block.jump[0].unwrap();
        assert_ne!(skip, right_top);
        assert_eq!(fx.cfg.block(skip).jump[0], Some(join));
        assert_eq!(fx.cfg.block(right_top).jump[0], Some(join));
        assert!(fx.cfg.expr(join).is_some());
    }

    #[test]
    fn test_logical_and_immediate_false_short_circuits() {
        let mut fx = Fixture::new();
        let left = fx.cfg.body;
        fx.cfg.set_expr(left, Var::int(0));
        let right_top = fx.cfg.new_block();
        fx.cfg.set_expr(right_top, Var::int(1));

        let join = fx
            .builder()
            .eval_logical_and(loc(), left, right_top, right_top)
            .unwrap();

        // Single successor straight to the join; right side is an orphan
        assert_eq!(fx.cfg.block(left).jump[0], Some(join));
        assert_eq!(fx.cfg.block(left).jump[1], None);
        let reachable = fx.cfg.reachable_from(left);
        assert!(!reachable.contains(&right_top));
    }
}
