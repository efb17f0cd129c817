//! Initializer parsing
//!
//! Scalar and brace-enclosed aggregate initializers, lowered to a series
//! of plain assignments on the target object. Unspecified trailing members
//! and elements are zero-filled through the same assignment path, so large
//! aggregates can produce verbose IR by design of the representation.

use crate::ir::Var;
use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::types::{TypeKind, TypeTable};
use qcc_common::{BlockId, CompilerError};

impl Parser {
    /// Parse and emit initialization for `target`, which always designates
    /// an object directly. At file scope the value must be an immediate.
    pub(crate) fn initializer(
        &mut self,
        block: BlockId,
        target: Var,
    ) -> Result<BlockId, CompilerError> {
        let location = self.location();
        let mut target = target;
        // Qualifiers and tag handles play no role during initialization
        target.set_ty(self.types.unwrapped(target.ty()));

        if self.check(&TokenKind::LeftBrace) {
            return self.object_initializer(block, target);
        }

        let block = self.assignment_expression(block)?;
        let value = self.block_expr(block)?;
        let sym = match &target {
            Var::Direct { sym, .. } => *sym,
            _ => return Err(CompilerError::internal("initializer target is not direct")),
        };
        if self.symbols.symbol(sym).depth == 0 && !value.is_immediate() {
            return Err(CompilerError::semantic(
                "initializer must be computable at load time",
                location,
            ));
        }

        if self.types.is_array(target.ty()) && self.types.size_of(target.ty()) == 0 {
            // A string literal completes the incomplete array
            if value.as_str().is_none() {
                return Err(CompilerError::type_error(
                    "invalid initializer for incomplete array type",
                    location,
                ));
            }
            let size = self.types.size_of(value.ty());
            self.types.complete_array(target.ty(), size);
            target.set_ty(value.ty());
        }

        self.ir().eval_assign(location, block, target, value)?;
        Ok(block)
    }

    /// Brace-enclosed initializer for a struct, union or array
    fn object_initializer(
        &mut self,
        block: BlockId,
        target: Var,
    ) -> Result<BlockId, CompilerError> {
        let location = self.location();
        let ty = target.ty();
        let filled = target.offset();
        self.consume(TokenKind::LeftBrace)?;
        let mut block = block;

        match self.types.kind(ty) {
            TypeKind::Union => {
                // Only the first member can be initialized; zero the whole
                // object first when the member leaves padding.
                if self.types.nmembers(ty) == 0 {
                    return Err(CompilerError::type_error(
                        "initializer for incomplete union type",
                        location,
                    ));
                }
                let first = self.types.member(ty, 0).clone();
                let first_ty = first
                    .ty
                    .ok_or_else(|| CompilerError::internal("member without type"))?;
                let union_size = self.types.size_of(ty);
                if self.types.size_of(first_ty) < union_size {
                    let fill_ty = if union_size % 8 != 0 {
                        self.types.array_of(TypeTable::CHAR, union_size)
                    } else {
                        self.types.array_of(TypeTable::LONG, union_size / 8)
                    };
                    let mut fill = target.clone();
                    fill.set_ty(fill_ty);
                    self.zero_initialize(block, fill)?;
                }
                let mut member_target = target.clone();
                member_target.set_ty(first_ty);
                block = self.initializer(block, member_target)?;
                if !self.check(&TokenKind::RightBrace) {
                    return Err(CompilerError::semantic(
                        "excess elements in union initializer",
                        self.location(),
                    ));
                }
            }
            TypeKind::Struct => {
                let n = self.types.nmembers(ty);
                let mut index = 0;
                while index < n {
                    let member = self.types.member(ty, index).clone();
                    let member_ty = member
                        .ty
                        .ok_or_else(|| CompilerError::internal("member without type"))?;
                    let mut member_target = target.clone();
                    member_target.set_ty(member_ty);
                    member_target.set_offset(filled + member.offset as i64);
                    block = self.initializer(block, member_target)?;
                    index += 1;
                    if self.check(&TokenKind::Comma) {
                        self.next_token();
                    } else {
                        break;
                    }
                    if self.check(&TokenKind::RightBrace) {
                        break;
                    }
                }
                while index < n {
                    let member = self.types.member(ty, index).clone();
                    let member_ty = member
                        .ty
                        .ok_or_else(|| CompilerError::internal("member without type"))?;
                    let mut member_target = target.clone();
                    member_target.set_ty(member_ty);
                    member_target.set_offset(filled + member.offset as i64);
                    self.zero_initialize(block, member_target)?;
                    index += 1;
                }
            }
            TypeKind::Array => {
                let element = self
                    .types
                    .deref(ty)
                    .ok_or_else(|| CompilerError::internal("array without element type"))?;
                let element_size = self.types.size_of(element);
                let total = self.types.size_of(ty);
                let count = if total == 0 {
                    usize::MAX
                } else {
                    (total / element_size) as usize
                };

                let mut index = 0;
                while index < count {
                    let mut element_target = target.clone();
                    element_target.set_ty(element);
                    element_target.set_offset(filled + index as i64 * element_size as i64);
                    block = self.initializer(block, element_target)?;
                    index += 1;
                    if self.check(&TokenKind::Comma) {
                        self.next_token();
                    } else {
                        break;
                    }
                    if self.check(&TokenKind::RightBrace) {
                        break;
                    }
                }

                if total == 0 {
                    // An incomplete array can only be the root of the
                    // target type; its size follows from the element count.
                    self.types.complete_array(ty, index as u32 * element_size);
                } else {
                    while index < count {
                        let mut element_target = target.clone();
                        element_target.set_ty(element);
                        element_target.set_offset(filled + index as i64 * element_size as i64);
                        self.zero_initialize(block, element_target)?;
                        index += 1;
                    }
                }
            }
            _ => {
                return Err(CompilerError::type_error(
                    "block initializer only applies to aggregate or union type",
                    location,
                ));
            }
        }

        self.consume(TokenKind::RightBrace)?;
        Ok(block)
    }

    /// Emit `target := 0` recursively over the type tree, one assignment
    /// per scalar leaf.
    fn zero_initialize(&mut self, block: BlockId, target: Var) -> Result<(), CompilerError> {
        let location = self.location();
        let ty = self.types.unwrapped(target.ty());
        match self.types.kind(ty) {
            TypeKind::Struct | TypeKind::Union => {
                for index in 0..self.types.nmembers(ty) {
                    let member = self.types.member(ty, index).clone();
                    let member_ty = member
                        .ty
                        .ok_or_else(|| CompilerError::internal("member without type"))?;
                    let mut member_target = target.clone();
                    member_target.set_ty(member_ty);
                    member_target.set_offset(target.offset() + member.offset as i64);
                    self.zero_initialize(block, member_target)?;
                }
                Ok(())
            }
            TypeKind::Array => {
                let element = self
                    .types
                    .deref(ty)
                    .ok_or_else(|| CompilerError::internal("array without element type"))?;
                let element_size = self.types.size_of(element);
                if element_size == 0 || self.types.size_of(ty) == 0 {
                    return Err(CompilerError::type_error(
                        "cannot zero-initialize incomplete array",
                        location,
                    ));
                }
                for index in 0..self.types.size_of(ty) / element_size {
                    let mut element_target = target.clone();
                    element_target.set_ty(element);
                    element_target
                        .set_offset(target.offset() + index as i64 * element_size as i64);
                    self.zero_initialize(block, element_target)?;
                }
                Ok(())
            }
            TypeKind::Pointer => {
                let void_pointer = self.types.pointer_to(TypeTable::VOID);
                self.ir()
                    .eval_assign(location, block, target, Var::zero(void_pointer))?;
                Ok(())
            }
            TypeKind::Char
            | TypeKind::Signed
            | TypeKind::Unsigned
            | TypeKind::Float
            | TypeKind::Double => {
                let zero = Var::zero(target.ty());
                self.ir().eval_assign(location, block, target, zero)?;
                Ok(())
            }
            _ => Err(CompilerError::type_error(
                format!(
                    "invalid type to zero-initialize, was '{}'",
                    self.types.to_string(target.ty())
                ),
                location,
            )),
        }
    }
}
