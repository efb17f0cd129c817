//! Declaration parsing
//!
//! Declaration specifiers, pointer/array/function declarators, struct and
//! union bodies, enums, and the top-level `declaration` that covers
//! external definitions as well as local declarations with initializers.

use crate::ir::Var;
use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::types::{Qualifiers, TypeKind, TypeTable};
use log::debug;
use qcc_common::{BlockId, CompilerError, Linkage, SourceLocation, Storage, TypeId};
use std::collections::HashSet;

/// Storage class keyword of a declaration, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClassSpecifier {
    Auto,
    Register,
    Static,
    Extern,
    Typedef,
}

/// Accumulates basic type specifier keywords; `resolve` is the closed
/// lookup table from the accumulated set to a canonical type.
#[derive(Debug, Default)]
struct SpecifierSet {
    void_: bool,
    char_: bool,
    short_: bool,
    int_: bool,
    signed_: bool,
    unsigned_: bool,
    long_: u8,
    float_: bool,
    double_: bool,
}

impl SpecifierSet {
    fn is_empty(&self) -> bool {
        !(self.void_
            || self.char_
            || self.short_
            || self.int_
            || self.signed_
            || self.unsigned_
            || self.long_ > 0
            || self.float_
            || self.double_)
    }

    fn set(&mut self, kind: &TokenKind, location: SourceLocation) -> Result<(), CompilerError> {
        let duplicate = |dup: bool| {
            if dup {
                Err(CompilerError::type_error(
                    format!("duplicate type specifier '{kind}'"),
                    location,
                ))
            } else {
                Ok(())
            }
        };
        match kind {
            TokenKind::Void => {
                duplicate(self.void_)?;
                self.void_ = true;
            }
            TokenKind::Char => {
                duplicate(self.char_)?;
                self.char_ = true;
            }
            TokenKind::Short => {
                duplicate(self.short_)?;
                self.short_ = true;
            }
            TokenKind::Int => {
                duplicate(self.int_)?;
                self.int_ = true;
            }
            TokenKind::Signed => {
                duplicate(self.signed_)?;
                self.signed_ = true;
            }
            TokenKind::Unsigned => {
                duplicate(self.unsigned_)?;
                self.unsigned_ = true;
            }
            TokenKind::Long => {
                duplicate(self.long_ >= 2)?;
                self.long_ += 1;
            }
            TokenKind::Float => {
                duplicate(self.float_)?;
                self.float_ = true;
            }
            TokenKind::Double => {
                duplicate(self.double_)?;
                self.double_ = true;
            }
            _ => return Err(CompilerError::internal("not a type specifier")),
        }
        Ok(())
    }

    /// Closed table from specifier set to canonical basic type; anything
    /// outside it is an error. `long long` collapses to long, `long
    /// double` to double.
    fn resolve(&self, location: SourceLocation) -> Result<TypeId, CompilerError> {
        let set = (
            self.void_,
            self.char_,
            self.short_,
            self.int_,
            self.signed_,
            self.unsigned_,
            self.long_,
            self.float_,
            self.double_,
        );
        match set {
            (true, false, false, false, false, false, 0, false, false) => Ok(TypeTable::VOID),

            // char, signed char
            (false, true, false, false, _, false, 0, false, false) => Ok(TypeTable::CHAR),
            (false, true, false, false, false, true, 0, false, false) => {
                Ok(TypeTable::UNSIGNED_CHAR)
            }

            // short, short int, signed short [int]
            (false, false, true, _, _, false, 0, false, false) => Ok(TypeTable::SHORT),
            (false, false, true, _, false, true, 0, false, false) => Ok(TypeTable::UNSIGNED_SHORT),

            // int, signed, signed int
            (false, false, false, true, _, false, 0, false, false)
            | (false, false, false, false, true, false, 0, false, false) => Ok(TypeTable::INT),
            // unsigned, unsigned int
            (false, false, false, _, false, true, 0, false, false) => Ok(TypeTable::UNSIGNED_INT),

            // long [int], long long [int], with optional signed
            (false, false, false, _, _, false, 1..=2, false, false) => Ok(TypeTable::LONG),
            (false, false, false, _, false, true, 1..=2, false, false) => {
                Ok(TypeTable::UNSIGNED_LONG)
            }

            (false, false, false, false, false, false, 0, true, false) => Ok(TypeTable::FLOAT),
            // double, long double
            (false, false, false, false, false, false, 0..=1, false, true) => Ok(TypeTable::DOUBLE),

            _ => Err(CompilerError::type_error(
                "invalid type specification",
                location,
            )),
        }
    }
}

impl Parser {
    /// Parse declaration specifiers: storage class, qualifiers and type
    /// specifiers in any order.
    pub(crate) fn declaration_specifiers(
        &mut self,
    ) -> Result<(TypeId, Option<StorageClassSpecifier>), CompilerError> {
        self.specifiers(true)
    }

    /// Specifier-qualifier-list: no storage class allowed
    pub(crate) fn specifier_qualifier_list(&mut self) -> Result<TypeId, CompilerError> {
        self.specifiers(false).map(|(ty, _)| ty)
    }

    fn specifiers(
        &mut self,
        allow_storage: bool,
    ) -> Result<(TypeId, Option<StorageClassSpecifier>), CompilerError> {
        let start = self.location();
        let mut spec = SpecifierSet::default();
        let mut qualifiers = Qualifiers::none();
        let mut storage: Option<StorageClassSpecifier> = None;
        let mut user_type: Option<TypeId> = None;

        loop {
            let location = self.location();
            match self.peek().kind.clone() {
                kind @ (TokenKind::Void
                | TokenKind::Char
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Signed
                | TokenKind::Unsigned) => {
                    spec.set(&kind, location)?;
                    self.next_token();
                }
                TokenKind::Const => {
                    if qualifiers.is_const {
                        return Err(CompilerError::type_error(
                            "duplicate type qualifier 'const'",
                            location,
                        ));
                    }
                    qualifiers.is_const = true;
                    self.next_token();
                }
                TokenKind::Volatile => {
                    if qualifiers.is_volatile {
                        return Err(CompilerError::type_error(
                            "duplicate type qualifier 'volatile'",
                            location,
                        ));
                    }
                    qualifiers.is_volatile = true;
                    self.next_token();
                }
                TokenKind::Struct | TokenKind::Union => {
                    if user_type.is_some() {
                        break;
                    }
                    user_type = Some(self.struct_or_union_specifier()?);
                }
                TokenKind::Enum => {
                    if user_type.is_some() {
                        break;
                    }
                    user_type = Some(self.enum_specifier()?);
                }
                TokenKind::Identifier(name) => {
                    let typedef = self
                        .symbols
                        .lookup_ident(&name)
                        .filter(|&id| self.symbols.symbol(id).storage == Storage::Typedef);
                    match typedef {
                        Some(sym) if user_type.is_none() && spec.is_empty() => {
                            self.next_token();
                            let ty = self.symbols.symbol(sym).ty;
                            user_type = Some(self.types.shallow_copy(ty));
                        }
                        _ => break,
                    }
                }
                TokenKind::Auto | TokenKind::Register | TokenKind::Static | TokenKind::Extern
                | TokenKind::Typedef => {
                    if !allow_storage {
                        return Err(CompilerError::semantic(
                            "unexpected storage class in qualifier list",
                            location,
                        ));
                    }
                    if storage.is_some() {
                        return Err(CompilerError::semantic(
                            "multiple storage class specifiers",
                            location,
                        ));
                    }
                    storage = Some(match self.next_token().kind {
                        TokenKind::Auto => StorageClassSpecifier::Auto,
                        TokenKind::Register => StorageClassSpecifier::Register,
                        TokenKind::Static => StorageClassSpecifier::Static,
                        TokenKind::Extern => StorageClassSpecifier::Extern,
                        _ => StorageClassSpecifier::Typedef,
                    });
                }
                _ => break,
            }

            if user_type.is_some() && !spec.is_empty() {
                return Err(CompilerError::type_error(
                    "invalid combination of declaration specifiers",
                    location,
                ));
            }
        }

        let ty = match user_type {
            Some(ty) => {
                if qualifiers.overlaps(&self.types.node(ty).qualifiers) {
                    return Err(CompilerError::type_error(
                        "duplicate type qualifier",
                        start,
                    ));
                }
                self.types.add_qualifiers(ty, qualifiers);
                ty
            }
            None if !spec.is_empty() => {
                let base = spec.resolve(start)?;
                if qualifiers == Qualifiers::none() {
                    base
                } else {
                    let copy = self.types.shallow_copy(base);
                    self.types.add_qualifiers(copy, qualifiers);
                    copy
                }
            }
            None => {
                return Err(CompilerError::type_error("missing type specifier", start));
            }
        };
        Ok((ty, storage))
    }

    /// `struct|union [tag] [{ member-list }]`; returns a tagged copy so the
    /// caller can apply qualifiers without mutating the registration.
    fn struct_or_union_specifier(&mut self) -> Result<TypeId, CompilerError> {
        let location = self.location();
        let kind = match self.next_token().kind {
            TokenKind::Union => TypeKind::Union,
            _ => TypeKind::Struct,
        };

        let mut tag_name: Option<String> = None;
        let mut canonical: Option<TypeId> = None;

        if let TokenKind::Identifier(name) = self.peek().kind.clone() {
            self.next_token();
            match self.symbols.lookup_tag(&name) {
                None => {
                    let ty = self.types.aggregate(kind);
                    self.symbols.add_tag(&name, ty, location)?;
                    canonical = Some(ty);
                }
                Some(sym) => {
                    let ty = self.symbols.symbol(sym).ty;
                    if self.types.is_integer(ty) {
                        return Err(CompilerError::type_error(
                            format!("tag '{name}' was previously declared as enum"),
                            location,
                        ));
                    }
                    if self.types.kind(ty) != kind {
                        let previous = match self.types.kind(ty) {
                            TypeKind::Struct => "struct",
                            _ => "union",
                        };
                        return Err(CompilerError::type_error(
                            format!("tag '{name}' was previously declared as {previous}"),
                            location,
                        ));
                    }
                    if self.check(&TokenKind::LeftBrace) && self.types.size_of(ty) > 0 {
                        return Err(CompilerError::symbol(
                            format!("redefinition of '{name}'"),
                            location,
                        ));
                    }
                    canonical = Some(ty);
                }
            }
            tag_name = Some(name);
        }

        if self.check(&TokenKind::LeftBrace) {
            let ty = match canonical {
                Some(ty) => ty,
                // Anonymous aggregate: a standalone type, not registered
                None => self.types.aggregate(kind),
            };
            canonical = Some(ty);
            self.consume(TokenKind::LeftBrace)?;
            self.member_declaration_list(ty)?;
            self.consume(TokenKind::RightBrace)?;
        }

        match (tag_name, canonical) {
            (Some(name), Some(ty)) => Ok(self.types.tagged_copy(ty, &name)),
            (None, Some(ty)) => Ok(ty),
            _ => Err(CompilerError::syntax(
                "expected tag name or member list",
                location,
            )),
        }
    }

    /// Member declarations of a struct or union body. A throwaway set of
    /// names detects duplicate members; incomplete and unnamed fields are
    /// rejected.
    fn member_declaration_list(&mut self, aggregate: TypeId) -> Result<(), CompilerError> {
        let mut seen: HashSet<String> = HashSet::new();
        loop {
            let base = self.specifier_qualifier_list()?;
            loop {
                let location = self.location();
                let mut name = None;
                let ty = self
                    .declarator(Some(base), Some(&mut name))?
                    .ok_or_else(|| CompilerError::internal("declarator lost base type"))?;

                let Some(name) = name else {
                    return Err(CompilerError::syntax(
                        "missing name in member declarator",
                        location,
                    ));
                };
                if self.types.size_of(ty) == 0 {
                    return Err(CompilerError::type_error(
                        format!(
                            "field '{name}' has incomplete type '{}'",
                            self.types.to_string(ty)
                        ),
                        location,
                    ));
                }
                if !seen.insert(name.clone()) {
                    return Err(CompilerError::symbol(
                        format!("duplicate member '{name}'"),
                        location,
                    ));
                }
                self.types.add_member(aggregate, Some(name), Some(ty));

                if self.check(&TokenKind::Comma) {
                    self.next_token();
                    continue;
                }
                break;
            }
            self.consume(TokenKind::Semicolon)?;
            if self.check(&TokenKind::RightBrace) {
                break;
            }
        }
        self.types.seal_aggregate(aggregate);
        Ok(())
    }

    /// `enum [tag] [{ enumerator-list }]`; the result is always signed int
    fn enum_specifier(&mut self) -> Result<TypeId, CompilerError> {
        let location = self.location();
        self.consume(TokenKind::Enum)?;
        let result = self.types.shallow_copy(TypeTable::INT);

        if let TokenKind::Identifier(name) = self.peek().kind.clone() {
            self.next_token();
            // An outer-scope tag may be shadowed by a fresh registration
            let tag = match self.symbols.lookup_tag(&name) {
                Some(sym)
                    if self.symbols.symbol(sym).depth == self.symbols.tag.current_depth() =>
                {
                    sym
                }
                _ => self.symbols.add_tag(&name, result, location)?,
            };
            if !self.types.is_integer(self.symbols.symbol(tag).ty) {
                return Err(CompilerError::type_error(
                    format!("tag '{name}' was previously defined as aggregate type"),
                    location,
                ));
            }
            if self.check(&TokenKind::LeftBrace) {
                // enum_value doubles as the definition sentinel on the tag
                if self.symbols.symbol(tag).enum_value.is_some() {
                    return Err(CompilerError::symbol(
                        format!("redefinition of enum '{name}'"),
                        location,
                    ));
                }
                self.enumerator_list()?;
                self.symbols.symbol_mut(tag).enum_value = Some(1);
            }
        } else {
            self.enumerator_list()?;
        }

        Ok(result)
    }

    /// Enumerators auto-increment from 0, resettable by a constant
    /// expression.
    fn enumerator_list(&mut self) -> Result<(), CompilerError> {
        self.consume(TokenKind::LeftBrace)?;
        let mut next_value: i64 = 0;
        loop {
            let location = self.location();
            let token = self.consume(TokenKind::Identifier(String::new()))?;
            let TokenKind::Identifier(name) = token.kind else {
                return Err(CompilerError::internal("consume returned wrong token"));
            };

            if self.check(&TokenKind::Equal) {
                self.next_token();
                let value = self.constant_expression()?;
                if !self.types.is_integer(value.ty()) {
                    return Err(CompilerError::type_error(
                        "implicit conversion from non-integer type in enum",
                        location,
                    ));
                }
                next_value = value
                    .as_int()
                    .ok_or_else(|| CompilerError::internal("integer immediate without value"))?;
            }

            let sym = self.symbols.add_ident(
                &self.types,
                &name,
                TypeTable::INT,
                Storage::EnumValue,
                Linkage::None,
                location,
            )?;
            self.symbols.symbol_mut(sym).enum_value = Some(next_value);
            next_value += 1;

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.next_token();
            if self.check(&TokenKind::RightBrace) {
                break;
            }
        }
        self.consume(TokenKind::RightBrace)?;
        Ok(())
    }

    /// `(* qualifier*)*` prefix, then the direct declarator
    pub(crate) fn declarator(
        &mut self,
        mut base: Option<TypeId>,
        name: Option<&mut Option<String>>,
    ) -> Result<Option<TypeId>, CompilerError> {
        while self.check(&TokenKind::Star) {
            base = Some(self.pointer(base)?);
        }
        self.direct_declarator(base, name)
    }

    fn pointer(&mut self, base: Option<TypeId>) -> Result<TypeId, CompilerError> {
        self.consume(TokenKind::Star)?;
        let ty = self.types.pointer(base);
        loop {
            let location = self.location();
            let qualifier = match self.peek().kind {
                TokenKind::Const => Qualifiers {
                    is_const: true,
                    is_volatile: false,
                },
                TokenKind::Volatile => Qualifiers {
                    is_const: false,
                    is_volatile: true,
                },
                _ => break,
            };
            if self.types.node(ty).qualifiers.overlaps(&qualifier) {
                return Err(CompilerError::type_error(
                    format!("duplicate type qualifier '{}'", self.peek().kind),
                    location,
                ));
            }
            self.types.add_qualifiers(ty, qualifier);
            self.next_token();
        }
        Ok(ty)
    }

    /// Identifier or parenthesized inner declarator, then a left
    /// associative run of array and function postfixes. The postfix types
    /// are built on the base type and threaded onto the tail of the inner
    /// tree, so `void (*f)(int)` comes out as pointer to function, not
    /// function returning pointer.
    fn direct_declarator(
        &mut self,
        base: Option<TypeId>,
        mut name: Option<&mut Option<String>>,
    ) -> Result<Option<TypeId>, CompilerError> {
        let mut inner: Option<TypeId> = None;

        match self.peek().kind.clone() {
            TokenKind::Identifier(id) => {
                let location = self.location();
                self.next_token();
                match name.as_deref_mut() {
                    Some(slot) => *slot = Some(id),
                    None => {
                        return Err(CompilerError::syntax(
                            "unexpected identifier in abstract declarator",
                            location,
                        ));
                    }
                }
            }
            TokenKind::LeftParen => {
                self.next_token();
                inner = self.declarator(None, name.as_deref_mut())?;
                self.consume(TokenKind::RightParen)?;
            }
            _ => {}
        }

        let mut ty = base;
        while matches!(self.peek().kind, TokenKind::LeftBracket | TokenKind::LeftParen) {
            let location = self.location();
            let Some(current) = ty else {
                return Err(CompilerError::syntax(
                    "declarator postfix without a base type",
                    location,
                ));
            };
            ty = Some(match self.peek().kind {
                TokenKind::LeftBracket => self.direct_declarator_array(current)?,
                _ => {
                    self.next_token();
                    let func = self.parameter_list(current)?;
                    self.consume(TokenKind::RightParen)?;
                    func
                }
            });
        }

        match inner {
            Some(head) => {
                // Fill the hole at the tail of the inner tree
                let mut tail = head;
                while let Some(next) = self.types.next_of(tail) {
                    tail = next;
                }
                if let Some(ty) = ty {
                    self.types.set_next(tail, ty);
                }
                Ok(Some(head))
            }
            None => Ok(ty),
        }
    }

    /// `[s0][s1]..[sn]` suffixes; only the first dimension may be omitted,
    /// leaving an incomplete type to be finished by an initializer.
    fn direct_declarator_array(&mut self, base: TypeId) -> Result<TypeId, CompilerError> {
        if !self.check(&TokenKind::LeftBracket) {
            return Ok(base);
        }
        let location = self.location();
        self.next_token();

        let mut length: u32 = 0;
        if !self.check(&TokenKind::RightBracket) {
            let value = self.constant_expression()?;
            match value.as_int() {
                Some(n) if self.types.is_integer(value.ty()) && n >= 1 => {
                    length = n as u32;
                }
                _ => {
                    return Err(CompilerError::type_error(
                        "array dimension must be a natural number",
                        location,
                    ));
                }
            }
        }
        self.consume(TokenKind::RightBracket)?;

        let element = self.direct_declarator_array(base)?;
        if self.types.size_of(element) == 0 {
            return Err(CompilerError::type_error(
                "array has incomplete element type",
                location,
            ));
        }
        Ok(self.types.array_of(element, length))
    }

    /// Parameter list of a function declarator. `(void)` is an empty list,
    /// `...` after at least one parameter marks a variadic tail, a trailing
    /// comma is rejected.
    fn parameter_list(&mut self, base: TypeId) -> Result<TypeId, CompilerError> {
        let func = self.types.function(base);

        while !self.check(&TokenKind::RightParen) {
            let location = self.location();
            let ty = self.specifier_qualifier_list()?;
            let mut name = None;
            let ty = self
                .declarator(Some(ty), Some(&mut name))?
                .ok_or_else(|| CompilerError::internal("declarator lost base type"))?;

            if self.types.is_void(ty) {
                if self.types.nmembers(func) > 0 {
                    return Err(CompilerError::type_error(
                        "incomplete type in parameter list",
                        location,
                    ));
                }
                break;
            }

            self.types.add_member(func, name, Some(ty));
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.next_token();
            if self.check(&TokenKind::RightParen) {
                return Err(CompilerError::syntax(
                    "unexpected trailing comma in parameter list",
                    self.location(),
                ));
            }
            if self.check(&TokenKind::Ellipsis) {
                self.next_token();
                self.types.add_member(func, Some("...".to_string()), None);
                break;
            }
        }

        Ok(func)
    }

    /// Type-name: specifier-qualifier-list with an optional abstract
    /// declarator. Used by casts, sizeof and va_arg.
    pub(crate) fn type_name(&mut self) -> Result<TypeId, CompilerError> {
        let base = self.specifier_qualifier_list()?;
        if self.check(&TokenKind::RightParen) {
            return Ok(base);
        }
        Ok(self.declarator(Some(base), None)?.unwrap_or(base))
    }

    /// One declaration: specifiers, then a comma-separated declarator list
    /// with optional initializers, or a function definition.
    pub(crate) fn declaration(&mut self, parent: BlockId) -> Result<BlockId, CompilerError> {
        let (base, storage_spec) = self.declaration_specifiers()?;
        let at_file_scope = self.symbols.ident.current_depth() == 0;
        let (storage, linkage) = match storage_spec {
            Some(StorageClassSpecifier::Extern) => (Storage::Declaration, Linkage::Extern),
            Some(StorageClassSpecifier::Static) => (Storage::Tentative, Linkage::Intern),
            Some(StorageClassSpecifier::Typedef) => (Storage::Typedef, Linkage::None),
            _ if at_file_scope => (Storage::Tentative, Linkage::Extern),
            _ => (Storage::Definition, Linkage::None),
        };

        let mut parent = parent;
        loop {
            let location = self.location();
            let mut name = None;
            let ty = self
                .declarator(Some(base), Some(&mut name))?
                .ok_or_else(|| CompilerError::internal("declarator lost base type"))?;

            let Some(name) = name else {
                // Tag declarations like `struct s { ... };`
                self.consume(TokenKind::Semicolon)?;
                return Ok(parent);
            };

            let sym =
                self.symbols
                    .add_ident(&self.types, &name, ty, storage, linkage, location)?;
            let depth = self.symbols.symbol(sym).depth;
            if depth > 0
                && storage != Storage::Typedef
                && !self.types.is_function(ty)
                && !self.cfg.locals.contains(&sym)
            {
                self.cfg.register_local(sym);
            }

            match self.peek().kind {
                TokenKind::Semicolon => {
                    self.next_token();
                    self.require_complete(sym, location)?;
                    return Ok(parent);
                }
                TokenKind::Equal => {
                    parent = self.initialized_declarator(parent, sym, storage_spec)?;
                    if !self.check(&TokenKind::Comma) {
                        self.consume(TokenKind::Semicolon)?;
                        return Ok(parent);
                    }
                }
                TokenKind::LeftBrace => {
                    return self.function_definition(parent, sym, location);
                }
                _ => {
                    self.require_complete(sym, location)?;
                }
            }
            self.consume(TokenKind::Comma)?;
        }
    }

    /// Objects of incomplete type never reach past their declarator; the
    /// exceptions are extern declarations, typedefs, and a file-scope array
    /// with unspecified outer dimension awaiting its initializer.
    fn require_complete(
        &self,
        sym: qcc_common::SymbolId,
        location: SourceLocation,
    ) -> Result<(), CompilerError> {
        let symbol = self.symbols.symbol(sym);
        let ty = symbol.ty;
        if self.types.size_of(ty) > 0
            || self.types.is_function(ty)
            || matches!(symbol.storage, Storage::Typedef | Storage::Declaration)
            || (self.types.is_array(ty) && symbol.depth == 0)
        {
            return Ok(());
        }
        Err(CompilerError::type_error(
            format!("variable '{}' has incomplete type", symbol.name),
            location,
        ))
    }

    /// `= initializer` following a declarator
    fn initialized_declarator(
        &mut self,
        parent: BlockId,
        sym: qcc_common::SymbolId,
        storage_spec: Option<StorageClassSpecifier>,
    ) -> Result<BlockId, CompilerError> {
        let location = self.location();
        let symbol = self.symbols.symbol(sym);
        let name = symbol.name.clone();
        let depth = symbol.depth;

        if symbol.storage == Storage::Declaration {
            return Err(CompilerError::semantic(
                format!("extern symbol '{name}' cannot be initialized"),
                location,
            ));
        }
        if depth == 0 && symbol.storage == Storage::Definition {
            return Err(CompilerError::semantic(
                format!("symbol '{name}' was already defined"),
                location,
            ));
        }
        self.consume(TokenKind::Equal)?;
        self.symbols.symbol_mut(sym).storage = Storage::Definition;

        let target = Var::direct(sym, &self.symbols);
        let load_time = depth == 0 || storage_spec == Some(StorageClassSpecifier::Static);
        let parent = if load_time {
            let head = self.cfg.head;
            let tail = self.initializer(head, target)?;
            self.cfg.head = tail;
            parent
        } else {
            self.initializer(parent, target)?
        };

        if self.types.size_of(self.symbols.symbol(sym).ty) == 0 {
            return Err(CompilerError::type_error(
                format!("variable '{name}' has incomplete type"),
                location,
            ));
        }
        Ok(parent)
    }

    /// Function body following a declarator at file scope. Pushes the
    /// parameter scope, synthesizes `__func__`, registers parameters, and
    /// parses the body as a compound statement.
    fn function_definition(
        &mut self,
        parent: BlockId,
        sym: qcc_common::SymbolId,
        location: SourceLocation,
    ) -> Result<BlockId, CompilerError> {
        let symbol = self.symbols.symbol(sym);
        let name = symbol.name.clone();
        let ty = symbol.ty;

        if !self.types.is_function(ty) || symbol.depth > 0 {
            return Err(CompilerError::semantic("invalid function definition", location));
        }
        if symbol.storage == Storage::Definition {
            return Err(CompilerError::symbol(
                format!("redefinition of '{name}'"),
                location,
            ));
        }
        debug!("function definition '{name}'");
        self.symbols.symbol_mut(sym).storage = Storage::Definition;
        self.cfg.fun = Some(sym);

        // The parameter scope must be popped on error paths as well
        self.symbols.ident.push_scope();
        let result = self.function_body(parent, &name, ty, location);
        self.symbols.ident.pop_scope();
        result
    }

    fn function_body(
        &mut self,
        parent: BlockId,
        name: &str,
        ty: TypeId,
        location: SourceLocation,
    ) -> Result<BlockId, CompilerError> {
        self.define_func_constant(name, location)?;
        for index in 0..self.types.nmembers(ty) {
            let member = self.types.member(ty, index).clone();
            let Some(param_name) = member.name else {
                return Err(CompilerError::semantic(
                    format!("missing parameter name at position {}", index + 1),
                    location,
                ));
            };
            let param_ty = member
                .ty
                .ok_or_else(|| CompilerError::internal("parameter without type"))?;
            let param = self.symbols.add_ident(
                &self.types,
                &param_name,
                param_ty,
                Storage::Definition,
                Linkage::None,
                location,
            )?;
            self.cfg.register_param(param);
        }
        self.block(parent)
    }

    /// C99: `static const char __func__[] = "name";`
    fn define_func_constant(
        &mut self,
        name: &str,
        location: SourceLocation,
    ) -> Result<(), CompilerError> {
        let value = Var::string(name, &mut self.types);
        let sym = self.symbols.add_ident(
            &self.types,
            "__func__",
            value.ty(),
            Storage::Definition,
            Linkage::Intern,
            location,
        )?;
        let target = Var::direct(sym, &self.symbols);
        let head = self.cfg.head;
        self.ir().eval_assign(location, head, target, value)?;
        Ok(())
    }
}
