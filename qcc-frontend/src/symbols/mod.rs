//! Symbol table
//!
//! Two namespaces share one symbol arena: `ident` for objects, functions,
//! typedefs and enum constants, `tag` for struct/union/enum tags. Each
//! namespace is a stack of scopes; a name resolves to the innermost scope
//! that binds it. Depth 0 is file scope, depth 1 holds function parameters,
//! inner blocks are 2 and deeper.

use crate::types::TypeTable;
use qcc_common::{CompilerError, Linkage, SourceLocation, Storage, SymbolId, TypeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A declared name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub ty: TypeId,
    pub storage: Storage,
    pub linkage: Linkage,
    pub depth: u32,
    /// Value of an enumeration constant, and definition sentinel on enum tags
    pub enum_value: Option<i64>,
}

/// One namespace: a stack of name-to-symbol scopes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    scopes: Vec<HashMap<String, SymbolId>>,
}

impl Namespace {
    fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop file scope");
        self.scopes.pop();
    }

    /// Current scope depth; 0 is file scope
    pub fn current_depth(&self) -> u32 {
        (self.scopes.len() - 1) as u32
    }

    /// Resolve a name against the innermost scope that binds it
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// Resolve against the current scope only
    pub fn lookup_current(&self, name: &str) -> Option<SymbolId> {
        self.scopes.last().and_then(|scope| scope.get(name).copied())
    }

    fn bind(&mut self, name: String, id: SymbolId) {
        self.scopes
            .last_mut()
            .expect("namespace always has a scope")
            .insert(name, id);
    }
}

/// Symbol arena plus the two namespaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    pub ident: Namespace,
    pub tag: Namespace,
    temporaries: u32,
}

fn storage_rank(storage: Storage) -> u8 {
    match storage {
        Storage::Declaration => 0,
        Storage::Tentative => 1,
        Storage::Definition => 2,
        Storage::Typedef | Storage::EnumValue => 3,
    }
}

impl SymbolTable {
    /// Fresh table with the builtin pseudo functions registered at file
    /// scope, so they resolve like ordinary identifiers.
    pub fn new(types: &mut TypeTable) -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            ident: Namespace::new(),
            tag: Namespace::new(),
            temporaries: 0,
        };
        for builtin in ["__builtin_va_start", "__builtin_va_arg"] {
            let ty = types.function(TypeTable::VOID);
            let id = table.push(Symbol {
                name: builtin.to_string(),
                ty,
                storage: Storage::Declaration,
                linkage: Linkage::None,
                depth: 0,
                enum_value: None,
            });
            table.ident.bind(builtin.to_string(), id);
        }
        table
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id as usize]
    }

    fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = self.symbols.len() as SymbolId;
        self.symbols.push(symbol);
        id
    }

    pub fn lookup_ident(&self, name: &str) -> Option<SymbolId> {
        self.ident.lookup(name)
    }

    pub fn lookup_tag(&self, name: &str) -> Option<SymbolId> {
        self.tag.lookup(name)
    }

    /// Declare a name in the identifier namespace.
    ///
    /// Redeclaration in the same scope is allowed for compatible object and
    /// function types; the storage class is upgraded monotonically
    /// (declaration, tentative, definition), so a later definition wins over
    /// a tentative one and duplicate definitions are caught by the caller
    /// inspecting the surviving storage.
    pub fn add_ident(
        &mut self,
        types: &TypeTable,
        name: &str,
        ty: TypeId,
        storage: Storage,
        linkage: Linkage,
        location: SourceLocation,
    ) -> Result<SymbolId, CompilerError> {
        if let Some(existing) = self.ident.lookup_current(name) {
            let prior = self.symbol(existing).clone();
            if matches!(prior.storage, Storage::EnumValue)
                || matches!(storage, Storage::EnumValue)
            {
                return Err(CompilerError::symbol(
                    format!("duplicate definition of '{name}'"),
                    location,
                ));
            }
            let same_kind = matches!(
                (prior.storage, storage),
                (Storage::Typedef, Storage::Typedef)
            ) || (prior.storage != Storage::Typedef && storage != Storage::Typedef);
            if !same_kind {
                return Err(CompilerError::symbol(
                    format!("'{name}' redeclared as a different kind of symbol"),
                    location,
                ));
            }
            if !types.compatible(prior.ty, ty) {
                return Err(CompilerError::symbol(
                    format!(
                        "conflicting types for '{name}': '{}' after '{}'",
                        types.to_string(ty),
                        types.to_string(prior.ty)
                    ),
                    location,
                ));
            }
            if storage_rank(storage) > storage_rank(prior.storage) {
                self.symbol_mut(existing).storage = storage;
            }
            if prior.linkage == Linkage::None && linkage != Linkage::None {
                self.symbol_mut(existing).linkage = linkage;
            }
            return Ok(existing);
        }

        let depth = self.ident.current_depth();
        let id = self.push(Symbol {
            name: name.to_string(),
            ty,
            storage,
            linkage,
            depth,
            enum_value: None,
        });
        self.ident.bind(name.to_string(), id);
        Ok(id)
    }

    /// Register a tag in the tag namespace. Conflict handling is the
    /// caller's business; binding the same tag twice in one scope is an
    /// internal error.
    pub fn add_tag(
        &mut self,
        name: &str,
        ty: TypeId,
        location: SourceLocation,
    ) -> Result<SymbolId, CompilerError> {
        if self.tag.lookup_current(name).is_some() {
            return Err(CompilerError::symbol(
                format!("tag '{name}' already bound in this scope"),
                location,
            ));
        }
        let depth = self.tag.current_depth();
        let id = self.push(Symbol {
            name: name.to_string(),
            ty,
            storage: Storage::Typedef,
            linkage: Linkage::None,
            depth,
            enum_value: None,
        });
        self.tag.bind(name.to_string(), id);
        Ok(id)
    }

    /// Compiler-generated temporary in the current scope
    pub fn temporary(&mut self, ty: TypeId) -> SymbolId {
        let name = format!(".t{}", self.temporaries);
        self.temporaries += 1;
        let depth = self.ident.current_depth();
        let id = self.push(Symbol {
            name: name.clone(),
            ty,
            storage: Storage::Definition,
            linkage: Linkage::None,
            depth,
            enum_value: None,
        });
        self.ident.bind(name, id);
        id
    }

    /// All symbols, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (i as SymbolId, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> (TypeTable, SymbolTable) {
        let mut types = TypeTable::new();
        let symbols = SymbolTable::new(&mut types);
        (types, symbols)
    }

    #[test]
    fn test_innermost_scope_wins() {
        let (types, mut symbols) = table();
        let loc = SourceLocation::none();
        let outer = symbols
            .add_ident(&types, "x", TypeTable::INT, Storage::Tentative, Linkage::Extern, loc)
            .unwrap();
        symbols.ident.push_scope();
        symbols.ident.push_scope();
        let inner = symbols
            .add_ident(&types, "x", TypeTable::CHAR, Storage::Definition, Linkage::None, loc)
            .unwrap();

        assert_ne!(outer, inner);
        assert_eq!(symbols.lookup_ident("x"), Some(inner));
        assert_eq!(symbols.symbol(inner).depth, 2);

        symbols.ident.pop_scope();
        symbols.ident.pop_scope();
        assert_eq!(symbols.lookup_ident("x"), Some(outer));
    }

    #[test]
    fn test_storage_upgrade_on_redeclaration() {
        let (types, mut symbols) = table();
        let loc = SourceLocation::none();
        let first = symbols
            .add_ident(&types, "f", TypeTable::INT, Storage::Declaration, Linkage::Extern, loc)
            .unwrap();
        let second = symbols
            .add_ident(&types, "f", TypeTable::INT, Storage::Tentative, Linkage::Extern, loc)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(symbols.symbol(first).storage, Storage::Tentative);
    }

    #[test]
    fn test_conflicting_redeclaration() {
        let (types, mut symbols) = table();
        let loc = SourceLocation::none();
        symbols
            .add_ident(&types, "x", TypeTable::INT, Storage::Tentative, Linkage::Extern, loc)
            .unwrap();
        let result =
            symbols.add_ident(&types, "x", TypeTable::CHAR, Storage::Tentative, Linkage::Extern, loc);
        assert!(matches!(result, Err(CompilerError::Symbol { .. })));
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        let (types, mut symbols) = table();
        let loc = SourceLocation::none();
        symbols
            .add_ident(&types, "list", TypeTable::INT, Storage::Tentative, Linkage::Extern, loc)
            .unwrap();
        symbols.add_tag("list", TypeTable::INT, loc).unwrap();
        assert_ne!(symbols.lookup_ident("list"), symbols.lookup_tag("list"));
    }

    #[test]
    fn test_builtins_resolve() {
        let (_, symbols) = table();
        assert!(symbols.lookup_ident("__builtin_va_start").is_some());
        assert!(symbols.lookup_ident("__builtin_va_arg").is_some());
    }

    #[test]
    fn test_temporaries_are_unique() {
        let (_, mut symbols) = table();
        let a = symbols.temporary(TypeTable::INT);
        let b = symbols.temporary(TypeTable::INT);
        assert_ne!(symbols.symbol(a).name, symbols.symbol(b).name);
    }
}
