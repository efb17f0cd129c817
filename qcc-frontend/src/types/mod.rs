//! C type tree
//!
//! Types are nodes in an arena (`TypeTable`) referenced by `TypeId`, so
//! self-referential types (a struct containing a pointer to itself) need no
//! special casing. The `next` link points at the pointee, element or return
//! type; aggregates and function types carry an ordered member list.
//!
//! Tag registration hands out "tagged copies": fresh root nodes that alias
//! the canonical definition through the `tag` field. Qualifiers applied by a
//! declaration land on the copy and never disturb the canonical type; size
//! and member queries unwrap to the canonical node.

use qcc_common::TypeId;
use serde::{Deserialize, Serialize};

/// Type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeKind {
    Void,
    Char,
    Signed,
    Unsigned,
    Float,
    Double,
    Pointer,
    Array,
    Function,
    Struct,
    Union,
}

/// const/volatile qualifier set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
}

impl Qualifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn overlaps(&self, other: &Qualifiers) -> bool {
        (self.is_const && other.is_const) || (self.is_volatile && other.is_volatile)
    }

    pub fn merge(&self, other: &Qualifiers) -> Qualifiers {
        Qualifiers {
            is_const: self.is_const || other.is_const,
            is_volatile: self.is_volatile || other.is_volatile,
        }
    }
}

/// Aggregate member or function parameter.
///
/// The variadic tail of a function type is the sentinel member named
/// `"..."` with no type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: Option<String>,
    pub ty: Option<TypeId>,
    pub offset: u32,
}

/// One node of the type tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    pub kind: TypeKind,
    pub qualifiers: Qualifiers,
    /// Size in bytes; 0 marks an incomplete type
    pub size: u32,
    /// Pointee, element or return type
    pub next: Option<TypeId>,
    /// Aggregate members or function parameters
    pub members: Vec<Member>,
    /// Canonical definition when this node is a tagged copy
    pub tag: Option<TypeId>,
    /// Tag the canonical definition was registered under
    pub tag_name: Option<String>,
}

impl TypeNode {
    fn basic(kind: TypeKind, size: u32) -> Self {
        Self {
            kind,
            qualifiers: Qualifiers::none(),
            size,
            next: None,
            members: Vec::new(),
            tag: None,
            tag_name: None,
        }
    }
}

/// Arena of type nodes for one translation unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeTable {
    nodes: Vec<TypeNode>,
}

fn round_up(value: u32, align: u32) -> u32 {
    debug_assert!(align > 0);
    value.div_ceil(align) * align
}

impl TypeTable {
    // Well-known basic types, pre-interned in `new` at fixed indices.
    pub const VOID: TypeId = 0;
    pub const CHAR: TypeId = 1;
    pub const UNSIGNED_CHAR: TypeId = 2;
    pub const SHORT: TypeId = 3;
    pub const UNSIGNED_SHORT: TypeId = 4;
    pub const INT: TypeId = 5;
    pub const UNSIGNED_INT: TypeId = 6;
    pub const LONG: TypeId = 7;
    pub const UNSIGNED_LONG: TypeId = 8;
    pub const FLOAT: TypeId = 9;
    pub const DOUBLE: TypeId = 10;

    pub fn new() -> Self {
        let nodes = vec![
            TypeNode::basic(TypeKind::Void, 0),
            TypeNode::basic(TypeKind::Char, 1),
            TypeNode::basic(TypeKind::Unsigned, 1),
            TypeNode::basic(TypeKind::Signed, 2),
            TypeNode::basic(TypeKind::Unsigned, 2),
            TypeNode::basic(TypeKind::Signed, 4),
            TypeNode::basic(TypeKind::Unsigned, 4),
            TypeNode::basic(TypeKind::Signed, 8),
            TypeNode::basic(TypeKind::Unsigned, 8),
            TypeNode::basic(TypeKind::Float, 4),
            TypeNode::basic(TypeKind::Double, 8),
        ];
        Self { nodes }
    }

    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id as usize]
    }

    fn node_mut(&mut self, id: TypeId) -> &mut TypeNode {
        &mut self.nodes[id as usize]
    }

    fn alloc(&mut self, node: TypeNode) -> TypeId {
        let id = self.nodes.len() as TypeId;
        self.nodes.push(node);
        id
    }

    /// Fresh copy of the root node; members and links are shared
    pub fn shallow_copy(&mut self, id: TypeId) -> TypeId {
        let node = self.node(id).clone();
        self.alloc(node)
    }

    /// Fresh qualifier-bearing handle referencing a canonical tag definition
    pub fn tagged_copy(&mut self, canonical: TypeId, name: &str) -> TypeId {
        let kind = self.node(canonical).kind;
        self.alloc(TypeNode {
            kind,
            qualifiers: Qualifiers::none(),
            size: 0,
            next: None,
            members: Vec::new(),
            tag: Some(canonical),
            tag_name: Some(name.to_string()),
        })
    }

    pub fn pointer_to(&mut self, ty: TypeId) -> TypeId {
        self.pointer(Some(ty))
    }

    /// Pointer node, possibly with an unfilled pointee. Declarator parsing
    /// threads the postfix type onto the open tail afterwards.
    pub fn pointer(&mut self, next: Option<TypeId>) -> TypeId {
        self.alloc(TypeNode {
            size: 8,
            next,
            ..TypeNode::basic(TypeKind::Pointer, 8)
        })
    }

    /// Raw `next` link, used to find the tail of an inner declarator tree
    pub fn next_of(&self, id: TypeId) -> Option<TypeId> {
        self.node(id).next
    }

    pub fn set_next(&mut self, id: TypeId, next: TypeId) {
        self.node_mut(id).next = Some(next);
    }

    /// Array of `count` elements; `count == 0` gives an incomplete array
    pub fn array_of(&mut self, element: TypeId, count: u32) -> TypeId {
        let size = count * self.size_of(element);
        self.alloc(TypeNode {
            size,
            next: Some(element),
            ..TypeNode::basic(TypeKind::Array, 0)
        })
    }

    /// Function type returning `ret`, parameters added via `add_member`
    pub fn function(&mut self, ret: TypeId) -> TypeId {
        self.alloc(TypeNode {
            next: Some(ret),
            ..TypeNode::basic(TypeKind::Function, 0)
        })
    }

    /// Incomplete struct or union
    pub fn aggregate(&mut self, kind: TypeKind) -> TypeId {
        debug_assert!(matches!(kind, TypeKind::Struct | TypeKind::Union));
        self.alloc(TypeNode::basic(kind, 0))
    }

    pub fn add_qualifiers(&mut self, id: TypeId, qualifiers: Qualifiers) {
        let node = self.node_mut(id);
        node.qualifiers = node.qualifiers.merge(&qualifiers);
    }

    /// Append a member to an aggregate or function type, computing struct
    /// offsets with natural alignment.
    pub fn add_member(&mut self, id: TypeId, name: Option<String>, ty: Option<TypeId>) {
        let (offset, new_size) = match (self.node(id).kind, ty) {
            (TypeKind::Struct, Some(member_ty)) => {
                let offset = round_up(self.node(id).size, self.align_of(member_ty));
                (offset, offset + self.size_of(member_ty))
            }
            (TypeKind::Union, Some(member_ty)) => {
                (0, self.node(id).size.max(self.size_of(member_ty)))
            }
            // Function parameter, or the vararg sentinel
            _ => (0, self.node(id).size),
        };
        let node = self.node_mut(id);
        node.members.push(Member { name, ty, offset });
        node.size = new_size;
    }

    /// Round a completed aggregate up to its alignment
    pub fn seal_aggregate(&mut self, id: TypeId) {
        let align = self.align_of(id);
        let node = self.node_mut(id);
        node.size = round_up(node.size, align);
    }

    /// Complete an incomplete array type with its total size in bytes
    pub fn complete_array(&mut self, id: TypeId, size: u32) {
        debug_assert_eq!(self.node(id).kind, TypeKind::Array);
        self.node_mut(id).size = size;
    }

    /// Resolve a tagged copy to its canonical definition
    pub fn unwrapped(&self, id: TypeId) -> TypeId {
        match self.node(id).tag {
            Some(canonical) => canonical,
            None => id,
        }
    }

    pub fn kind(&self, id: TypeId) -> TypeKind {
        self.node(id).kind
    }

    pub fn size_of(&self, id: TypeId) -> u32 {
        self.node(self.unwrapped(id)).size
    }

    pub fn align_of(&self, id: TypeId) -> u32 {
        let id = self.unwrapped(id);
        let node = self.node(id);
        match node.kind {
            TypeKind::Void | TypeKind::Function => 1,
            TypeKind::Char => 1,
            TypeKind::Signed | TypeKind::Unsigned | TypeKind::Float | TypeKind::Double => node.size,
            TypeKind::Pointer => 8,
            TypeKind::Array => node.next.map_or(1, |e| self.align_of(e)),
            TypeKind::Struct | TypeKind::Union => node
                .members
                .iter()
                .filter_map(|m| m.ty)
                .map(|t| self.align_of(t))
                .max()
                .unwrap_or(1),
        }
    }

    pub fn is_void(&self, id: TypeId) -> bool {
        self.kind(id) == TypeKind::Void
    }

    pub fn is_integer(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Char | TypeKind::Signed | TypeKind::Unsigned)
    }

    pub fn is_arithmetic(&self, id: TypeId) -> bool {
        self.is_integer(id) || matches!(self.kind(id), TypeKind::Float | TypeKind::Double)
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        self.kind(id) == TypeKind::Pointer
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        self.kind(id) == TypeKind::Array
    }

    pub fn is_function(&self, id: TypeId) -> bool {
        self.kind(id) == TypeKind::Function
    }

    pub fn is_struct_or_union(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Struct | TypeKind::Union)
    }

    /// Pointee or element type
    pub fn deref(&self, id: TypeId) -> Option<TypeId> {
        let id = self.unwrapped(id);
        match self.node(id).kind {
            TypeKind::Pointer | TypeKind::Array => self.node(id).next,
            _ => None,
        }
    }

    /// Function return type
    pub fn ret(&self, id: TypeId) -> Option<TypeId> {
        let id = self.unwrapped(id);
        match self.node(id).kind {
            TypeKind::Function => self.node(id).next,
            _ => None,
        }
    }

    pub fn is_vararg(&self, id: TypeId) -> bool {
        let id = self.unwrapped(id);
        self.node(id)
            .members
            .last()
            .is_some_and(|m| m.name.as_deref() == Some("...") && m.ty.is_none())
    }

    /// Member count; for function types the vararg sentinel is not counted
    pub fn nmembers(&self, id: TypeId) -> usize {
        let id = self.unwrapped(id);
        let n = self.node(id).members.len();
        if self.is_vararg(id) {
            n - 1
        } else {
            n
        }
    }

    pub fn member(&self, id: TypeId, index: usize) -> &Member {
        let id = self.unwrapped(id);
        &self.node(id).members[index]
    }

    pub fn find_member(&self, id: TypeId, name: &str) -> Option<Member> {
        let id = self.unwrapped(id);
        self.node(id)
            .members
            .iter()
            .find(|m| m.name.as_deref() == Some(name))
            .cloned()
    }

    /// Loose structural compatibility, used for redeclarations and
    /// assignment checking.
    pub fn compatible(&self, a: TypeId, b: TypeId) -> bool {
        let a = self.unwrapped(a);
        let b = self.unwrapped(b);
        if a == b {
            return true;
        }
        let (na, nb) = (self.node(a), self.node(b));
        if na.kind != nb.kind {
            return false;
        }
        match na.kind {
            TypeKind::Void => true,
            TypeKind::Char | TypeKind::Signed | TypeKind::Unsigned | TypeKind::Float
            | TypeKind::Double => na.size == nb.size,
            TypeKind::Pointer => match (na.next, nb.next) {
                (Some(x), Some(y)) => self.compatible(x, y),
                _ => false,
            },
            TypeKind::Array => {
                na.size == nb.size
                    && match (na.next, nb.next) {
                        (Some(x), Some(y)) => self.compatible(x, y),
                        _ => false,
                    }
            }
            TypeKind::Function => {
                let ret_ok = match (na.next, nb.next) {
                    (Some(x), Some(y)) => self.compatible(x, y),
                    _ => false,
                };
                ret_ok
                    && na.members.len() == nb.members.len()
                    && na.members.iter().zip(&nb.members).all(|(x, y)| {
                        match (x.ty, y.ty) {
                            (Some(tx), Some(ty_)) => self.compatible(tx, ty_),
                            (None, None) => true,
                            _ => false,
                        }
                    })
            }
            TypeKind::Struct | TypeKind::Union => {
                na.members.len() == nb.members.len()
                    && na.members.iter().zip(&nb.members).all(|(x, y)| {
                        x.name == y.name
                            && match (x.ty, y.ty) {
                                (Some(tx), Some(ty_)) => self.compatible(tx, ty_),
                                (None, None) => true,
                                _ => false,
                            }
                    })
            }
        }
    }

    /// Readable rendering for error messages
    pub fn to_string(&self, id: TypeId) -> String {
        let node = self.node(id);
        let mut prefix = String::new();
        if node.qualifiers.is_const {
            prefix.push_str("const ");
        }
        if node.qualifiers.is_volatile {
            prefix.push_str("volatile ");
        }

        if let Some(name) = &node.tag_name {
            let keyword = match node.kind {
                TypeKind::Union => "union",
                _ => "struct",
            };
            return format!("{prefix}{keyword} {name}");
        }

        let body = match node.kind {
            TypeKind::Void => "void".to_string(),
            TypeKind::Char => "char".to_string(),
            TypeKind::Signed => match node.size {
                2 => "short".to_string(),
                8 => "long".to_string(),
                _ => "int".to_string(),
            },
            TypeKind::Unsigned => match node.size {
                1 => "unsigned char".to_string(),
                2 => "unsigned short".to_string(),
                8 => "unsigned long".to_string(),
                _ => "unsigned int".to_string(),
            },
            TypeKind::Float => "float".to_string(),
            TypeKind::Double => "double".to_string(),
            TypeKind::Pointer => {
                format!("* {}", node.next.map_or_else(|| "?".into(), |t| self.to_string(t)))
            }
            TypeKind::Array => match node.next {
                Some(elem) => {
                    let count = match self.size_of(elem) {
                        0 => 0,
                        n => node.size / n,
                    };
                    format!("[{}] {}", count, self.to_string(elem))
                }
                None => "[?]".to_string(),
            },
            TypeKind::Function => {
                let params: Vec<String> = node
                    .members
                    .iter()
                    .map(|m| match m.ty {
                        Some(t) => self.to_string(t),
                        None => "...".to_string(),
                    })
                    .collect();
                format!(
                    "({}) -> {}",
                    params.join(", "),
                    node.next.map_or_else(|| "?".into(), |t| self.to_string(t))
                )
            }
            TypeKind::Struct => "struct".to_string(),
            TypeKind::Union => "union".to_string(),
        };
        format!("{prefix}{body}")
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_sizes() {
        let types = TypeTable::new();
        assert_eq!(types.size_of(TypeTable::CHAR), 1);
        assert_eq!(types.size_of(TypeTable::INT), 4);
        assert_eq!(types.size_of(TypeTable::LONG), 8);
        assert_eq!(types.size_of(TypeTable::VOID), 0);
        assert!(types.is_integer(TypeTable::CHAR));
        assert!(!types.is_integer(TypeTable::DOUBLE));
        assert!(types.is_arithmetic(TypeTable::DOUBLE));
    }

    #[test]
    fn test_pointer_and_array() {
        let mut types = TypeTable::new();
        let ptr = types.pointer_to(TypeTable::INT);
        assert_eq!(types.size_of(ptr), 8);
        assert_eq!(types.deref(ptr), Some(TypeTable::INT));

        let arr = types.array_of(TypeTable::INT, 3);
        assert_eq!(types.size_of(arr), 12);
        assert_eq!(types.deref(arr), Some(TypeTable::INT));

        let incomplete = types.array_of(TypeTable::INT, 0);
        assert_eq!(types.size_of(incomplete), 0);
        types.complete_array(incomplete, 20);
        assert_eq!(types.size_of(incomplete), 20);
    }

    #[test]
    fn test_struct_layout() {
        let mut types = TypeTable::new();
        let s = types.aggregate(TypeKind::Struct);
        types.add_member(s, Some("c".into()), Some(TypeTable::CHAR));
        types.add_member(s, Some("i".into()), Some(TypeTable::INT));
        types.add_member(s, Some("c2".into()), Some(TypeTable::CHAR));
        types.seal_aggregate(s);

        assert_eq!(types.member(s, 0).offset, 0);
        assert_eq!(types.member(s, 1).offset, 4);
        assert_eq!(types.member(s, 2).offset, 8);
        // char at 8, rounded up to int alignment
        assert_eq!(types.size_of(s), 12);
    }

    #[test]
    fn test_union_layout() {
        let mut types = TypeTable::new();
        let u = types.aggregate(TypeKind::Union);
        types.add_member(u, Some("c".into()), Some(TypeTable::CHAR));
        types.add_member(u, Some("l".into()), Some(TypeTable::LONG));
        types.seal_aggregate(u);

        assert_eq!(types.member(u, 1).offset, 0);
        assert_eq!(types.size_of(u), 8);
    }

    #[test]
    fn test_function_and_vararg() {
        let mut types = TypeTable::new();
        let f = types.function(TypeTable::INT);
        types.add_member(f, Some("x".into()), Some(TypeTable::INT));
        types.add_member(f, Some("...".into()), None);

        assert!(types.is_vararg(f));
        assert_eq!(types.nmembers(f), 1);
        assert_eq!(types.ret(f), Some(TypeTable::INT));
    }

    #[test]
    fn test_tagged_copy_tracks_completion() {
        let mut types = TypeTable::new();
        let canonical = types.aggregate(TypeKind::Struct);
        let copy = types.tagged_copy(canonical, "S");

        assert_eq!(types.size_of(copy), 0);
        types.add_member(canonical, Some("a".into()), Some(TypeTable::INT));
        types.seal_aggregate(canonical);
        assert_eq!(types.size_of(copy), 4);
        assert_eq!(types.find_member(copy, "a").unwrap().offset, 0);
        assert_eq!(types.to_string(copy), "struct S");
    }

    #[test]
    fn test_compatibility() {
        let mut types = TypeTable::new();
        let p1 = types.pointer_to(TypeTable::INT);
        let p2 = types.pointer_to(TypeTable::INT);
        let p3 = types.pointer_to(TypeTable::CHAR);
        assert!(types.compatible(p1, p2));
        assert!(!types.compatible(p1, p3));
        assert!(!types.compatible(TypeTable::INT, TypeTable::LONG));
    }

    #[test]
    fn test_rendering() {
        let mut types = TypeTable::new();
        let ptr = types.pointer_to(TypeTable::CHAR);
        assert_eq!(types.to_string(ptr), "* char");
        let arr = types.array_of(TypeTable::INT, 3);
        assert_eq!(types.to_string(arr), "[3] int");
        let f = types.function(TypeTable::VOID);
        types.add_member(f, Some("x".into()), Some(TypeTable::INT));
        assert_eq!(types.to_string(f), "(int) -> void");
    }
}
