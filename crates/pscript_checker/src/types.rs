//! Type representation.
//!
//! Types are stored in a `TypeTable` and referenced by `TypeId`. A type never
//! changes once it has been added, so handles stay valid for the whole
//! compilation and can be shared across threads.

use indexmap::IndexMap;
use pscript_ast::types::{TypeFlags, TypeId};

#[derive(Debug, Clone)]
pub struct Type {
    pub id: TypeId,
    pub flags: TypeFlags,
    /// Simple name, e.g. `Vector` or `int`.
    pub name: String,
    /// Dotted namespace, empty for the global namespace.
    pub namespace: String,
    pub kind: TypeKind,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    /// `*`, `int`, `String`, ...
    Builtin,
    /// Classes and interfaces, including generic definitions.
    Class(ClassType),
    /// A native array of `element` with `rank` dimensions.
    Array { element: TypeId, rank: u32 },
    /// `definition.<args>`
    GenericInstance { definition: TypeId, args: Vec<TypeId> },
    /// The `index`th type parameter of the enclosing generic definition.
    TypeParameter { index: u32 },
}

#[derive(Debug, Clone, Default)]
pub struct ClassType {
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub members: IndexMap<String, Member>,
    /// Number of type parameters; 0 for non-generic types.
    pub arity: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    Field { ty: TypeId },
    Method { params: Vec<TypeId>, ret: TypeId },
    /// `target[key]` yields `value`.
    Indexer { key: TypeId, value: TypeId },
}

impl Member {
    pub fn field(name: &str, ty: TypeId) -> Self {
        Self { name: name.to_string(), kind: MemberKind::Field { ty }, is_static: false }
    }

    pub fn static_field(name: &str, ty: TypeId) -> Self {
        Self { is_static: true, ..Self::field(name, ty) }
    }

    pub fn method(name: &str, params: &[TypeId], ret: TypeId) -> Self {
        Self {
            name: name.to_string(),
            kind: MemberKind::Method { params: params.to_vec(), ret },
            is_static: false,
        }
    }

    pub fn static_method(name: &str, params: &[TypeId], ret: TypeId) -> Self {
        Self { is_static: true, ..Self::method(name, params, ret) }
    }

    pub fn indexer(key: TypeId, value: TypeId) -> Self {
        Self {
            name: INDEXER_NAME.to_string(),
            kind: MemberKind::Indexer { key, value },
            is_static: false,
        }
    }

    /// The type a use of this member yields.
    pub fn value_type(&self) -> TypeId {
        match &self.kind {
            MemberKind::Field { ty } => *ty,
            MemberKind::Method { ret, .. } => *ret,
            MemberKind::Indexer { value, .. } => *value,
        }
    }

    /// Rewrite every type in the member's signature.
    pub fn map_types(&self, mut f: impl FnMut(TypeId) -> TypeId) -> Member {
        let kind = match &self.kind {
            MemberKind::Field { ty } => MemberKind::Field { ty: f(*ty) },
            MemberKind::Method { params, ret } => MemberKind::Method {
                params: params.iter().map(|p| f(*p)).collect(),
                ret: f(*ret),
            },
            MemberKind::Indexer { key, value } => MemberKind::Indexer { key: f(*key), value: f(*value) },
        };
        Member { name: self.name.clone(), kind, is_static: self.is_static }
    }
}

/// Member name under which a type's indexer is stored.
pub const INDEXER_NAME: &str = "Item";

/// The type arena.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: Vec<Type>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self { types: Vec::with_capacity(64) }
    }

    /// Add a new type and return its handle.
    pub fn add_type(&mut self, flags: TypeFlags, name: &str, namespace: &str, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(Type {
            id,
            flags,
            name: name.to_string(),
            namespace: namespace.to_string(),
            kind,
        });
        id
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    /// Fill in members of a class added earlier. Used while bootstrapping
    /// types whose signatures refer to each other.
    pub(crate) fn class_mut(&mut self, id: TypeId) -> Option<&mut ClassType> {
        match &mut self.types[id.index()].kind {
            TypeKind::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
