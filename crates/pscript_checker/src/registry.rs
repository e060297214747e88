//! Builtin and predefined type registry.
//!
//! One registry serves every compilation unit of a program. After bootstrap
//! it is read-mostly: name lookups go through a `DashMap`, and the only
//! writes are memoized generic and array instantiations, so any number of
//! units can resolve against it in parallel.

use crate::types::*;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use pscript_ast::types::{TypeFlags, TypeId};
use pscript_core::intern::{InternedName, NameInterner};
use pscript_options::DEFAULT_ROOT_NAMESPACE;
use rustc_hash::FxBuildHasher;

/// Namespace of the dynamic runtime's predefined types.
pub const RUNTIME_NAMESPACE: &str = "pscript";
pub const COLLECTIONS_NAMESPACE: &str = "System.Collections";
pub const GENERIC_COLLECTIONS_NAMESPACE: &str = "System.Collections.Generic";
/// Static class under the root namespace that hosts the `typeof` helper.
pub const TYPEOF_HELPER_CLASS: &str = "_typeof_fn";
pub const TYPEOF_HELPER_METHOD: &str = "_typeof";
pub const UNDEFINED_FIELD: &str = "_undefined";
pub const DELETE_DYNAMIC_VALUE: &str = "__DeleteDynamicValue";
/// Method a collection initializer calls once per element.
pub const COLLECTION_ADD: &str = "Add";

/// Host-language builtin types.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinTypes {
    pub dynamic: TypeId,
    pub object: TypeId,
    pub string: TypeId,
    pub boolean: TypeId,
    pub int: TypeId,
    pub uint: TypeId,
    pub number: TypeId,
    pub void: TypeId,
    pub null: TypeId,
}

/// Well-known runtime types the dynamic extensions rewrite against.
#[derive(Debug, Clone, Copy)]
pub struct PredefinedTypes {
    /// Default sequence type for array initializers.
    pub array: TypeId,
    /// Generic definition `Vector.<T>`.
    pub vector: TypeId,
    /// Default map type for object initializers.
    pub expando: TypeId,
    pub regexp: TypeId,
    pub xml: TypeId,
    pub undefined: TypeId,
    /// Capability interface carrying `__DeleteDynamicValue`.
    pub dynamic_class: TypeId,
    /// Non-generic dictionary capability.
    pub dictionary: TypeId,
    /// Generic definition `IDictionary.<K, V>`.
    pub dictionary_generic: TypeId,
    pub typeof_helper: TypeId,
}

/// Describes a class or interface to add to the registry.
#[derive(Debug, Clone, Default)]
pub struct ClassDecl {
    pub name: String,
    pub namespace: String,
    pub flags: TypeFlags,
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub members: Vec<Member>,
    pub arity: u32,
}

impl ClassDecl {
    pub fn class(name: &str) -> Self {
        Self { name: name.to_string(), flags: TypeFlags::CLASS, ..Self::default() }
    }

    pub fn interface(name: &str) -> Self {
        Self { name: name.to_string(), flags: TypeFlags::INTERFACE, ..Self::default() }
    }

    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// Instances accept runtime key-based get/set/delete.
    pub fn dynamic(mut self) -> Self {
        self.flags |= TypeFlags::DYNAMIC_CLASS;
        self
    }

    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn generic(mut self, arity: u32) -> Self {
        self.arity = arity;
        self.flags |= TypeFlags::GENERIC_DEFINITION;
        self
    }

    pub fn extends(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    pub fn implements(mut self, iface: TypeId) -> Self {
        self.interfaces.push(iface);
        self
    }

    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }
}

pub struct TypeRegistry {
    table: RwLock<TypeTable>,
    interner: NameInterner,
    /// `(name, arity)` to type, for both qualified and simple names.
    names: DashMap<(InternedName, u32), TypeId, FxBuildHasher>,
    generics: DashMap<(TypeId, Vec<TypeId>), TypeId, FxBuildHasher>,
    arrays: DashMap<(TypeId, u32), TypeId, FxBuildHasher>,
    type_params: Vec<TypeId>,
    builtins: BuiltinTypes,
    predefined: PredefinedTypes,
    root_namespace: String,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::with_root_namespace(DEFAULT_ROOT_NAMESPACE)
    }

    /// Build a registry whose `typeof` helper lives under `root_namespace`.
    pub fn with_root_namespace(root_namespace: &str) -> Self {
        let placeholder = TypeId::INVALID;
        let mut registry = Self {
            table: RwLock::new(TypeTable::new()),
            interner: NameInterner::new(),
            names: DashMap::with_hasher(FxBuildHasher),
            generics: DashMap::with_hasher(FxBuildHasher),
            arrays: DashMap::with_hasher(FxBuildHasher),
            type_params: Vec::new(),
            builtins: BuiltinTypes {
                dynamic: placeholder,
                object: placeholder,
                string: placeholder,
                boolean: placeholder,
                int: placeholder,
                uint: placeholder,
                number: placeholder,
                void: placeholder,
                null: placeholder,
            },
            predefined: PredefinedTypes {
                array: placeholder,
                vector: placeholder,
                expando: placeholder,
                regexp: placeholder,
                xml: placeholder,
                undefined: placeholder,
                dynamic_class: placeholder,
                dictionary: placeholder,
                dictionary_generic: placeholder,
                typeof_helper: placeholder,
            },
            root_namespace: root_namespace.to_string(),
        };
        registry.bootstrap();
        registry
    }

    fn bootstrap(&mut self) {
        let b = BuiltinTypes {
            dynamic: self.add_builtin("*", TypeFlags::DYNAMIC),
            object: self.declare_class(ClassDecl::class("Object")),
            string: self.declare_class(ClassDecl::class("String").with_flags(TypeFlags::PRIMITIVE)),
            boolean: self.add_builtin("Boolean", TypeFlags::PRIMITIVE),
            int: self.add_builtin("int", TypeFlags::PRIMITIVE),
            uint: self.add_builtin("uint", TypeFlags::PRIMITIVE),
            number: self.add_builtin("Number", TypeFlags::PRIMITIVE),
            void: self.add_builtin("void", TypeFlags::VOID),
            null: self.add_builtin("null", TypeFlags::NULL),
        };
        self.builtins = b;
        self.add_members(b.object, vec![Member::method("toString", &[], b.string)]);
        self.add_members(b.string, vec![Member::field("length", b.int)]);

        self.type_params = (0..2u32)
            .map(|index| {
                self.table.write().add_type(
                    TypeFlags::TYPE_PARAMETER,
                    &format!("T{index}"),
                    "",
                    TypeKind::TypeParameter { index },
                )
            })
            .collect();
        let (t0, t1) = (self.type_params[0], self.type_params[1]);

        let dictionary = self.declare_class(
            ClassDecl::interface("IDictionary")
                .in_namespace(COLLECTIONS_NAMESPACE)
                .member(Member::method("Contains", &[b.object], b.boolean)),
        );
        let dictionary_generic = self.declare_class(
            ClassDecl::interface("IDictionary")
                .in_namespace(GENERIC_COLLECTIONS_NAMESPACE)
                .generic(2)
                .implements(dictionary)
                .member(Member::method("ContainsKey", &[t0], b.boolean))
                .member(Member::method("Remove", &[t0], b.boolean))
                .member(Member::indexer(t0, t1)),
        );
        let dynamic_class = self.declare_class(
            ClassDecl::interface("IDynamicClass")
                .in_namespace(RUNTIME_NAMESPACE)
                .member(Member::method(DELETE_DYNAMIC_VALUE, &[b.object], b.boolean))
                .member(Member::method("__HasDynamicValue", &[b.string], b.boolean))
                .member(Member::method("__GetDynamicValue", &[b.string], b.dynamic)),
        );
        let array = self.declare_class(
            ClassDecl::class("Array")
                .in_namespace(RUNTIME_NAMESPACE)
                .dynamic()
                .implements(dynamic_class)
                .member(Member::field("length", b.int))
                .member(Member::method("Contains", &[b.dynamic], b.boolean))
                .member(Member::method("push", &[b.dynamic], b.uint))
                .member(Member::method(COLLECTION_ADD, &[b.dynamic], b.void))
                .member(Member::indexer(b.int, b.dynamic)),
        );
        let vector = self.declare_class(
            ClassDecl::class("Vector")
                .in_namespace(RUNTIME_NAMESPACE)
                .generic(1)
                .member(Member::field("length", b.int))
                .member(Member::method("Contains", &[t0], b.boolean))
                .member(Member::method("push", &[t0], b.uint))
                .member(Member::method(COLLECTION_ADD, &[t0], b.void))
                .member(Member::indexer(b.int, t0)),
        );
        let string_object_dictionary = self.make_generic(dictionary_generic, &[b.string, b.object]);
        let expando = self.declare_class(
            ClassDecl::class("Expando")
                .in_namespace(RUNTIME_NAMESPACE)
                .dynamic()
                .implements(dynamic_class)
                .implements(string_object_dictionary)
                .member(Member::method("ContainsKey", &[b.string], b.boolean))
                .member(Member::indexer(b.string, b.dynamic)),
        );
        let regexp = self.declare_class(
            ClassDecl::class("RegExp")
                .in_namespace(RUNTIME_NAMESPACE)
                .member(Member::field("source", b.string))
                .member(Member::method("test", &[b.string], b.boolean)),
        );
        let xml = self.declare_class(
            ClassDecl::class("XML")
                .in_namespace(RUNTIME_NAMESPACE)
                .member(Member::method("toXMLString", &[], b.string)),
        );
        let undefined = self.declare_class(ClassDecl::class("Undefined").in_namespace(RUNTIME_NAMESPACE));
        self.add_members(undefined, vec![Member::static_field(UNDEFINED_FIELD, undefined)]);
        let root = self.root_namespace.clone();
        let typeof_helper = self.declare_class(
            ClassDecl::class(TYPEOF_HELPER_CLASS)
                .in_namespace(&root)
                .with_flags(TypeFlags::STATIC_CLASS)
                .member(Member::static_method(TYPEOF_HELPER_METHOD, &[b.object], b.string)),
        );

        self.predefined = PredefinedTypes {
            array,
            vector,
            expando,
            regexp,
            xml,
            undefined,
            dynamic_class,
            dictionary,
            dictionary_generic,
            typeof_helper,
        };
    }

    fn add_builtin(&self, name: &str, flags: TypeFlags) -> TypeId {
        let id = self.table.write().add_type(flags, name, "", TypeKind::Builtin);
        self.register_name(name, 0, id);
        id
    }

    fn register_name(&self, name: &str, arity: u32, id: TypeId) {
        let key = (self.interner.intern(name), arity);
        self.names.entry(key).or_insert(id);
    }

    /// Add a class or interface and make it visible by simple and qualified name.
    pub fn declare_class(&self, decl: ClassDecl) -> TypeId {
        let class = ClassType {
            base: decl.base,
            interfaces: decl.interfaces,
            members: decl.members.into_iter().map(|m| (m.name.clone(), m)).collect(),
            arity: decl.arity,
        };
        let id = self
            .table
            .write()
            .add_type(decl.flags, &decl.name, &decl.namespace, TypeKind::Class(class));
        if !decl.namespace.is_empty() {
            self.register_name(&format!("{}.{}", decl.namespace, decl.name), decl.arity, id);
        }
        self.register_name(&decl.name, decl.arity, id);
        tracing::trace!(name = %decl.name, namespace = %decl.namespace, ?id, "declared type");
        id
    }

    /// Append members to a class declared earlier.
    pub fn add_members(&self, id: TypeId, members: Vec<Member>) {
        let mut table = self.table.write();
        if let Some(class) = table.class_mut(id) {
            for m in members {
                class.members.insert(m.name.clone(), m);
            }
        }
    }

    pub fn builtins(&self) -> &BuiltinTypes {
        &self.builtins
    }

    pub fn predefined(&self) -> &PredefinedTypes {
        &self.predefined
    }

    pub fn root_namespace(&self) -> &str {
        &self.root_namespace
    }

    /// The `index`th shared type parameter, for declaring generic signatures.
    pub fn type_param(&self, index: usize) -> Option<TypeId> {
        self.type_params.get(index).copied()
    }

    /// Find a type by simple or dotted name and generic arity.
    pub fn lookup(&self, name: &str, arity: u32) -> Option<TypeId> {
        let key = (self.interner.get(name)?, arity);
        self.names.get(&key).map(|id| *id)
    }

    /// `definition.<args>`, memoized: equal requests yield the same handle.
    pub fn make_generic(&self, definition: TypeId, args: &[TypeId]) -> TypeId {
        let key = (definition, args.to_vec());
        if let Some(id) = self.generics.get(&key) {
            return *id;
        }
        match self.generics.entry(key) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let mut table = self.table.write();
                let def = table.get(definition);
                let flags = (def.flags - TypeFlags::GENERIC_DEFINITION) | TypeFlags::GENERIC_INSTANCE;
                let (name, namespace) = (def.name.clone(), def.namespace.clone());
                let id = table.add_type(
                    flags,
                    &name,
                    &namespace,
                    TypeKind::GenericInstance { definition, args: args.to_vec() },
                );
                e.insert(id);
                id
            }
        }
    }

    /// A native array of `element` with `rank` dimensions, memoized.
    pub fn make_array(&self, element: TypeId, rank: u32) -> TypeId {
        let key = (element, rank);
        if let Some(id) = self.arrays.get(&key) {
            return *id;
        }
        match self.arrays.entry(key) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let mut table = self.table.write();
                let id = table.add_type(TypeFlags::ARRAY, "", "", TypeKind::Array { element, rank });
                e.insert(id);
                id
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn flags(&self, id: TypeId) -> TypeFlags {
        self.table.read().get(id).flags
    }

    pub fn is_dynamic(&self, id: TypeId) -> bool {
        self.flags(id).contains(TypeFlags::DYNAMIC)
    }

    pub fn is_array(&self, id: TypeId) -> bool {
        self.flags(id).contains(TypeFlags::ARRAY)
    }

    pub fn is_dynamic_class(&self, id: TypeId) -> bool {
        self.flags(id).contains(TypeFlags::DYNAMIC_CLASS)
    }

    /// Whether values of `id` accept runtime key-based access.
    pub fn is_dynamic_capable(&self, id: TypeId) -> bool {
        self.flags(id).intersects(TypeFlags::DYNAMIC | TypeFlags::DYNAMIC_CLASS)
    }

    /// Element type and rank of a native array type.
    pub fn array_element(&self, id: TypeId) -> Option<(TypeId, u32)> {
        match self.table.read().get(id).kind {
            TypeKind::Array { element, rank } => Some((element, rank)),
            _ => None,
        }
    }

    /// Whether `ty` is `iface` or implements it, directly or through bases,
    /// inherited interfaces, or its generic definition.
    pub fn implements(&self, ty: TypeId, iface: TypeId) -> bool {
        let table = self.table.read();
        implements_in(&table, ty, iface)
    }

    /// Look up a member on `ty`, searching bases and interfaces. Members of a
    /// generic instance come back with type parameters substituted. Returns
    /// the type that declares the member (the instance, for generics).
    pub fn find_member(&self, ty: TypeId, name: &str) -> Option<(TypeId, Member)> {
        let table = self.table.read();
        find_member_in(&table, ty, name)
    }

    /// Display name used in diagnostics and generated text.
    pub fn type_name(&self, id: TypeId) -> String {
        let table = self.table.read();
        type_name_in(&table, id)
    }

    pub fn type_count(&self) -> usize {
        self.table.read().len()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_count())
            .field("root_namespace", &self.root_namespace)
            .finish()
    }
}

fn implements_in(table: &TypeTable, ty: TypeId, iface: TypeId) -> bool {
    if ty == iface {
        return true;
    }
    match &table.get(ty).kind {
        TypeKind::Class(c) => {
            c.interfaces.iter().any(|&i| implements_in(table, i, iface))
                || c.base.is_some_and(|b| implements_in(table, b, iface))
        }
        TypeKind::GenericInstance { definition, .. } => implements_in(table, *definition, iface),
        _ => false,
    }
}

fn find_member_in(table: &TypeTable, ty: TypeId, name: &str) -> Option<(TypeId, Member)> {
    match &table.get(ty).kind {
        TypeKind::Class(c) => {
            if let Some(m) = c.members.get(name) {
                return Some((ty, m.clone()));
            }
            c.base
                .into_iter()
                .chain(c.interfaces.iter().copied())
                .find_map(|t| find_member_in(table, t, name))
        }
        TypeKind::GenericInstance { definition, args } => {
            let (_, member) = find_member_in(table, *definition, name)?;
            let substituted = member.map_types(|t| match table.get(t).kind {
                TypeKind::TypeParameter { index } => args.get(index as usize).copied().unwrap_or(t),
                _ => t,
            });
            Some((ty, substituted))
        }
        _ => None,
    }
}

fn type_name_in(table: &TypeTable, id: TypeId) -> String {
    if id == TypeId::INVALID {
        return "<error>".to_string();
    }
    let ty = table.get(id);
    match &ty.kind {
        TypeKind::Array { element, rank } => {
            let commas = ",".repeat(rank.saturating_sub(1) as usize);
            format!("{}[{}]", type_name_in(table, *element), commas)
        }
        TypeKind::GenericInstance { args, .. } => {
            let args: Vec<String> = args.iter().map(|a| type_name_in(table, *a)).collect();
            format!("{}.<{}>", ty.name, args.join(", "))
        }
        _ => ty.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_simple_and_qualified() {
        let reg = TypeRegistry::new();
        let p = *reg.predefined();
        assert_eq!(reg.lookup("Array", 0), Some(p.array));
        assert_eq!(reg.lookup("pscript.Array", 0), Some(p.array));
        assert_eq!(reg.lookup("Vector", 1), Some(p.vector));
        assert_eq!(reg.lookup("Vector", 0), None);
        assert_eq!(reg.lookup("_root._typeof_fn", 0), Some(p.typeof_helper));
        assert_eq!(reg.lookup("NoSuchType", 0), None);
    }

    #[test]
    fn test_generic_and_dictionary_arity_are_distinct() {
        let reg = TypeRegistry::new();
        let p = *reg.predefined();
        assert_eq!(reg.lookup("IDictionary", 0), Some(p.dictionary));
        assert_eq!(reg.lookup("IDictionary", 2), Some(p.dictionary_generic));
    }

    #[test]
    fn test_make_generic_is_memoized() {
        let reg = TypeRegistry::new();
        let b = *reg.builtins();
        let p = *reg.predefined();
        let a = reg.make_generic(p.vector, &[b.int]);
        let c = reg.make_generic(p.vector, &[b.int]);
        let d = reg.make_generic(p.vector, &[b.string]);
        assert_eq!(a, c);
        assert_ne!(a, d);
        assert_eq!(reg.type_name(a), "Vector.<int>");
    }

    #[test]
    fn test_make_array() {
        let reg = TypeRegistry::new();
        let int = reg.builtins().int;
        let arr = reg.make_array(int, 2);
        assert_eq!(arr, reg.make_array(int, 2));
        assert!(reg.is_array(arr));
        assert_eq!(reg.array_element(arr), Some((int, 2)));
        assert_eq!(reg.type_name(arr), "int[,]");
    }

    #[test]
    fn test_implements_through_generic_definition() {
        let reg = TypeRegistry::new();
        let p = *reg.predefined();
        assert!(reg.implements(p.expando, p.dictionary));
        assert!(reg.implements(p.expando, p.dynamic_class));
        assert!(!reg.implements(p.array, p.dictionary));
    }

    #[test]
    fn test_find_member_substitutes_type_arguments() {
        let reg = TypeRegistry::new();
        let b = *reg.builtins();
        let p = *reg.predefined();
        let dict = reg.make_generic(p.dictionary_generic, &[b.string, b.object]);
        let (owner, member) = reg.find_member(dict, "ContainsKey").unwrap();
        assert_eq!(owner, dict);
        assert_eq!(member.kind, MemberKind::Method { params: vec![b.string], ret: b.boolean });

        let vec_int = reg.make_generic(p.vector, &[b.int]);
        let (_, idx) = reg.find_member(vec_int, INDEXER_NAME).unwrap();
        assert_eq!(idx.value_type(), b.int);
    }

    #[test]
    fn test_user_generic_class_substitutes_shared_parameter() {
        let reg = TypeRegistry::new();
        let int = reg.builtins().int;
        let t0 = reg.type_param(0).unwrap();
        let boxed = reg.declare_class(ClassDecl::class("Box").generic(1).member(Member::field("value", t0)));
        let box_int = reg.make_generic(boxed, &[int]);
        let (owner, value) = reg.find_member(box_int, "value").unwrap();
        assert_eq!(owner, box_int);
        assert_eq!(value.kind, MemberKind::Field { ty: int });
        assert_eq!(reg.type_param(2), None);
    }

    #[test]
    fn test_find_member_through_interfaces() {
        let reg = TypeRegistry::new();
        let p = *reg.predefined();
        let (owner, _) = reg.find_member(p.array, DELETE_DYNAMIC_VALUE).unwrap();
        assert_eq!(owner, p.dynamic_class);
    }

    #[test]
    fn test_custom_root_namespace() {
        let reg = TypeRegistry::with_root_namespace("_top");
        assert!(reg.lookup("_top._typeof_fn", 0).is_some());
        assert!(reg.lookup("_root._typeof_fn", 0).is_none());
    }

    #[test]
    fn test_dynamic_flags() {
        let reg = TypeRegistry::new();
        let b = *reg.builtins();
        let p = *reg.predefined();
        assert!(reg.is_dynamic(b.dynamic));
        assert!(reg.is_dynamic_class(p.expando));
        assert!(reg.is_dynamic_capable(p.array));
        assert!(!reg.is_dynamic_capable(p.regexp));
    }
}
