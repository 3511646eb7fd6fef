//! NamespaceStore - the class table of one compilation unit.
//!
//! [`NamespaceStore`] owns every [`ClassType`] by [`TypeHash`] and keeps
//! two kinds of name index on top:
//!
//! - the **user table**: top-level user classes, addressed with no prefix
//! - **namespaces**: `namespace -> ClassMap`, one of which ([`SYSTEM_NAMESPACE`])
//!   holds the platform classes and one ([`SCHEMA_NAMESPACE`]) the schema objects
//!
//! Inner classes are not indexed by name here; they are reached through the
//! `inner_classes` table of their outer class.
//!
//! # Phases
//!
//! The store is written in a single-writer phase (module installation, then
//! registration of user classes) and is read-only afterwards. Type
//! resolution fills `TypeRef` slots through shared references, so it runs
//! against `&NamespaceStore`. [`NamespaceStore::seal`] ends the write phase:
//! any later registration fails with [`RegistrationError::Sealed`].
//!
//! # Example
//!
//! ```
//! use apex_registry::{ClassKind, ClassType, NamespaceStore};
//!
//! let mut store = NamespaceStore::new();
//! let hash = store.register_class(ClassType::new("Account", ClassKind::Class)).unwrap();
//! assert_eq!(store.lookup_user("ACCOUNT"), Some(hash));
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use apex_ast::TriggerEvent;
use apex_core::{DataType, IdentMap, RegistrationError, TypeHash, builtins};

use crate::class_type::{ClassType, Field, Method, MethodKind, MethodRef};
use crate::trigger::Trigger;

/// Namespace holding the platform classes.
pub const SYSTEM_NAMESPACE: &str = "System";

/// Namespace holding classes loaded from schema metadata.
pub const SCHEMA_NAMESPACE: &str = "Schema";

/// Case-insensitive class name to identity.
pub type ClassMap = IdentMap<TypeHash>;

/// Class table plus namespace indexes.
#[derive(Debug, Clone, Default)]
pub struct NamespaceStore {
    /// Every class, including inner classes, by identity.
    classes: FxHashMap<TypeHash, ClassType>,
    /// Registration order, for deterministic iteration.
    order: Vec<TypeHash>,
    /// Top-level user classes.
    user: ClassMap,
    /// Namespace name to its classes.
    namespaces: IdentMap<ClassMap>,
    triggers: IdentMap<Trigger>,
    sealed: bool,
}

impl NamespaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Namespaces
    // ==========================================================================

    /// Replace the class map of `namespace`.
    pub fn set(&mut self, namespace: &str, classes: ClassMap) {
        self.namespaces.insert(namespace, classes);
    }

    /// Class map of `namespace`, if it exists.
    pub fn get(&self, namespace: &str) -> Option<&ClassMap> {
        self.namespaces.get(namespace)
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    /// Top-level user classes.
    pub fn user_classes(&self) -> &ClassMap {
        &self.user
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Add a class.
    ///
    /// Top-level classes are indexed by simple name in the user table, or in
    /// their namespace when they have one. Every member is stamped with the
    /// class as its owner.
    pub fn register_class(&mut self, mut class: ClassType) -> Result<TypeHash, RegistrationError> {
        if self.sealed {
            return Err(RegistrationError::Sealed {
                name: class.qualified_name,
            });
        }
        let hash = class.type_hash;
        if self.classes.contains_key(&hash) {
            return Err(RegistrationError::DuplicateClass {
                name: class.qualified_name,
                location: class.location,
            });
        }

        class.stamp_owner();
        if class.outer.is_none() {
            let table = match &class.namespace {
                Some(ns) => self.namespaces.entry_or_default(ns),
                None => &mut self.user,
            };
            table.insert(class.name.clone(), hash);
        }

        debug!(class = %class.qualified_name, kind = ?class.kind, "registered class");
        self.classes.insert(hash, class);
        self.order.push(hash);
        Ok(hash)
    }

    pub fn register_trigger(&mut self, trigger: Trigger) -> Result<(), RegistrationError> {
        if self.sealed {
            return Err(RegistrationError::Sealed { name: trigger.name });
        }
        if self.triggers.contains(&trigger.name) {
            return Err(RegistrationError::DuplicateTrigger {
                name: trigger.name,
                location: trigger.location,
            });
        }
        debug!(trigger = %trigger.name, object = %trigger.object, "registered trigger");
        self.triggers.insert(trigger.name.clone(), trigger);
        Ok(())
    }

    /// End the write phase.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    #[inline]
    pub fn class(&self, hash: TypeHash) -> Option<&ClassType> {
        self.classes.get(&hash)
    }

    /// Mutable access during the write phase.
    pub fn class_mut(&mut self, hash: TypeHash) -> Option<&mut ClassType> {
        if self.sealed {
            return None;
        }
        self.classes.get_mut(&hash)
    }

    /// Every class in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassType> {
        self.order.iter().filter_map(|h| self.classes.get(h))
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn lookup_user(&self, name: &str) -> Option<TypeHash> {
        self.user.get(name).copied()
    }

    pub fn lookup_namespace(&self, namespace: &str, name: &str) -> Option<TypeHash> {
        self.namespaces.get(namespace)?.get(name).copied()
    }

    /// Inner class `name` of `outer`.
    pub fn lookup_inner(&self, outer: TypeHash, name: &str) -> Option<TypeHash> {
        self.class(outer)?.inner_classes.get(name).copied()
    }

    /// Non-generic descriptor of a registered class.
    pub fn data_type(&self, hash: TypeHash) -> Option<DataType> {
        self.class(hash).map(ClassType::data_type)
    }

    pub fn trigger(&self, name: &str) -> Option<&Trigger> {
        self.triggers.get(name)
    }

    pub fn triggers(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.values()
    }

    /// Triggers on `object` that fire for `event`, in registration order.
    pub fn triggers_for(
        &self,
        object: TypeHash,
        event: TriggerEvent,
    ) -> impl Iterator<Item = &Trigger> {
        self.triggers
            .values()
            .filter(move |t| t.object_type() == Some(object) && t.fires_on(event))
    }

    // ==========================================================================
    // Hierarchy
    // ==========================================================================

    pub fn superclass(&self, hash: TypeHash) -> Option<TypeHash> {
        self.class(hash)?.superclass()
    }

    /// `hash` followed by its superclasses, nearest first.
    ///
    /// Stops at the first repeated class, so a cyclic hierarchy terminates.
    pub fn super_chain(&self, hash: TypeHash) -> Vec<TypeHash> {
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = Some(hash);
        while let Some(h) = current
            && seen.insert(h)
        {
            chain.push(h);
            current = self.superclass(h);
        }
        chain
    }

    /// The super chain followed by every reachable interface, breadth-first.
    pub fn ancestors(&self, hash: TypeHash) -> Vec<TypeHash> {
        let mut out = self.super_chain(hash);
        let mut seen: FxHashSet<TypeHash> = out.iter().copied().collect();
        let mut i = 0;
        while i < out.len() {
            if let Some(class) = self.class(out[i]) {
                for iface in class.interfaces() {
                    if seen.insert(iface) {
                        out.push(iface);
                    }
                }
            }
            i += 1;
        }
        out
    }

    /// Whether `ancestor` is a proper superclass or implemented interface of `child`.
    pub fn is_subclass_of(&self, child: TypeHash, ancestor: TypeHash) -> bool {
        child != ancestor && self.ancestors(child).contains(&ancestor)
    }

    /// Whether a value of type `from` may be used where `to` is expected.
    ///
    /// Accepts `null`, anything into `Object`, `Integer` into `Double`,
    /// subclasses and implemented interfaces, and generic instantiations of
    /// the same base whose arguments are pairwise assignable. An unbound
    /// generic target accepts any instantiation of its base.
    pub fn is_assignable(&self, from: &DataType, to: &DataType) -> bool {
        if from == to || from.is_null() || to.is(builtins::OBJECT) {
            return true;
        }
        if from.is(builtins::INTEGER) && to.is(builtins::DOUBLE) {
            return true;
        }
        if from.base == to.base {
            return !to.is_generic()
                || (from.type_args.len() == to.type_args.len()
                    && from
                        .type_args
                        .iter()
                        .zip(&to.type_args)
                        .all(|(f, t)| self.is_assignable(f, t)));
        }
        !to.is_generic() && self.is_subclass_of(from.base, to.base)
    }

    // ==========================================================================
    // Members
    // ==========================================================================

    /// Field `name` on `hash` or the nearest superclass declaring it.
    pub fn find_field(&self, hash: TypeHash, name: &str) -> Option<&Field> {
        self.super_chain(hash)
            .into_iter()
            .find_map(|h| self.class(h)?.field(name))
    }

    pub fn method(&self, method: &MethodRef) -> Option<&Method> {
        self.class(method.owner)?
            .methods(&method.name, method.kind)
            .get(method.index)
    }

    /// Every overload of `name` visible on `hash`, nearest declaration first.
    ///
    /// A method whose signature is already provided by a nearer class is
    /// shadowed and left out. Constructors are never inherited.
    pub fn method_candidates(
        &self,
        hash: TypeHash,
        name: &str,
        kind: MethodKind,
    ) -> Vec<MethodRef> {
        if kind == MethodKind::Constructor {
            return self
                .class(hash)
                .map(|c| {
                    (0..c.constructors.len())
                        .map(|i| MethodRef::constructor(hash, i))
                        .collect()
                })
                .unwrap_or_default();
        }

        let mut found: Vec<(MethodRef, &Method)> = Vec::new();
        for owner in self.ancestors(hash) {
            let Some(class) = self.class(owner) else {
                continue;
            };
            for (index, method) in class.methods(name, kind).iter().enumerate() {
                if found.iter().any(|(_, m)| m.same_signature(method)) {
                    continue;
                }
                found.push((MethodRef::new(owner, kind, name, index), method));
            }
        }
        found.into_iter().map(|(r, _)| r).collect()
    }

    /// The callable implementation of `target` for a receiver of class `runtime`.
    ///
    /// Walks the runtime class's super chain for an instance method with the
    /// same signature and a body. Falls back to `target` itself.
    pub fn dispatch(&self, runtime: TypeHash, target: &MethodRef) -> MethodRef {
        let Some(declared) = self.method(target) else {
            return target.clone();
        };
        if target.kind != MethodKind::Instance || runtime == target.owner {
            return target.clone();
        }
        for owner in self.super_chain(runtime) {
            let Some(class) = self.class(owner) else {
                continue;
            };
            let overloads = class.methods(&target.name, MethodKind::Instance);
            if let Some(index) = overloads
                .iter()
                .position(|m| m.is_callable() && m.same_signature(declared))
            {
                return MethodRef::new(owner, MethodKind::Instance, &target.name, index);
            }
        }
        target.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_type::ClassKind;
    use apex_core::{Location, Modifiers, TypeRef};
    use pretty_assertions::assert_eq;

    fn class_ref(class: &ClassType) -> TypeRef {
        TypeRef::resolved_to(class.data_type())
    }

    fn method(name: &str, params: &[DataType]) -> Method {
        let params = params
            .iter()
            .enumerate()
            .map(|(i, t)| crate::Parameter::typed(format!("a{i}"), t.clone()))
            .collect();
        Method::new(name, TypeRef::resolved_to(DataType::void()))
            .with_modifiers(Modifiers::PUBLIC)
            .with_params(params)
            .with_body(apex_ast::build::block(vec![]))
    }

    #[test]
    fn user_lookup_is_case_insensitive() {
        let mut store = NamespaceStore::new();
        let hash = store
            .register_class(ClassType::new("Account", ClassKind::Class))
            .unwrap();
        assert_eq!(store.lookup_user("account"), Some(hash));
        assert_eq!(store.lookup_user("ACCOUNT"), Some(hash));
        assert_eq!(store.class(hash).unwrap().name, "Account");
    }

    #[test]
    fn namespaced_classes_are_indexed_by_namespace() {
        let mut store = NamespaceStore::new();
        let hash = store
            .register_class(ClassType::in_namespace(SYSTEM_NAMESPACE, "Math", ClassKind::Class))
            .unwrap();
        assert_eq!(store.lookup_namespace("system", "MATH"), Some(hash));
        assert_eq!(store.lookup_user("Math"), None);
        assert!(store.get("System").is_some());
        assert!(store.get("Nope").is_none());
    }

    #[test]
    fn set_replaces_namespace_map() {
        let mut store = NamespaceStore::new();
        let mut map = ClassMap::new();
        map.insert("Thing", TypeHash::from_name("ext.thing"));
        store.set("Ext", map);
        assert_eq!(
            store.lookup_namespace("ext", "thing"),
            Some(TypeHash::from_name("ext.thing"))
        );
    }

    #[test]
    fn duplicate_class_is_rejected() {
        let mut store = NamespaceStore::new();
        store.register_class(ClassType::new("A", ClassKind::Class)).unwrap();
        let mut dup = ClassType::new("a", ClassKind::Class);
        dup.location = Location::new("a.cls", 3, 1);
        let err = store.register_class(dup).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateClass { .. }));
    }

    #[test]
    fn sealed_store_rejects_registration() {
        let mut store = NamespaceStore::new();
        store.seal();
        assert!(store.is_sealed());
        let err = store.register_class(ClassType::new("A", ClassKind::Class)).unwrap_err();
        assert_eq!(err, RegistrationError::Sealed { name: "A".into() });
        assert!(store.class_mut(TypeHash::from_name("a")).is_none());
    }

    #[test]
    fn inner_classes_are_not_indexed_by_name() {
        let mut store = NamespaceStore::new();
        let mut outer = ClassType::new("Outer", ClassKind::Class);
        let inner = ClassType::nested(&outer, "Inner", ClassKind::Class);
        outer.inner_classes.insert("Inner", inner.type_hash);
        let outer_hash = store.register_class(outer).unwrap();
        let inner_hash = store.register_class(inner).unwrap();
        assert_eq!(store.lookup_user("Inner"), None);
        assert_eq!(store.lookup_inner(outer_hash, "INNER"), Some(inner_hash));
    }

    #[test]
    fn assignability_follows_hierarchy() {
        let mut store = NamespaceStore::new();
        let iface = ClassType::new("Shape", ClassKind::Interface);
        let base = ClassType::new("Base", ClassKind::Class).with_interface(class_ref(&iface));
        let child = ClassType::new("Child", ClassKind::Class).with_super(class_ref(&base));
        let (iface_ty, base_ty, child_ty) =
            (iface.data_type(), base.data_type(), child.data_type());
        store.register_class(iface).unwrap();
        store.register_class(base).unwrap();
        store.register_class(child).unwrap();

        assert!(store.is_assignable(&child_ty, &base_ty));
        assert!(store.is_assignable(&child_ty, &iface_ty));
        assert!(!store.is_assignable(&base_ty, &child_ty));
        assert!(store.is_assignable(&DataType::null(), &child_ty));
        assert!(store.is_assignable(&DataType::integer(), &DataType::double()));
        assert!(!store.is_assignable(&DataType::double(), &DataType::integer()));
        assert!(store.is_assignable(&DataType::string(), &DataType::object()));
        assert!(store.is_assignable(
            &DataType::list_of(child_ty.clone()),
            &DataType::list_of(base_ty.clone())
        ));
        assert!(!store.is_assignable(
            &DataType::list_of(DataType::string()),
            &DataType::list_of(DataType::integer())
        ));
        assert_eq!(
            store.ancestors(child_ty.base),
            vec![child_ty.base, base_ty.base, iface_ty.base]
        );
    }

    #[test]
    fn super_chain_terminates_on_cycles() {
        let mut store = NamespaceStore::new();
        let a = ClassType::new("A", ClassKind::Class)
            .with_super(TypeRef::resolved_to(DataType::simple(TypeHash::from_name("b"), "B")));
        let b = ClassType::new("B", ClassKind::Class).with_super(class_ref(&a));
        let a_hash = store.register_class(a).unwrap();
        store.register_class(b).unwrap();
        assert_eq!(store.super_chain(a_hash).len(), 2);
    }

    #[test]
    fn candidates_skip_shadowed_overloads() {
        let mut store = NamespaceStore::new();
        let base = ClassType::new("Base", ClassKind::Class)
            .with_method(method("run", &[DataType::integer()]))
            .with_method(method("run", &[DataType::string()]));
        let child = ClassType::new("Child", ClassKind::Class)
            .with_super(class_ref(&base))
            .with_method(method("Run", &[DataType::integer()]));
        let base_hash = store.register_class(base).unwrap();
        let child_hash = store.register_class(child).unwrap();

        let found = store.method_candidates(child_hash, "RUN", MethodKind::Instance);
        let owners: Vec<_> = found.iter().map(|r| r.owner).collect();
        assert_eq!(owners, vec![child_hash, base_hash]);
        assert_eq!(store.method(&found[1]).unwrap().param_types(), vec![DataType::string()]);
    }

    #[test]
    fn dispatch_finds_nearest_override() {
        let mut store = NamespaceStore::new();
        let base = ClassType::new("Base", ClassKind::Class).with_method(method("speak", &[]));
        let child = ClassType::new("Child", ClassKind::Class)
            .with_super(class_ref(&base))
            .with_method(method("speak", &[]));
        let grandchild =
            ClassType::new("GrandChild", ClassKind::Class).with_super(class_ref(&child));
        let base_hash = store.register_class(base).unwrap();
        let child_hash = store.register_class(child).unwrap();
        let grand_hash = store.register_class(grandchild).unwrap();

        let declared = MethodRef::new(base_hash, MethodKind::Instance, "speak", 0);
        assert_eq!(store.dispatch(grand_hash, &declared).owner, child_hash);
        assert_eq!(store.dispatch(base_hash, &declared).owner, base_hash);
    }

    #[test]
    fn find_field_walks_superclasses() {
        let mut store = NamespaceStore::new();
        let base = ClassType::new("Base", ClassKind::Class)
            .with_field(Field::new("count", TypeRef::resolved_to(DataType::integer())));
        let child = ClassType::new("Child", ClassKind::Class).with_super(class_ref(&base));
        let base_hash = store.register_class(base).unwrap();
        let child_hash = store.register_class(child).unwrap();
        let field = store.find_field(child_hash, "COUNT").unwrap();
        assert_eq!(field.owner, base_hash);
        assert!(store.find_field(child_hash, "missing").is_none());
    }
}
