//! Type resolution for turning [`TypeRef`] mentions into [`DataType`]s.
//!
//! [`TypeResolver`] looks names up in the [`NamespaceStore`] relative to a
//! current class and records the result in the reference's own slot, so a
//! reference is resolved at most once.
//!
//! ## Lookup order
//!
//! - `Name`: inner classes of the current class and each enclosing class,
//!   then user classes, then the `System` namespace, then `Schema`
//! - `A.B`: inner class `B` of class `A` (found as above), else class `B`
//!   of namespace `A`
//! - `A.B.C`: namespace `A`, class `B`, inner class `C`
//!
//! Array dimensions are eliminated first: `T[][]` resolves to
//! `List<List<T>>`. Generic arguments resolve through the same lookup and
//! are checked against the base class's parameter count.
//!
//! ## Example
//!
//! ```
//! use apex_compiler::TypeResolver;
//! use apex_core::{DataType, Location, TypeRef};
//! use apex_registry::{ClassKind, ClassType, NamespaceStore};
//!
//! let mut store = NamespaceStore::new();
//! let hash = store.register_class(ClassType::new("Account", ClassKind::Class)).unwrap();
//!
//! let resolver = TypeResolver::new(&store);
//! let ty = resolver.resolve(&TypeRef::new("account"), &Location::synthetic()).unwrap();
//! assert_eq!(ty.base, hash);
//! ```

use apex_core::{DataType, Location, ResolutionError, TypeHash, TypeRef};
use apex_registry::{NamespaceStore, SCHEMA_NAMESPACE, SYSTEM_NAMESPACE};

/// Resolves type mentions against a namespace store.
#[derive(Clone, Copy)]
pub struct TypeResolver<'a> {
    store: &'a NamespaceStore,
    current: Option<TypeHash>,
}

impl<'a> TypeResolver<'a> {
    /// A resolver with no enclosing class.
    pub fn new(store: &'a NamespaceStore) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Resolve relative to `class`, so its inner classes are visible by simple name.
    pub fn within(mut self, class: Option<TypeHash>) -> Self {
        self.current = class;
        self
    }

    /// Resolve `type_ref`, recording the result in its slot.
    ///
    /// `at` is reported when the reference itself carries no position.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve(&self, type_ref: &TypeRef, at: &Location) -> Result<DataType, ResolutionError> {
        if let Some(ty) = type_ref.resolved() {
            return Ok(ty.clone());
        }
        let location = if type_ref.location.is_synthetic() {
            at
        } else {
            &type_ref.location
        };

        let ty = if type_ref.dimensions > 0 {
            DataType::list_of(self.resolve(&type_ref.element(), location)?)
        } else if type_ref.is_void() {
            DataType::void()
        } else {
            self.resolve_named(type_ref, location)?
        };
        type_ref.set_resolved(ty.clone());
        Ok(ty)
    }

    fn resolve_named(
        &self,
        type_ref: &TypeRef,
        location: &Location,
    ) -> Result<DataType, ResolutionError> {
        let not_found = || ResolutionError::TypeNotFound {
            name: type_ref.dotted_name(),
            location: location.clone(),
        };
        let hash = self.lookup(&type_ref.names).ok_or_else(not_found)?;
        let class = self.store.class(hash).ok_or_else(not_found)?;

        if type_ref.type_args.is_empty() {
            return Ok(DataType::simple(hash, class.name.as_str()));
        }
        if type_ref.type_args.len() != class.generic_params.len() {
            return Err(ResolutionError::GenericArity {
                name: class.name.clone(),
                expected: class.generic_params.len(),
                found: type_ref.type_args.len(),
                location: location.clone(),
            });
        }
        let args = type_ref
            .type_args
            .iter()
            .map(|arg| self.resolve(arg, location))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DataType::generic(hash, class.name.as_str(), args))
    }

    /// Class identity for a dotted name, without recording anything.
    pub fn lookup(&self, names: &[String]) -> Option<TypeHash> {
        let (first, rest) = names.split_first()?;
        if let Some(root) = self.lookup_simple(first)
            && let Some(hash) = self.walk_inner(root, rest)
        {
            return Some(hash);
        }
        let (second, rest) = rest.split_first()?;
        let root = self.store.lookup_namespace(first, second)?;
        self.walk_inner(root, rest)
    }

    /// A 1-part class name as seen from the current class.
    pub fn lookup_simple(&self, name: &str) -> Option<TypeHash> {
        let mut scope = self.current;
        while let Some(hash) = scope {
            if let Some(inner) = self.store.lookup_inner(hash, name) {
                return Some(inner);
            }
            scope = self.store.class(hash).and_then(|c| c.outer);
        }
        self.store
            .lookup_user(name)
            .or_else(|| self.store.lookup_namespace(SYSTEM_NAMESPACE, name))
            .or_else(|| self.store.lookup_namespace(SCHEMA_NAMESPACE, name))
    }

    fn walk_inner(&self, root: TypeHash, path: &[String]) -> Option<TypeHash> {
        path.iter()
            .try_fold(root, |hash, name| self.store.lookup_inner(hash, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_ast::build::ty;
    use apex_core::builtins;
    use apex_registry::{ClassKind, ClassType};
    use pretty_assertions::assert_eq;

    fn store() -> NamespaceStore {
        let mut store = NamespaceStore::new();
        let builtins: [(&str, &[&str]); 5] = [
            ("Object", &[]),
            ("Integer", &[]),
            ("String", &[]),
            ("List", &["T"]),
            ("Map", &["K", "V"]),
        ];
        for (name, params) in builtins {
            let class = ClassType::in_namespace(SYSTEM_NAMESPACE, name, ClassKind::Class)
                .with_generic_params(params);
            store.register_class(class).unwrap();
        }

        let mut outer = ClassType::new("Outer", ClassKind::Class);
        let mut inner = ClassType::nested(&outer, "Inner", ClassKind::Class);
        let deeper = ClassType::nested(&inner, "Deeper", ClassKind::Class);
        inner.inner_classes.insert("Deeper", deeper.type_hash);
        outer.inner_classes.insert("Inner", inner.type_hash);
        store.register_class(outer).unwrap();
        store.register_class(inner).unwrap();
        store.register_class(deeper).unwrap();

        store
            .register_class(ClassType::in_namespace("Acme", "Widget", ClassKind::Class))
            .unwrap();
        store
            .register_class(ClassType::in_namespace(
                SCHEMA_NAMESPACE,
                "Account",
                ClassKind::SObject,
            ))
            .unwrap();
        store
    }

    fn resolve(store: &NamespaceStore, text: &str) -> Result<DataType, ResolutionError> {
        TypeResolver::new(store).resolve(&ty(text), &Location::synthetic())
    }

    #[test]
    fn builtins_resolve_through_system() {
        let store = store();
        assert_eq!(resolve(&store, "integer").unwrap(), DataType::integer());
        assert_eq!(resolve(&store, "System.String").unwrap(), DataType::string());
        assert_eq!(resolve(&store, "void").unwrap(), DataType::void());
    }

    #[test]
    fn array_dimensions_become_nested_lists() {
        let store = store();
        assert_eq!(
            resolve(&store, "Integer[][]").unwrap(),
            DataType::list_of(DataType::list_of(DataType::integer()))
        );
        assert_eq!(resolve(&store, "Integer[]").unwrap().list_depth(), 1);
        assert_eq!(resolve(&store, "Integer").unwrap().list_depth(), 0);
    }

    #[test]
    fn generic_arguments_recurse() {
        let store = store();
        let ty = resolve(&store, "Map<String, List<Integer>>").unwrap();
        assert_eq!(
            ty,
            DataType::map_of(DataType::string(), DataType::list_of(DataType::integer()))
        );
    }

    #[test]
    fn generic_arity_is_checked() {
        let store = store();
        assert!(matches!(
            resolve(&store, "List<Integer, String>"),
            Err(ResolutionError::GenericArity { expected: 1, found: 2, .. })
        ));
        assert!(matches!(
            resolve(&store, "Integer<String>"),
            Err(ResolutionError::GenericArity { expected: 0, found: 1, .. })
        ));
    }

    #[test]
    fn qualified_and_inner_names() {
        let store = store();
        let inner = TypeHash::from_name("outer.inner");
        assert_eq!(resolve(&store, "Outer.Inner").unwrap().base, inner);
        assert_eq!(
            resolve(&store, "Outer.Inner.Deeper").unwrap().base,
            TypeHash::from_name("outer.inner.deeper")
        );
        assert_eq!(
            resolve(&store, "Acme.Widget").unwrap().base,
            TypeHash::from_name("acme.widget")
        );
        assert_eq!(
            resolve(&store, "account").unwrap().base,
            TypeHash::from_name("schema.account")
        );
    }

    #[test]
    fn inner_classes_visible_from_enclosing_scopes() {
        let store = store();
        let outer = store.lookup_user("Outer");
        let deeper = TypeHash::from_name("outer.inner.deeper");
        let inside_deeper = TypeResolver::new(&store).within(Some(deeper));
        let found = inside_deeper.resolve(&ty("Inner"), &Location::synthetic()).unwrap();
        assert_eq!(found.base, TypeHash::from_name("outer.inner"));

        // Not visible without the enclosing scope.
        assert!(resolve(&store, "Inner").is_err());
        assert!(TypeResolver::new(&store).within(outer).lookup_simple("inner").is_some());
    }

    #[test]
    fn unknown_names_report_the_dotted_path() {
        let store = store();
        let at = Location::new("A.cls", 7, 3);
        let err = TypeResolver::new(&store)
            .resolve(&ty("Acme.Missing"), &at)
            .unwrap_err();
        assert_eq!(
            err,
            ResolutionError::TypeNotFound {
                name: "Acme.Missing".into(),
                location: at,
            }
        );
    }

    #[test]
    fn resolution_is_recorded_once() {
        let store = store();
        let reference = ty("List<Integer>");
        let resolver = TypeResolver::new(&store);
        let first = resolver.resolve(&reference, &Location::synthetic()).unwrap();
        assert_eq!(reference.resolved(), Some(&first));

        // Two separate mentions of one generic type are equal but independent.
        let other = ty("List<Integer>");
        let second = resolver.resolve(&other, &Location::synthetic()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.base, builtins::LIST);

        // A non-generic mention names the one canonical class.
        let a = resolve(&store, "Outer").unwrap();
        let b = resolve(&store, "OUTER").unwrap();
        assert_eq!(a.base, b.base);
    }
}
