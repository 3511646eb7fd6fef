//! Symbol resolution for identifier chains.
//!
//! [`SymbolResolver`] turns a dotted chain in value position into a
//! [`ResolvedVariable`] (a root plus field steps) and a dotted chain in call
//! position into a [`ResolvedCall`] (a receiver plus candidate overloads).
//! Overload selection among the candidates is a separate step, because the
//! argument types are only known to the caller.
//!
//! ## Head precedence
//!
//! The first segment of a chain is tried, in order, as:
//!
//! 1. `this` or `super`
//! 2. a local binding in the [`TypeScope`]
//! 3. a field of the current class (instance fields, then statics of the
//!    current class and its enclosing classes)
//! 4. a class: `Class.staticField...`, `Outer.Inner.staticField...`,
//!    `Namespace.Class.staticField...`, shortest class prefix first
//!
//! Each further segment is a field of the previous segment's type: a
//! static field after a class, any field after a value.

use apex_core::{DataType, Location, ResolutionError, TypeHash};
use apex_registry::{Field, MethodKind, MethodRef, NamespaceStore};

use crate::overload::{OverloadMatch, select_overload};
use crate::scope::TypeScope;
use crate::type_resolver::TypeResolver;
use crate::visibility::{enclosing, is_visible};

// ============================================================================
// Resolved shapes
// ============================================================================

/// Where a variable chain starts.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableRoot {
    /// A lexical binding.
    Local(String),
    /// The receiver, written as `this` or implied by an instance field.
    This,
    /// The receiver viewed as its superclass.
    Super,
    /// A class, for static field access.
    Class(TypeHash),
}

/// One field hop in a variable chain.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStep {
    /// Declaring class.
    pub owner: TypeHash,
    pub name: String,
    pub is_static: bool,
    pub ty: DataType,
}

impl FieldStep {
    fn of(field: &Field) -> Self {
        Self {
            owner: field.owner,
            name: field.name.clone(),
            is_static: field.is_static(),
            ty: field.data_type(),
        }
    }
}

/// A resolved value-space chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariable {
    pub root: VariableRoot,
    pub steps: Vec<FieldStep>,
    /// Declared type of the whole chain.
    pub ty: DataType,
}

impl ResolvedVariable {
    fn root(root: VariableRoot, ty: DataType) -> Self {
        Self {
            root,
            steps: Vec::new(),
            ty,
        }
    }

    /// Whether the chain names a class rather than a value.
    pub fn is_class(&self) -> bool {
        self.steps.is_empty() && matches!(self.root, VariableRoot::Class(_))
    }
}

/// What a method is called on.
#[derive(Debug, Clone, PartialEq)]
pub enum CallReceiver {
    /// The current receiver. Static candidates are called without one.
    This,
    /// The current receiver, bypassing virtual dispatch.
    Super,
    /// A class: static methods only.
    Class(TypeHash),
    /// The value of a variable chain.
    Value(ResolvedVariable),
}

/// A resolved call-space chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCall {
    pub receiver: CallReceiver,
    pub name: String,
    /// Overloads visible on the receiver, nearest declaration first.
    pub candidates: Vec<MethodRef>,
}

// ============================================================================
// SymbolResolver
// ============================================================================

/// Resolves identifier chains from one position in the program.
pub struct SymbolResolver<'a> {
    store: &'a NamespaceStore,
    scope: &'a dyn TypeScope,
    current: Option<TypeHash>,
    is_static: bool,
}

impl<'a> SymbolResolver<'a> {
    /// A resolver outside any class, as in a trigger body.
    pub fn new(store: &'a NamespaceStore, scope: &'a dyn TypeScope) -> Self {
        Self {
            store,
            scope,
            current: None,
            is_static: true,
        }
    }

    /// Resolve from inside `class`; `is_static` for static methods and initializers.
    pub fn in_class(mut self, class: Option<TypeHash>, is_static: bool) -> Self {
        self.current = class;
        self.is_static = is_static || class.is_none();
        self
    }

    pub fn current_class(&self) -> Option<TypeHash> {
        self.current
    }

    fn types(&self) -> TypeResolver<'a> {
        TypeResolver::new(self.store).within(self.current)
    }

    // ========================================================================
    // Variables
    // ========================================================================

    /// Resolve a dotted chain in value position.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve_variable(
        &self,
        names: &[String],
        location: &Location,
    ) -> Result<ResolvedVariable, ResolutionError> {
        let Some(head) = names.first() else {
            return Err(not_found("", location));
        };
        match self.resolve_head(head, location)? {
            Some(start) => self.walk_fields(start, &names[1..], location),
            None => self.resolve_class_rooted(names, location),
        }
    }

    fn resolve_head(
        &self,
        head: &str,
        location: &Location,
    ) -> Result<Option<ResolvedVariable>, ResolutionError> {
        if head.eq_ignore_ascii_case("this") {
            return self.this_root(location).map(Some);
        }
        if head.eq_ignore_ascii_case("super") {
            return self.super_root(location).map(Some);
        }
        if let Some(ty) = self.scope.local_type(head) {
            return Ok(Some(ResolvedVariable::root(
                VariableRoot::Local(head.to_string()),
                ty,
            )));
        }
        self.implicit_field(head, location)
    }

    fn this_root(&self, location: &Location) -> Result<ResolvedVariable, ResolutionError> {
        let current = self.current.ok_or_else(|| not_found("this", location))?;
        if self.is_static {
            return Err(static_context("this", location));
        }
        let ty = self.store.data_type(current).ok_or_else(|| not_found("this", location))?;
        Ok(ResolvedVariable::root(VariableRoot::This, ty))
    }

    fn super_root(&self, location: &Location) -> Result<ResolvedVariable, ResolutionError> {
        let current = self.current.ok_or_else(|| not_found("super", location))?;
        if self.is_static {
            return Err(static_context("super", location));
        }
        let ty = self
            .store
            .class(current)
            .and_then(|c| c.super_ref.as_ref()?.resolved().cloned())
            .ok_or_else(|| not_found("super", location))?;
        Ok(ResolvedVariable::root(VariableRoot::Super, ty))
    }

    /// A field of the current class reached without a receiver.
    fn implicit_field(
        &self,
        name: &str,
        location: &Location,
    ) -> Result<Option<ResolvedVariable>, ResolutionError> {
        let Some(current) = self.current else {
            return Ok(None);
        };
        for class in enclosing(self.store, current) {
            let Some(field) = self.store.find_field(class, name) else {
                continue;
            };
            if !field.is_static() {
                // Enclosing classes lend their statics only.
                if class != current {
                    continue;
                }
                if self.is_static {
                    return Err(static_context(name, location));
                }
            }
            self.check_field(field, location)?;
            let root = if field.is_static() {
                VariableRoot::Class(field.owner)
            } else {
                VariableRoot::This
            };
            let step = FieldStep::of(field);
            return Ok(Some(ResolvedVariable {
                root,
                ty: step.ty.clone(),
                steps: vec![step],
            }));
        }
        Ok(None)
    }

    /// `Class.f`, `Outer.Inner.f` or `Namespace.Class.f`, shortest class prefix first.
    fn resolve_class_rooted(
        &self,
        names: &[String],
        location: &Location,
    ) -> Result<ResolvedVariable, ResolutionError> {
        let types = self.types();
        let mut first_error = None;
        for split in 1..names.len() {
            let Some(class) = types.lookup(&names[..split]) else {
                continue;
            };
            let Some(ty) = self.store.data_type(class) else {
                continue;
            };
            let start = ResolvedVariable::root(VariableRoot::Class(class), ty);
            match self.walk_fields(start, &names[split..], location) {
                Ok(resolved) => return Ok(resolved),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error.unwrap_or_else(|| not_found(&names[0], location)))
    }

    fn walk_fields(
        &self,
        mut resolved: ResolvedVariable,
        rest: &[String],
        location: &Location,
    ) -> Result<ResolvedVariable, ResolutionError> {
        for name in rest {
            let through_class = resolved.is_class();
            let field = self.store.find_field(resolved.ty.base, name).ok_or_else(|| {
                ResolutionError::FieldNotFound {
                    name: name.clone(),
                    owner: resolved.ty.to_string(),
                    location: location.clone(),
                }
            })?;
            if through_class && !field.is_static() {
                return Err(static_context(name, location));
            }
            self.check_field(field, location)?;
            let step = FieldStep::of(field);
            resolved.ty = step.ty.clone();
            resolved.steps.push(step);
        }
        Ok(resolved)
    }

    fn check_field(&self, field: &Field, location: &Location) -> Result<(), ResolutionError> {
        if is_visible(self.store, field.modifiers, field.owner, self.current) {
            Ok(())
        } else {
            Err(ResolutionError::NotVisible {
                name: field.name.clone(),
                location: location.clone(),
            })
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Resolve a receiver-less dotted chain in call position.
    ///
    /// The last segment is the method name; the rest is resolved like a
    /// variable chain, falling back to a class for static calls.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve_call(
        &self,
        names: &[String],
        location: &Location,
    ) -> Result<ResolvedCall, ResolutionError> {
        let Some((name, prefix)) = names.split_last() else {
            return Err(method_not_found("", "", location));
        };
        let Some(head) = prefix.first() else {
            return self.implicit_call(name, location);
        };

        if prefix.len() == 1 && head.eq_ignore_ascii_case("this") {
            let this = self.this_root(location)?;
            let mut candidates =
                self.store.method_candidates(this.ty.base, name, MethodKind::Instance);
            candidates.extend(self.store.method_candidates(this.ty.base, name, MethodKind::Static));
            return self.finish(CallReceiver::This, name, candidates, &this.ty, location);
        }
        if prefix.len() == 1 && head.eq_ignore_ascii_case("super") {
            let parent = self.super_root(location)?;
            let candidates =
                self.store.method_candidates(parent.ty.base, name, MethodKind::Instance);
            return self.finish(CallReceiver::Super, name, candidates, &parent.ty, location);
        }

        if let Some(start) = self.resolve_head(head, location)? {
            let receiver = self.walk_fields(start, &prefix[1..], location)?;
            return self.value_call(receiver, name, location);
        }
        match self.resolve_class_rooted(prefix, location) {
            Ok(receiver) => self.value_call(receiver, name, location),
            Err(err) => match self.types().lookup(prefix) {
                Some(class) => self.static_call(class, name, location),
                None => Err(err),
            },
        }
    }

    /// `name(args)` with no receiver.
    fn implicit_call(
        &self,
        name: &str,
        location: &Location,
    ) -> Result<ResolvedCall, ResolutionError> {
        let Some(current) = self.current else {
            return Err(method_not_found(name, "global scope", location));
        };
        for class in enclosing(self.store, current) {
            let statics = self.store.method_candidates(class, name, MethodKind::Static);
            let instance = if class == current {
                self.store.method_candidates(class, name, MethodKind::Instance)
            } else {
                Vec::new()
            };
            if !instance.is_empty() && !self.is_static {
                let mut candidates = instance;
                candidates.extend(statics);
                return Ok(ResolvedCall {
                    receiver: CallReceiver::This,
                    name: name.to_string(),
                    candidates,
                });
            }
            if !statics.is_empty() {
                return Ok(ResolvedCall {
                    receiver: CallReceiver::Class(class),
                    name: name.to_string(),
                    candidates: statics,
                });
            }
            if !instance.is_empty() {
                return Err(static_context(name, location));
            }
        }
        let owner = self.class_name(current);
        Err(method_not_found(name, &owner, location))
    }

    fn value_call(
        &self,
        receiver: ResolvedVariable,
        name: &str,
        location: &Location,
    ) -> Result<ResolvedCall, ResolutionError> {
        let candidates = self.store.method_candidates(receiver.ty.base, name, MethodKind::Instance);
        let ty = receiver.ty.clone();
        self.finish(CallReceiver::Value(receiver), name, candidates, &ty, location)
    }

    fn static_call(
        &self,
        class: TypeHash,
        name: &str,
        location: &Location,
    ) -> Result<ResolvedCall, ResolutionError> {
        let candidates = self.store.method_candidates(class, name, MethodKind::Static);
        if candidates.is_empty() {
            let owner = self.class_name(class);
            if !self.store.method_candidates(class, name, MethodKind::Instance).is_empty() {
                return Err(static_context(name, location));
            }
            return Err(method_not_found(name, &owner, location));
        }
        Ok(ResolvedCall {
            receiver: CallReceiver::Class(class),
            name: name.to_string(),
            candidates,
        })
    }

    fn finish(
        &self,
        receiver: CallReceiver,
        name: &str,
        candidates: Vec<MethodRef>,
        owner: &DataType,
        location: &Location,
    ) -> Result<ResolvedCall, ResolutionError> {
        if candidates.is_empty() {
            return Err(method_not_found(name, &owner.to_string(), location));
        }
        Ok(ResolvedCall {
            receiver,
            name: name.to_string(),
            candidates,
        })
    }

    /// Instance overloads of `name` on a value of type `receiver`.
    pub fn instance_candidates(
        &self,
        receiver: &DataType,
        name: &str,
        location: &Location,
    ) -> Result<Vec<MethodRef>, ResolutionError> {
        let candidates = self.store.method_candidates(receiver.base, name, MethodKind::Instance);
        if candidates.is_empty() {
            return Err(method_not_found(name, &receiver.to_string(), location));
        }
        Ok(candidates)
    }

    /// Select among `candidates` for arguments of `arg_types`, from the current class.
    pub fn select(
        &self,
        candidates: &[MethodRef],
        arg_types: &[DataType],
        name: &str,
        location: &Location,
    ) -> Result<OverloadMatch, ResolutionError> {
        select_overload(self.store, candidates, arg_types, self.current, name, location)
    }

    /// Constructor of `class` for arguments of `arg_types`.
    ///
    /// A class with no declared constructor has an implicit no-argument
    /// one, reported as `None`.
    pub fn resolve_constructor(
        &self,
        class: TypeHash,
        arg_types: &[DataType],
        location: &Location,
    ) -> Result<Option<MethodRef>, ResolutionError> {
        let name = self.class_name(class);
        let candidates = self.store.method_candidates(class, "", MethodKind::Constructor);
        if candidates.is_empty() {
            if arg_types.is_empty() {
                return Ok(None);
            }
            return Err(ResolutionError::NoMatchingOverload {
                name,
                args: crate::overload::format_args(arg_types),
                location: location.clone(),
            });
        }
        self.select(&candidates, arg_types, &name, location)
            .map(|m| Some(m.method))
    }

    fn class_name(&self, class: TypeHash) -> String {
        self.store
            .class(class)
            .map(|c| c.qualified_name.clone())
            .unwrap_or_else(|| class.to_string())
    }
}

fn not_found(name: &str, location: &Location) -> ResolutionError {
    ResolutionError::VariableNotFound {
        name: name.to_string(),
        location: location.clone(),
    }
}

fn static_context(name: &str, location: &Location) -> ResolutionError {
    ResolutionError::StaticContext {
        name: name.to_string(),
        location: location.clone(),
    }
}

fn method_not_found(name: &str, owner: &str, location: &Location) -> ResolutionError {
    ResolutionError::MethodNotFound {
        name: name.to_string(),
        owner: owner.to_string(),
        location: location.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::EmptyScope;
    use apex_core::{Env, Modifiers, TypeRef};
    use apex_registry::{ClassKind, ClassType, Method, Parameter};
    use pretty_assertions::assert_eq;

    fn names(dotted: &str) -> Vec<String> {
        dotted.split('.').map(str::to_string).collect()
    }

    fn field(name: &str, modifiers: Modifiers, ty: DataType) -> Field {
        Field::new(name, TypeRef::resolved_to(ty)).with_modifiers(modifiers)
    }

    fn method(name: &str, modifiers: Modifiers, params: &[DataType]) -> Method {
        Method::new(name, TypeRef::resolved_to(DataType::void()))
            .with_modifiers(modifiers)
            .with_params(
                params
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Parameter::typed(format!("p{i}"), t.clone()))
                    .collect(),
            )
    }

    const PUBLIC_STATIC: Modifiers = Modifiers::PUBLIC.union(Modifiers::STATIC);

    /// `Account { name; static count; static Account last; save(); static create() }`,
    /// `Special extends Account`, `Acme.Registry { static Account primary }`,
    /// `Vault { private static secret }`.
    fn store() -> NamespaceStore {
        let mut store = NamespaceStore::new();
        store
            .register_class(ClassType::in_namespace("System", "String", ClassKind::Class))
            .unwrap();
        let account_ty = DataType::simple(TypeHash::from_name("account"), "Account");

        let mut account = ClassType::new("Account", ClassKind::Class)
            .with_field(field("name", Modifiers::PUBLIC, DataType::string()))
            .with_field(field("count", PUBLIC_STATIC, DataType::integer()))
            .with_field(field("last", PUBLIC_STATIC, account_ty.clone()))
            .with_method(method("save", Modifiers::PUBLIC, &[]))
            .with_method(method("create", PUBLIC_STATIC, &[DataType::string()]));
        let helper = ClassType::nested(&account, "Helper", ClassKind::Class)
            .with_field(field("mode", Modifiers::PUBLIC, DataType::integer()));
        account.inner_classes.insert("Helper", helper.type_hash);
        let special = ClassType::new("Special", ClassKind::Class)
            .with_super(TypeRef::resolved_to(account_ty.clone()))
            .with_method(method("save", Modifiers::PUBLIC, &[]));
        let registry = ClassType::in_namespace("Acme", "Registry", ClassKind::Class)
            .with_field(field("primary", PUBLIC_STATIC, account_ty));
        let vault = ClassType::new("Vault", ClassKind::Class)
            .with_field(field("secret", Modifiers::STATIC, DataType::string()));
        for class in [account, helper, special, registry, vault] {
            store.register_class(class).unwrap();
        }
        store
    }

    fn account() -> TypeHash {
        TypeHash::from_name("account")
    }

    #[test]
    fn local_binding_wins_over_everything() {
        let store = store();
        let mut env = Env::new();
        env.define("name", DataType::integer());
        let resolver = SymbolResolver::new(&store, &env).in_class(Some(account()), false);
        let v = resolver.resolve_variable(&names("name"), &Location::synthetic()).unwrap();
        assert_eq!(v.root, VariableRoot::Local("name".into()));
        assert_eq!(v.ty, DataType::integer());
    }

    #[test]
    fn implicit_instance_and_static_fields() {
        let store = store();
        let resolver = SymbolResolver::new(&store, &EmptyScope).in_class(Some(account()), false);
        let v = resolver.resolve_variable(&names("NAME"), &Location::synthetic()).unwrap();
        assert_eq!(v.root, VariableRoot::This);
        assert_eq!(v.steps.len(), 1);

        let v = resolver.resolve_variable(&names("count"), &Location::synthetic()).unwrap();
        assert_eq!(v.root, VariableRoot::Class(account()));
        assert!(v.steps[0].is_static);
    }

    #[test]
    fn instance_field_in_static_context_is_rejected() {
        let store = store();
        let resolver = SymbolResolver::new(&store, &EmptyScope).in_class(Some(account()), true);
        assert!(matches!(
            resolver.resolve_variable(&names("name"), &Location::synthetic()),
            Err(ResolutionError::StaticContext { .. })
        ));
        assert!(matches!(
            resolver.resolve_variable(&names("this"), &Location::synthetic()),
            Err(ResolutionError::StaticContext { .. })
        ));
    }

    #[test]
    fn inner_class_sees_outer_statics_only() {
        let store = store();
        let helper = TypeHash::from_name("account.helper");
        let resolver = SymbolResolver::new(&store, &EmptyScope).in_class(Some(helper), false);
        assert!(resolver.resolve_variable(&names("count"), &Location::synthetic()).is_ok());
        assert!(resolver.resolve_variable(&names("mode"), &Location::synthetic()).is_ok());
        assert!(matches!(
            resolver.resolve_variable(&names("name"), &Location::synthetic()),
            Err(ResolutionError::VariableNotFound { .. })
        ));
    }

    #[test]
    fn two_part_precedence_local_then_class_then_namespace() {
        let store = store();
        let mut env = Env::new();
        // A local named like the class shadows the class.
        env.define("Account", DataType::simple(account(), "Account"));
        let resolver = SymbolResolver::new(&store, &env);
        let v = resolver.resolve_variable(&names("account.name"), &Location::synthetic()).unwrap();
        assert_eq!(v.root, VariableRoot::Local("account".into()));

        let resolver = SymbolResolver::new(&store, &EmptyScope);
        let v = resolver.resolve_variable(&names("Account.count"), &Location::synthetic()).unwrap();
        assert_eq!(v.root, VariableRoot::Class(account()));

        let v = resolver
            .resolve_variable(&names("Acme.Registry.primary.name"), &Location::synthetic())
            .unwrap();
        assert_eq!(v.root, VariableRoot::Class(TypeHash::from_name("acme.registry")));
        assert_eq!(v.steps.len(), 2);
        assert_eq!(v.ty, DataType::string());
    }

    #[test]
    fn chains_report_the_failing_segment() {
        let store = store();
        let resolver = SymbolResolver::new(&store, &EmptyScope);
        let err = resolver
            .resolve_variable(&names("y"), &Location::new("T.cls", 2, 5))
            .unwrap_err();
        assert_eq!(err.to_string(), "at T.cls:2:5: `y` is not found in this scope");

        assert!(matches!(
            resolver.resolve_variable(&names("Account.last.missing"), &Location::synthetic()),
            Err(ResolutionError::FieldNotFound { .. })
        ));
        assert!(matches!(
            resolver.resolve_variable(&names("Account.name"), &Location::synthetic()),
            Err(ResolutionError::StaticContext { .. })
        ));
        // A bare class is not a value.
        assert!(matches!(
            resolver.resolve_variable(&names("Account"), &Location::synthetic()),
            Err(ResolutionError::VariableNotFound { .. })
        ));
    }

    #[test]
    fn private_fields_stay_inside_their_class() {
        let store = store();
        let outside = SymbolResolver::new(&store, &EmptyScope);
        assert!(matches!(
            outside.resolve_variable(&names("Vault.secret"), &Location::synthetic()),
            Err(ResolutionError::NotVisible { .. })
        ));
        let inside = SymbolResolver::new(&store, &EmptyScope)
            .in_class(Some(TypeHash::from_name("vault")), true);
        assert!(inside.resolve_variable(&names("secret"), &Location::synthetic()).is_ok());
    }

    #[test]
    fn calls_resolve_receivers() {
        let store = store();
        let mut env = Env::new();
        env.define("a", DataType::simple(account(), "Account"));
        let resolver = SymbolResolver::new(&store, &env).in_class(Some(account()), false);

        let call = resolver.resolve_call(&names("save"), &Location::synthetic()).unwrap();
        assert_eq!(call.receiver, CallReceiver::This);

        let call = resolver.resolve_call(&names("a.save"), &Location::synthetic()).unwrap();
        assert!(matches!(call.receiver, CallReceiver::Value(_)));

        let call = resolver
            .resolve_call(&names("Account.create"), &Location::synthetic())
            .unwrap();
        assert_eq!(call.receiver, CallReceiver::Class(account()));

        let call = resolver
            .resolve_call(&names("Account.last.save"), &Location::synthetic())
            .unwrap();
        assert!(matches!(call.receiver, CallReceiver::Value(ref v) if v.steps.len() == 1));
    }

    #[test]
    fn super_calls_search_the_superclass() {
        let store = store();
        let special = TypeHash::from_name("special");
        let resolver = SymbolResolver::new(&store, &EmptyScope).in_class(Some(special), false);
        let call = resolver.resolve_call(&names("super.save"), &Location::synthetic()).unwrap();
        assert_eq!(call.receiver, CallReceiver::Super);
        assert_eq!(call.candidates[0].owner, account());

        // Unqualified, the override shadows the inherited method.
        let call = resolver.resolve_call(&names("save"), &Location::synthetic()).unwrap();
        assert_eq!(call.candidates.len(), 1);
        assert_eq!(call.candidates[0].owner, special);
    }

    #[test]
    fn static_context_and_missing_methods() {
        let store = store();
        let resolver = SymbolResolver::new(&store, &EmptyScope).in_class(Some(account()), true);
        assert!(matches!(
            resolver.resolve_call(&names("save"), &Location::synthetic()),
            Err(ResolutionError::StaticContext { .. })
        ));
        assert!(resolver.resolve_call(&names("create"), &Location::synthetic()).is_ok());
        assert!(matches!(
            resolver.resolve_call(&names("Account.nothing"), &Location::synthetic()),
            Err(ResolutionError::MethodNotFound { .. })
        ));
        assert!(matches!(
            resolver.resolve_call(&names("Account.save"), &Location::synthetic()),
            Err(ResolutionError::StaticContext { .. })
        ));
    }

    #[test]
    fn implicit_constructor_takes_no_arguments() {
        let store = store();
        let resolver = SymbolResolver::new(&store, &EmptyScope);
        assert_eq!(
            resolver.resolve_constructor(account(), &[], &Location::synthetic()),
            Ok(None)
        );
        assert!(matches!(
            resolver.resolve_constructor(account(), &[DataType::integer()], &Location::synthetic()),
            Err(ResolutionError::NoMatchingOverload { .. })
        ));
    }

    #[test]
    fn overload_selection_uses_the_calling_class() {
        let store = store();
        let resolver = SymbolResolver::new(&store, &EmptyScope);
        let call = resolver
            .resolve_call(&names("Account.create"), &Location::synthetic())
            .unwrap();
        let chosen = resolver
            .select(&call.candidates, &[DataType::string()], &call.name, &Location::synthetic())
            .unwrap();
        assert_eq!(chosen.method.owner, account());
    }
}
