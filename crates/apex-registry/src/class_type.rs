//! Class, method and field entries.
//!
//! A [`ClassType`] is the registered form of one class, interface or schema
//! object. It is created once (from a declaration or by a native module),
//! has its [`TypeRef`] slots filled in place by the type reference resolver,
//! and is then read-only for the checker and the interpreter.
//!
//! Member tables are [`IdentMap`]s, so every lookup is case-insensitive.
//! Methods are stored as overload lists under their name.

use std::fmt;

use apex_ast::NodeRef;
use apex_core::{
    Annotation, DataType, IdentMap, Location, Modifiers, NativeFn, Object, TypeHash, TypeRef,
    Value, Visibility,
};

/// Native string conversion for instances of a builtin class.
pub type ToStringHook = fn(&Object, &dyn Fn(&Value) -> String) -> String;

/// What kind of type a [`ClassType`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    /// A record type described by external schema metadata.
    SObject,
}

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub modifiers: Modifiers,
    pub type_ref: TypeRef,
    pub location: Location,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::empty(),
            type_ref,
            location: Location::synthetic(),
        }
    }

    /// A parameter whose type is already known.
    pub fn typed(name: impl Into<String>, ty: DataType) -> Self {
        Self::new(name, TypeRef::resolved_to(ty))
    }

    /// Resolved type, or `Object` before resolution.
    pub fn data_type(&self) -> DataType {
        self.type_ref.resolved().cloned().unwrap_or_else(DataType::object)
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Which member table a method lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Instance,
    Static,
    Constructor,
}

/// A method or constructor.
///
/// Exactly one of `body` and `native` is set for a callable method; both are
/// `None` for abstract and interface methods.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub return_type: TypeRef,
    pub params: Vec<Parameter>,
    pub body: Option<NodeRef>,
    pub native: Option<NativeFn>,
    /// Declaring class. Stamped when the class is registered.
    pub owner: TypeHash,
    pub location: Location,
}

impl Method {
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            return_type,
            params: Vec::new(),
            body: None,
            native: None,
            owner: TypeHash::EMPTY,
            location: Location::synthetic(),
        }
    }

    /// A public native method with pre-resolved parameter and return types.
    pub fn native(
        name: impl Into<String>,
        params: Vec<DataType>,
        returns: DataType,
        f: NativeFn,
    ) -> Self {
        let mut method = Self::new(name, TypeRef::resolved_to(returns));
        method.modifiers = Modifiers::PUBLIC;
        method.params = params
            .into_iter()
            .enumerate()
            .map(|(i, ty)| Parameter::typed(format!("p{i}"), ty))
            .collect();
        method.native = Some(f);
        method
    }

    /// Same as [`Method::native`] but `static`.
    pub fn native_static(
        name: impl Into<String>,
        params: Vec<DataType>,
        returns: DataType,
        f: NativeFn,
    ) -> Self {
        Self::native(name, params, returns, f).with_modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_params(mut self, params: Vec<Parameter>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: NodeRef) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    #[inline]
    pub fn visibility(&self) -> Visibility {
        self.modifiers.visibility()
    }

    /// Whether there is something to execute.
    pub fn is_callable(&self) -> bool {
        self.body.is_some() || self.native.is_some()
    }

    /// Resolved parameter types, in order.
    pub fn param_types(&self) -> Vec<DataType> {
        self.params.iter().map(Parameter::data_type).collect()
    }

    /// Resolved return type, `void` before resolution.
    pub fn return_data_type(&self) -> DataType {
        self.return_type.resolved().cloned().unwrap_or_else(DataType::void)
    }

    /// Same name (case-insensitive) and the same parameter types by position.
    pub fn same_signature(&self, other: &Method) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.data_type() == b.data_type())
    }

    /// `name(Type, Type)` for diagnostics.
    pub fn signature(&self) -> String {
        let params: Vec<_> = self.params.iter().map(|p| p.data_type().to_string()).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// Stable address of a method inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub owner: TypeHash,
    pub kind: MethodKind,
    /// Lower-cased method name; empty for constructors.
    pub name: String,
    /// Position in the overload list.
    pub index: usize,
}

impl MethodRef {
    pub fn new(owner: TypeHash, kind: MethodKind, name: &str, index: usize) -> Self {
        Self {
            owner,
            kind,
            name: name.to_ascii_lowercase(),
            index,
        }
    }

    pub fn constructor(owner: TypeHash, index: usize) -> Self {
        Self::new(owner, MethodKind::Constructor, "", index)
    }
}

// ============================================================================
// Fields
// ============================================================================

/// One accessor of a property.
#[derive(Debug, Clone)]
pub enum Accessor {
    /// `get;` / `set;`: reads or writes the backing slot.
    Auto,
    /// An accessor with a body block.
    Body(NodeRef),
}

/// Accessors attached to a field declared as a property.
#[derive(Debug, Clone, Default)]
pub struct Property {
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub type_ref: TypeRef,
    pub initializer: Option<NodeRef>,
    pub property: Option<Property>,
    pub owner: TypeHash,
    pub location: Location,
}

impl Field {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            type_ref,
            initializer: None,
            property: None,
            owner: TypeHash::EMPTY,
            location: Location::synthetic(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_initializer(mut self, init: NodeRef) -> Self {
        self.initializer = Some(init);
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.property = Some(property);
        self
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    /// Resolved type, or `Object` before resolution.
    pub fn data_type(&self) -> DataType {
        self.type_ref.resolved().cloned().unwrap_or_else(DataType::object)
    }
}

// ============================================================================
// ClassType
// ============================================================================

/// A registered class, interface or schema object.
#[derive(Clone)]
pub struct ClassType {
    /// Simple name as declared.
    pub name: String,
    /// Dot-qualified name: `Outer.Inner`, `System.List`, `Schema.Account`.
    pub qualified_name: String,
    pub type_hash: TypeHash,
    /// Owning namespace; `None` for user classes.
    pub namespace: Option<String>,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub annotations: Vec<Annotation>,
    pub super_ref: Option<TypeRef>,
    pub interface_refs: Vec<TypeRef>,
    pub constructors: Vec<Method>,
    pub instance_fields: IdentMap<Field>,
    pub static_fields: IdentMap<Field>,
    pub instance_methods: IdentMap<Vec<Method>>,
    pub static_methods: IdentMap<Vec<Method>>,
    pub inner_classes: IdentMap<TypeHash>,
    /// Enclosing class, for inner classes.
    pub outer: Option<TypeHash>,
    /// Generic parameter names (`T`, `K`, `V`); non-empty only for builtins.
    pub generic_params: Vec<String>,
    pub to_string_hook: Option<ToStringHook>,
    /// Declaration node this class was registered from.
    pub declaration: Option<NodeRef>,
    pub location: Location,
}

impl ClassType {
    /// A user class with no namespace.
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        let name = name.into();
        Self {
            type_hash: TypeHash::from_name(&name),
            qualified_name: name.clone(),
            name,
            namespace: None,
            kind,
            modifiers: Modifiers::empty(),
            annotations: Vec::new(),
            super_ref: None,
            interface_refs: Vec::new(),
            constructors: Vec::new(),
            instance_fields: IdentMap::new(),
            static_fields: IdentMap::new(),
            instance_methods: IdentMap::new(),
            static_methods: IdentMap::new(),
            inner_classes: IdentMap::new(),
            outer: None,
            generic_params: Vec::new(),
            to_string_hook: None,
            declaration: None,
            location: Location::synthetic(),
        }
    }

    /// A class in `namespace`, qualified as `namespace.name`.
    pub fn in_namespace(namespace: &str, name: impl Into<String>, kind: ClassKind) -> Self {
        let mut class = Self::new(name, kind);
        class.qualified_name = format!("{namespace}.{}", class.name);
        class.type_hash = TypeHash::from_name(&class.qualified_name);
        class.namespace = Some(namespace.to_string());
        class.modifiers = Modifiers::GLOBAL;
        class
    }

    /// An inner class of `outer`.
    pub fn nested(outer: &ClassType, name: impl Into<String>, kind: ClassKind) -> Self {
        let mut class = Self::new(name, kind);
        class.qualified_name = format!("{}.{}", outer.qualified_name, class.name);
        class.type_hash = TypeHash::nested(&outer.qualified_name, &class.name);
        class.outer = Some(outer.type_hash);
        class
    }

    // === Builders ===

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_super(mut self, super_ref: TypeRef) -> Self {
        self.super_ref = Some(super_ref);
        self
    }

    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.interface_refs.push(interface);
        self
    }

    pub fn with_generic_params(mut self, params: &[&str]) -> Self {
        self.generic_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_to_string(mut self, hook: ToStringHook) -> Self {
        self.to_string_hook = Some(hook);
        self
    }

    pub fn with_constructor(mut self, ctor: Method) -> Self {
        self.constructors.push(ctor);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.add_method(method);
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.add_field(field);
        self
    }

    // === Mutation during registration ===

    /// Append to the instance or static overload list, by modifiers.
    pub fn add_method(&mut self, method: Method) {
        let table = if method.is_static() {
            &mut self.static_methods
        } else {
            &mut self.instance_methods
        };
        table.entry_or_default(&method.name).push(method);
    }

    /// Insert into the instance or static field table, by modifiers.
    ///
    /// Returns the previous field of the same name, if any.
    pub fn add_field(&mut self, field: Field) -> Option<Field> {
        let name = field.name.clone();
        if field.is_static() {
            self.static_fields.insert(name, field)
        } else {
            self.instance_fields.insert(name, field)
        }
    }

    /// Record `hash` as the owner of every member.
    pub(crate) fn stamp_owner(&mut self) {
        let hash = self.type_hash;
        for m in &mut self.constructors {
            m.owner = hash;
        }
        for list in self.instance_methods.values_mut().chain(self.static_methods.values_mut()) {
            for m in list {
                m.owner = hash;
            }
        }
        for f in self.instance_fields.values_mut().chain(self.static_fields.values_mut()) {
            f.owner = hash;
        }
    }

    // === Queries ===

    /// Non-generic descriptor of this class.
    pub fn data_type(&self) -> DataType {
        DataType::simple(self.type_hash, self.name.as_str())
    }

    /// Resolved superclass identity.
    pub fn superclass(&self) -> Option<TypeHash> {
        self.super_ref.as_ref()?.resolved().map(|t| t.base)
    }

    /// Resolved interface identities, in declaration order.
    pub fn interfaces(&self) -> impl Iterator<Item = TypeHash> + '_ {
        self.interface_refs
            .iter()
            .filter_map(|r| r.resolved().map(|t| t.base))
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// Interfaces and `abstract` classes cannot be instantiated.
    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.modifiers.is_abstract()
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Overloads declared directly on this class.
    pub fn methods(&self, name: &str, kind: MethodKind) -> &[Method] {
        let list = match kind {
            MethodKind::Instance => self.instance_methods.get(name),
            MethodKind::Static => self.static_methods.get(name),
            MethodKind::Constructor => return &self.constructors,
        };
        list.map(Vec::as_slice).unwrap_or(&[])
    }

    /// Field declared directly on this class, instance table first.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.instance_fields.get(name).or_else(|| self.static_fields.get(name))
    }

    /// Every declared method, constructors first.
    pub fn all_methods(&self) -> impl Iterator<Item = &Method> {
        self.constructors
            .iter()
            .chain(self.instance_methods.values().flatten())
            .chain(self.static_methods.values().flatten())
    }

    /// Every declared field, instance fields first.
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.instance_fields.values().chain(self.static_fields.values())
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassType")
            .field("qualified_name", &self.qualified_name)
            .field("kind", &self.kind)
            .field("super_ref", &self.super_ref)
            .field("instance_fields", &self.instance_fields.len())
            .field("static_fields", &self.static_fields.len())
            .field("instance_methods", &self.instance_methods.len())
            .field("static_methods", &self.static_methods.len())
            .finish_non_exhaustive()
    }
}
