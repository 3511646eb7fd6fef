//! Unresolved type mentions.
//!
//! A [`TypeRef`] is what the grammar layer produces wherever a type is
//! written: a dotted name path, optional generic arguments and an array
//! dimension count. The type reference resolver fills the `resolved` slot in
//! place, exactly once; everything downstream reads [`TypeRef::resolved`].

use std::cell::OnceCell;
use std::fmt;

use crate::data_type::DataType;
use crate::span::Location;
use crate::type_hash::TypeHash;

/// A type as written in source.
#[derive(Clone)]
pub struct TypeRef {
    /// Dotted name segments, e.g. `["ns", "Outer", "Inner"]`.
    pub names: Vec<String>,
    /// Generic arguments, e.g. `Integer` in `List<Integer>`.
    pub type_args: Vec<TypeRef>,
    /// Number of `[]` suffixes.
    pub dimensions: u32,
    pub location: Location,
    resolved: OnceCell<DataType>,
}

impl TypeRef {
    /// Parse a dotted name such as `"Outer.Inner"`.
    pub fn new(dotted: &str) -> Self {
        Self::from_names(dotted.split('.').map(str::to_string).collect())
    }

    pub fn from_names(names: Vec<String>) -> Self {
        Self {
            names,
            type_args: Vec::new(),
            dimensions: 0,
            location: Location::synthetic(),
            resolved: OnceCell::new(),
        }
    }

    /// A reference that is already resolved. Used by builtin registration.
    pub fn resolved_to(ty: DataType) -> Self {
        let r = Self::new(&ty.name.to_string());
        let _ = r.resolved.set(ty);
        r
    }

    /// A pre-resolved reference to a non-generic builtin.
    pub fn builtin(hash: TypeHash, name: &str) -> Self {
        Self::resolved_to(DataType::simple(hash, name))
    }

    pub fn with_args(mut self, args: Vec<TypeRef>) -> Self {
        self.type_args = args;
        self
    }

    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// The dotted name path, as written.
    pub fn dotted_name(&self) -> String {
        self.names.join(".")
    }

    /// Whether the name is the literal `void`.
    pub fn is_void(&self) -> bool {
        self.names.len() == 1 && self.names[0].eq_ignore_ascii_case("void")
    }

    /// Copy of this reference with one array dimension removed and no
    /// resolution attached.
    pub fn element(&self) -> TypeRef {
        TypeRef {
            names: self.names.clone(),
            type_args: self.type_args.clone(),
            dimensions: self.dimensions.saturating_sub(1),
            location: self.location.clone(),
            resolved: OnceCell::new(),
        }
    }

    /// The resolved type, if resolution has run and succeeded.
    #[inline]
    pub fn resolved(&self) -> Option<&DataType> {
        self.resolved.get()
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Record the resolution. A second call is ignored and returns `false`.
    pub fn set_resolved(&self, ty: DataType) -> bool {
        self.resolved.set(ty).is_ok()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.names.len() == other.names.len()
            && self
                .names
                .iter()
                .zip(&other.names)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
            && self.type_args == other.type_args
            && self.dimensions == other.dimensions
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted_name())?;
        if !self.type_args.is_empty() {
            let args: Vec<_> = self.type_args.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        for _ in 0..self.dimensions {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved() {
            Some(ty) => write!(f, "TypeRef({self} => {ty})"),
            None => write!(f, "TypeRef({self})"),
        }
    }
}
