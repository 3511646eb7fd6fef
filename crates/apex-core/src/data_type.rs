//! Resolved type descriptors.
//!
//! A [`DataType`] is a base class identity plus a list of bound type
//! arguments. Generic instantiations such as `List<Integer>` are *not* copies
//! of the `List` class: they are descriptors pointing at the single `List`
//! class and carrying their own arguments. Equality is structural, recursing
//! through the arguments, and ignores the display name.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::type_hash::{TypeHash, builtins};

/// A resolved type: base class plus bound generic arguments.
#[derive(Clone)]
pub struct DataType {
    /// Identity of the base class.
    pub base: TypeHash,
    /// Display name of the base class, as declared.
    pub name: Arc<str>,
    /// Bound type arguments (empty for non-generic types).
    pub type_args: Vec<DataType>,
}

impl DataType {
    /// A non-generic type.
    pub fn simple(base: TypeHash, name: impl Into<Arc<str>>) -> Self {
        Self {
            base,
            name: name.into(),
            type_args: Vec::new(),
        }
    }

    /// A generic instantiation.
    pub fn generic(base: TypeHash, name: impl Into<Arc<str>>, type_args: Vec<DataType>) -> Self {
        Self {
            base,
            name: name.into(),
            type_args,
        }
    }

    pub fn object() -> Self {
        Self::simple(builtins::OBJECT, "Object")
    }

    pub fn void() -> Self {
        Self::simple(builtins::VOID, "void")
    }

    pub fn null() -> Self {
        Self::simple(builtins::NULL, "null")
    }

    pub fn integer() -> Self {
        Self::simple(builtins::INTEGER, "Integer")
    }

    pub fn double() -> Self {
        Self::simple(builtins::DOUBLE, "Double")
    }

    pub fn string() -> Self {
        Self::simple(builtins::STRING, "String")
    }

    pub fn boolean() -> Self {
        Self::simple(builtins::BOOLEAN, "Boolean")
    }

    /// `List<element>`.
    pub fn list_of(element: DataType) -> Self {
        Self::generic(builtins::LIST, "List", vec![element])
    }

    /// `Set<element>`.
    pub fn set_of(element: DataType) -> Self {
        Self::generic(builtins::SET, "Set", vec![element])
    }

    /// `Map<key, value>`.
    pub fn map_of(key: DataType, value: DataType) -> Self {
        Self::generic(builtins::MAP, "Map", vec![key, value])
    }

    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.type_args.is_empty()
    }

    #[inline]
    pub fn is(&self, base: TypeHash) -> bool {
        self.base == base
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.base == builtins::NULL
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.base == builtins::VOID
    }

    /// Bound argument at `index`, or `Object` when unbound.
    pub fn type_arg(&self, index: usize) -> DataType {
        self.type_args.get(index).cloned().unwrap_or_else(DataType::object)
    }

    /// Number of `List` wraps around a non-list element.
    pub fn list_depth(&self) -> usize {
        let mut depth = 0;
        let mut ty = self;
        while ty.base == builtins::LIST {
            match ty.type_args.first() {
                Some(inner) => {
                    depth += 1;
                    ty = inner;
                }
                None => break,
            }
        }
        depth
    }
}

impl PartialEq for DataType {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.type_args == other.type_args
    }
}

impl Eq for DataType {}

impl Hash for DataType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.hash(state);
        self.type_args.hash(state);
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.type_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.type_args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataType({self})")
    }
}
