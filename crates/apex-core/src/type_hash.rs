//! Deterministic hash-based class identity.
//!
//! [`TypeHash`] is a 64-bit hash computed from a class's lower-cased,
//! dot-qualified name. Because names are case-insensitive in the language,
//! `Account`, `ACCOUNT` and `account` all hash to the same identity. Hashing
//! the name (rather than handing out sequential ids) lets the registration
//! pass compute the identity of a class before it has been registered, which
//! is what makes forward and mutually recursive references cheap.
//!
//! # Examples
//!
//! ```
//! use apex_core::TypeHash;
//!
//! assert_eq!(TypeHash::from_name("Account"), TypeHash::from_name("ACCOUNT"));
//! assert_ne!(TypeHash::from_name("Account"), TypeHash::from_name("Contact"));
//! ```

use std::fmt;

use xxhash_rust::const_xxh64::xxh64 as const_xxh64;
use xxhash_rust::xxh64::xxh64;

/// Domain marker mixed into every class hash.
const TYPE_DOMAIN: u64 = 0x2fac10b63a6cc57c;

/// A deterministic 64-bit hash identifying a class.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a hash from a qualified class name (case-insensitive).
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(TYPE_DOMAIN ^ xxh64(name.to_ascii_lowercase().as_bytes(), 0))
    }

    /// Compile-time variant of [`TypeHash::from_name`].
    ///
    /// The input must already be lower case.
    pub const fn from_lowercase(name: &str) -> Self {
        TypeHash(TYPE_DOMAIN ^ const_xxh64(name.as_bytes(), 0))
    }

    /// Hash of class `inner` nested inside the class named `qualified_outer`.
    pub fn nested(qualified_outer: &str, inner: &str) -> Self {
        Self::from_name(&format!("{qualified_outer}.{inner}"))
    }

    /// Whether this is the empty hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Hashes of the platform classes every other component refers to.
///
/// Platform classes live in the `System` namespace, so their qualified
/// names carry the `system.` prefix.
pub mod builtins {
    use super::TypeHash;

    pub const OBJECT: TypeHash = TypeHash::from_lowercase("system.object");
    pub const VOID: TypeHash = TypeHash::from_lowercase("system.void");
    pub const NULL: TypeHash = TypeHash::from_lowercase("system.null");
    pub const INTEGER: TypeHash = TypeHash::from_lowercase("system.integer");
    pub const DOUBLE: TypeHash = TypeHash::from_lowercase("system.double");
    pub const STRING: TypeHash = TypeHash::from_lowercase("system.string");
    pub const BOOLEAN: TypeHash = TypeHash::from_lowercase("system.boolean");
    pub const LIST: TypeHash = TypeHash::from_lowercase("system.list");
    pub const SET: TypeHash = TypeHash::from_lowercase("system.set");
    pub const MAP: TypeHash = TypeHash::from_lowercase("system.map");
    pub const SOBJECT: TypeHash = TypeHash::from_lowercase("system.sobject");
    pub const EXCEPTION: TypeHash = TypeHash::from_lowercase("system.exception");
    pub const NULL_POINTER_EXCEPTION: TypeHash =
        TypeHash::from_lowercase("system.nullpointerexception");
    pub const MATH_EXCEPTION: TypeHash = TypeHash::from_lowercase("system.mathexception");
    pub const TYPE_EXCEPTION: TypeHash = TypeHash::from_lowercase("system.typeexception");
    pub const LIST_EXCEPTION: TypeHash = TypeHash::from_lowercase("system.listexception");
    pub const QUERY_EXCEPTION: TypeHash = TypeHash::from_lowercase("system.queryexception");
    pub const ASSERT_EXCEPTION: TypeHash = TypeHash::from_lowercase("system.assertexception");
    pub const STRING_EXCEPTION: TypeHash = TypeHash::from_lowercase("system.stringexception");
    pub const SYSTEM: TypeHash = TypeHash::from_lowercase("system.system");
    pub const MATH: TypeHash = TypeHash::from_lowercase("system.math");
    pub const TRIGGER: TypeHash = TypeHash::from_lowercase("system.trigger");
}
