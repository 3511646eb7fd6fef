//! Access checks for fields, methods and constructors.
//!
//! - `public` and `global` members are visible everywhere
//! - `private` members (and members with no access keyword) are visible
//!   anywhere inside the same top-level class, inner classes included
//! - `protected` members are additionally visible to subclasses of the
//!   declaring class
//!
//! Host calls have no calling class and see only `public` and `global`.

use apex_core::{Modifiers, TypeHash, Visibility};
use apex_registry::NamespaceStore;

/// Whether a member with `modifiers` declared on `owner` is accessible from `caller`.
pub fn is_visible(
    store: &NamespaceStore,
    modifiers: Modifiers,
    owner: TypeHash,
    caller: Option<TypeHash>,
) -> bool {
    let visibility = modifiers.visibility();
    if visibility >= Visibility::Public {
        return true;
    }
    let Some(caller) = caller else {
        return false;
    };
    if top_level(store, caller) == top_level(store, owner) {
        return true;
    }
    visibility == Visibility::Protected
        && enclosing(store, caller).any(|c| store.is_subclass_of(c, owner))
}

/// The outermost class enclosing `hash`.
pub fn top_level(store: &NamespaceStore, hash: TypeHash) -> TypeHash {
    enclosing(store, hash).last().unwrap_or(hash)
}

/// `hash` followed by its enclosing classes, innermost first.
pub fn enclosing(store: &NamespaceStore, hash: TypeHash) -> impl Iterator<Item = TypeHash> + '_ {
    std::iter::successors(Some(hash), move |h| store.class(*h).and_then(|c| c.outer))
}
