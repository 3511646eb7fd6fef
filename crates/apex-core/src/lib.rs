//! Core types shared by every Apex crate.
//!
//! This crate has no knowledge of the node model or the namespace store. It
//! provides the vocabulary the other crates speak:
//!
//! - [`Location`] for diagnostics
//! - [`TypeHash`] class identities and the [`builtins`] constants
//! - [`IdentMap`], the case-insensitive map used for every name table
//! - [`TypeRef`] (unresolved) and [`DataType`] (resolved) type descriptors
//! - runtime [`Value`]s and native function plumbing
//! - the lexical [`Env`] scope stack
//! - the error taxonomy

mod data_type;
mod env;
mod error;
mod ident_map;
mod modifiers;
mod native_fn;
mod span;
mod type_hash;
mod type_ref;
mod value;

pub use data_type::DataType;
pub use env::Env;
pub use error::{
    ApexError, CheckError, ContextError, Diagnostic, Diagnostics, NativeError, RegistrationError,
    ResolutionError, RuntimeError,
};
pub use ident_map::IdentMap;
pub use modifiers::{Annotation, Modifiers, Visibility};
pub use native_fn::{CallContext, NativeCallable, NativeFn, SharedState};
pub use span::Location;
pub use type_hash::{TypeHash, builtins};
pub use type_ref::TypeRef;
pub use value::{MESSAGE_KEY, Object, ObjectRef, Payload, Value, ValueKey, ValueMap};
