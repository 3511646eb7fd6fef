//! Standard library classes for the Apex interpreter.
//!
//! Every class lives in the `System` namespace and is implemented with
//! native closures:
//!
//! - **lang** - `Object`, `Integer`, `Double`, `String`, `Boolean`, `SObject`
//! - **collections** - `List<T>`, `Set<T>`, `Map<K, V>`
//! - **exception** - `Exception` and the platform exception subclasses
//! - **system** - `System.debug`, `System.assert`, `System.assertEquals`
//! - **math** - `Math.abs`, `Math.max`, `Math.min`, `Math.mod`, `Math.sqrt`, `Math.pow`
//! - **trigger** - the `Trigger` context variables
//!
//! # Usage
//!
//! Each module provides a function that returns a [`Module`] which can be
//! installed into a store before any user code is registered:
//!
//! ```
//! use apex_registry::NamespaceStore;
//!
//! let mut store = NamespaceStore::new();
//! for module in apex_modules::default_modules() {
//!     module.install(&mut store).unwrap();
//! }
//! assert!(store.lookup_namespace("System", "List").is_some());
//! ```

pub mod collections;
pub mod exception;
pub mod lang;
pub mod math;
pub mod system;
pub mod trigger;

pub use exception::{exception_message, new_exception};

use apex_core::{CallContext, NativeError, NativeFn, Value};
use apex_registry::{ClassKind, ClassType, Module, SYSTEM_NAMESPACE};

/// Every standard library module, in installation order.
pub fn default_modules() -> Vec<Module> {
    vec![
        lang::module(),
        collections::module(),
        exception::module(),
        system::module(),
        math::module(),
        trigger::module(),
    ]
}

/// Signature of every native method body in this crate.
pub(crate) type NativeBody = fn(&mut CallContext<'_>) -> Result<Value, NativeError>;

pub(crate) fn native(f: NativeBody) -> NativeFn {
    NativeFn::new(f)
}

/// A class in the `System` namespace.
pub(crate) fn system_class(name: &str) -> ClassType {
    ClassType::in_namespace(SYSTEM_NAMESPACE, name, ClassKind::Class)
}


#[cfg(test)]
mod tests {
    use super::*;
    use apex_core::builtins;
    use apex_registry::NamespaceStore;

    #[test]
    fn default_modules_install_cleanly() {
        let mut store = NamespaceStore::new();
        for module in default_modules() {
            module.install(&mut store).unwrap();
        }
        for hash in [
            builtins::OBJECT,
            builtins::INTEGER,
            builtins::STRING,
            builtins::LIST,
            builtins::MAP,
            builtins::SET,
            builtins::EXCEPTION,
            builtins::MATH_EXCEPTION,
            builtins::SYSTEM,
            builtins::MATH,
            builtins::TRIGGER,
            builtins::SOBJECT,
        ] {
            assert!(store.class(hash).is_some(), "{hash} missing");
        }
        assert!(store.is_subclass_of(builtins::MATH_EXCEPTION, builtins::EXCEPTION));
    }
}
