//! Lexical type scopes seen by the symbol resolver.
//!
//! The compile-time symbol pass tracks declared local types in an
//! [`Env<DataType>`]; the interpreter tracks typed slots in its own frames.
//! Both answer the one question the resolver asks through [`TypeScope`].

use apex_core::{DataType, Env};

/// Declared types of the local bindings in scope.
pub trait TypeScope {
    /// Declared type of local `name`, innermost binding first.
    fn local_type(&self, name: &str) -> Option<DataType>;
}

impl TypeScope for Env<DataType> {
    fn local_type(&self, name: &str) -> Option<DataType> {
        self.lookup(name).cloned()
    }
}

/// A scope with no locals, for host calls and static initializers.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScope;

impl TypeScope for EmptyScope {
    fn local_type(&self, _name: &str) -> Option<DataType> {
        None
    }
}
