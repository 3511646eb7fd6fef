//! Lexical environments.
//!
//! [`Env`] is a stack of scopes, innermost last. Blocks push and pop scopes;
//! a method call starts a fresh `Env`, so callers' locals are never visible
//! to callees. Lookups walk from the innermost scope outward and are
//! case-insensitive.

use crate::ident_map::IdentMap;

/// A scope stack mapping identifiers to `T`.
#[derive(Debug, Clone)]
pub struct Env<T> {
    scopes: Vec<IdentMap<T>>,
}

impl<T> Default for Env<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Env<T> {
    /// An environment with one (outermost) scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![IdentMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(IdentMap::new());
    }

    /// Pop the innermost scope. The outermost scope is never removed.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of live scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `name` in the innermost scope, shadowing outer bindings.
    pub fn define(&mut self, name: impl Into<String>, value: T) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, value);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut T> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }

    /// Whether `name` is bound in the innermost scope only.
    pub fn has_local(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_and_pops() {
        let mut env = Env::new();
        env.define("x", 1);
        env.push_scope();
        env.define("X", 2);
        assert_eq!(env.lookup("x"), Some(&2));
        env.pop_scope();
        assert_eq!(env.lookup("x"), Some(&1));
    }

    #[test]
    fn lookup_mut_updates_outer_binding() {
        let mut env = Env::new();
        env.define("count", 0);
        env.push_scope();
        if let Some(v) = env.lookup_mut("Count") {
            *v += 5;
        }
        env.pop_scope();
        assert_eq!(env.lookup("count"), Some(&5));
    }

    #[test]
    fn outermost_scope_survives_pop() {
        let mut env: Env<i32> = Env::new();
        env.pop_scope();
        assert_eq!(env.depth(), 1);
        assert!(!env.has_local("missing"));
    }
}
