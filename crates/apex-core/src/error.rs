//! Error types for every phase of the engine.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ApexError (top-level wrapper)
//! ├── ContextError      - Engine setup errors (module installation)
//! ├── Diagnostics       - Batch of compile-time failures
//! │   ├── RegistrationError - Structural indexing of declarations
//! │   ├── ResolutionError   - Unknown types/names, overload failures
//! │   └── CheckError        - Duplicate signatures, illegal overrides
//! └── RuntimeError      - Execution faults and uncaught exceptions
//! ```
//!
//! Compile-time phases never stop at the first failure: they push into a
//! [`Diagnostics`] batch and keep going with unrelated classes.

use std::fmt;

use thiserror::Error;

use crate::span::Location;
use crate::type_hash::TypeHash;

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while indexing declarations into the namespace store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A class with this qualified name already exists.
    #[error("at {location}: class `{name}` is already defined")]
    DuplicateClass { name: String, location: Location },

    /// A trigger with this name already exists.
    #[error("at {location}: trigger `{name}` is already defined")]
    DuplicateTrigger { name: String, location: Location },

    /// Two fields or properties of one class share a name.
    #[error("at {location}: field `{name}` is already defined in `{class}`")]
    DuplicateField {
        name: String,
        class: String,
        location: Location,
    },

    /// A class member is not a field, method, constructor, property or nested type.
    #[error("at {location}: unexpected {kind} in body of `{class}`")]
    MalformedMember {
        class: String,
        kind: &'static str,
        location: Location,
    },

    /// A top-level node that is not a class, interface or trigger.
    #[error("at {location}: expected a type or trigger declaration, found {kind}")]
    UnexpectedDeclaration {
        kind: &'static str,
        location: Location,
    },

    /// The store has been sealed; no more classes may be added.
    #[error("cannot register `{name}`: namespace store is sealed")]
    Sealed { name: String },

    /// Malformed schema metadata.
    #[error("invalid schema for `{object}`: {message}")]
    InvalidSchema { object: String, message: String },
}

// ============================================================================
// Resolution Errors
// ============================================================================

/// Errors raised while resolving type mentions, names and overloads.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("at {location}: type `{name}` is not found")]
    TypeNotFound { name: String, location: Location },

    #[error("at {location}: type `{name}` expects {expected} type argument(s), found {found}")]
    GenericArity {
        name: String,
        expected: usize,
        found: usize,
        location: Location,
    },

    #[error("at {location}: `{name}` is not found in this scope")]
    VariableNotFound { name: String, location: Location },

    #[error("at {location}: field `{name}` is not found on `{owner}`")]
    FieldNotFound {
        name: String,
        owner: String,
        location: Location,
    },

    #[error("at {location}: method `{name}` is not found on `{owner}`")]
    MethodNotFound {
        name: String,
        owner: String,
        location: Location,
    },

    #[error("at {location}: no overload of `{name}` accepts ({args})")]
    NoMatchingOverload {
        name: String,
        args: String,
        location: Location,
    },

    #[error("at {location}: call to `{name}` with ({args}) is ambiguous between {candidates} overloads")]
    AmbiguousOverload {
        name: String,
        args: String,
        candidates: usize,
        location: Location,
    },

    #[error("at {location}: `{name}` is not visible from here")]
    NotVisible { name: String, location: Location },

    #[error("at {location}: `{name}` cannot be used in a static context")]
    StaticContext { name: String, location: Location },
}

impl ResolutionError {
    pub fn location(&self) -> &Location {
        match self {
            ResolutionError::TypeNotFound { location, .. }
            | ResolutionError::GenericArity { location, .. }
            | ResolutionError::VariableNotFound { location, .. }
            | ResolutionError::FieldNotFound { location, .. }
            | ResolutionError::MethodNotFound { location, .. }
            | ResolutionError::NoMatchingOverload { location, .. }
            | ResolutionError::AmbiguousOverload { location, .. }
            | ResolutionError::NotVisible { location, .. }
            | ResolutionError::StaticContext { location, .. } => location,
        }
    }
}

// ============================================================================
// Check Errors
// ============================================================================

/// Structural violations found by the class checker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    #[error("at {location}: parameter name is duplicated: `{name}`")]
    DuplicateParameter { name: String, location: Location },

    #[error("at {location}: method `{name}` is duplicated")]
    DuplicateMethod { name: String, location: Location },

    #[error("at {location}: method `{name}` missing on super class")]
    MissingSuperMethod { name: String, location: Location },

    #[error("at {location}: field `{name}` missing on super class")]
    MissingSuperField { name: String, location: Location },

    #[error("at {location}: field `{name}` of `{super_class}` is neither abstract nor virtual")]
    FieldNotOverridable {
        name: String,
        super_class: String,
        location: Location,
    },

    #[error("at {location}: field `{name}` is not defined in `{class}`")]
    FieldHidden {
        name: String,
        class: String,
        location: Location,
    },

    #[error("at {location}: class `{class}` is part of an inheritance cycle")]
    CircularInheritance { class: String, location: Location },
}

// ============================================================================
// Diagnostics
// ============================================================================

/// One compile-time failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Check(#[from] CheckError),
}

/// An ordered batch of compile-time failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: impl Into<Diagnostic>) {
        self.items.push(diagnostic.into());
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    /// `Ok(())` when empty, otherwise the whole batch.
    pub fn into_result(self) -> Result<(), Diagnostics> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Check errors only, in order.
    pub fn checks(&self) -> impl Iterator<Item = &CheckError> {
        self.items.iter().filter_map(|d| match d {
            Diagnostic::Check(c) => Some(c),
            _ => None,
        })
    }

    /// Resolution errors only, in order.
    pub fn resolutions(&self) -> impl Iterator<Item = &ResolutionError> {
        self.items.iter().filter_map(|d| match d {
            Diagnostic::Resolution(r) => Some(r),
            _ => None,
        })
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s)", self.items.len())?;
        for item in &self.items {
            write!(f, "\n  {item}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(error: Diagnostic) -> Self {
        Self { items: vec![error] }
    }
}

impl From<ResolutionError> for Diagnostics {
    fn from(error: ResolutionError) -> Self {
        Diagnostic::from(error).into()
    }
}

impl From<CheckError> for Diagnostics {
    fn from(error: CheckError) -> Self {
        Diagnostic::from(error).into()
    }
}

impl From<RegistrationError> for Diagnostics {
    fn from(error: RegistrationError) -> Self {
        Diagnostic::from(error).into()
    }
}

// ============================================================================
// Native Errors
// ============================================================================

/// Failure reported by a native closure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// Raise a catchable exception of the given class.
    #[error("{class_name}: {message}")]
    Exception {
        class: TypeHash,
        class_name: &'static str,
        message: String,
    },

    #[error("argument index {index} out of bounds ({count} provided)")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    #[error("argument {index}: expected {expected}, got {actual}")]
    ArgumentType {
        index: usize,
        expected: &'static str,
        actual: String,
    },

    #[error("invalid receiver: {0}")]
    InvalidThis(String),

    #[error("{0}")]
    Other(String),
}

impl NativeError {
    /// Raise `class_name` (a builtin exception) with `message`.
    pub fn raise(class: TypeHash, class_name: &'static str, message: impl Into<String>) -> Self {
        NativeError::Exception {
            class,
            class_name,
            message: message.into(),
        }
    }

    pub fn invalid_this(message: impl Into<String>) -> Self {
        NativeError::InvalidThis(message.into())
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Fatal errors during interpretation.
///
/// User-level exceptions are *not* runtime errors while they can still be
/// caught; only one that escapes the entry call becomes
/// [`RuntimeError::UncaughtException`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("at {location}: operator `{op}` is not supported for {left} and {right}")]
    UnsupportedOperator {
        op: String,
        left: String,
        right: String,
        location: Location,
    },

    #[error("at {location}: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: String,
        actual: String,
        location: Location,
    },

    #[error("uncaught {class}: {message}")]
    UncaughtException { class: String, message: String },

    #[error("native method `{method}` failed: {source}")]
    Native { method: String, source: NativeError },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("at {location}: invalid assignment target")]
    InvalidAssignmentTarget { location: Location },

    #[error("at {location}: cannot iterate over {type_name}")]
    NotIterable { type_name: String, location: Location },

    #[error("at {location}: `{what}` escaped its enclosing {boundary}")]
    ControlFlowEscape {
        what: &'static str,
        boundary: &'static str,
        location: Location,
    },

    #[error("at {location}: cannot instantiate abstract type `{class}`")]
    AbstractInstantiation { class: String, location: Location },

    #[error("method `{method}` has no body")]
    MissingBody { method: String },

    #[error("call depth limit of {limit} exceeded")]
    CallDepthExceeded { limit: usize },

    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded { limit: u64 },

    #[error("no entry point `{name}`")]
    NoEntryPoint { name: String },

    #[error("at {location}: {message}")]
    Unsupported { message: String, location: Location },
}

// ============================================================================
// Context Errors
// ============================================================================

/// Errors raised while configuring an engine context.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    #[error("cannot install module `{module}`: context already sealed by a built unit")]
    AlreadySealed { module: String },

    #[error("module `{module}` failed to install: {source}")]
    Install {
        module: String,
        source: RegistrationError,
    },
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Top-level error for host code driving the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApexError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("compilation failed with {0}")]
    Compilation(#[from] Diagnostics),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ApexError {
    pub fn is_compilation(&self) -> bool {
        matches!(self, ApexError::Compilation(_))
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, ApexError::Runtime(_))
    }

    /// Compile-time diagnostics carried by this error, if any.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            ApexError::Compilation(d) => Some(d),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_error_messages() {
        let loc = Location::new("Foo.cls", 4, 2);
        let err = CheckError::DuplicateParameter {
            name: "x".into(),
            location: loc.clone(),
        };
        assert_eq!(err.to_string(), "at Foo.cls:4:2: parameter name is duplicated: `x`");

        let err = CheckError::DuplicateMethod {
            name: "run".into(),
            location: loc,
        };
        assert!(err.to_string().ends_with("method `run` is duplicated"));
    }

    #[test]
    fn variable_not_found_message() {
        let err = ResolutionError::VariableNotFound {
            name: "y".into(),
            location: Location::new("", 1, 1),
        };
        assert_eq!(err.to_string(), "at 1:1: `y` is not found in this scope");
        assert_eq!(err.location().line, 1);
    }

    #[test]
    fn diagnostics_collect_in_order() {
        let mut diags = Diagnostics::new();
        assert!(diags.clone().into_result().is_ok());
        diags.push(CheckError::DuplicateMethod {
            name: "a".into(),
            location: Location::synthetic(),
        });
        diags.push(ResolutionError::TypeNotFound {
            name: "B".into(),
            location: Location::synthetic(),
        });
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.checks().count(), 1);
        assert_eq!(diags.resolutions().count(), 1);
        let err: ApexError = diags.into_result().unwrap_err().into();
        assert!(err.is_compilation());
    }

    #[test]
    fn native_error_converts_into_runtime() {
        let err = RuntimeError::Native {
            method: "List.get".into(),
            source: NativeError::Other("boom".into()),
        };
        assert_eq!(err.to_string(), "native method `List.get` failed: boom");
    }
}
