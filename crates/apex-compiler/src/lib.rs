//! Apex Compiler
//!
//! Turns parsed declarations into a resolved, checked namespace store that
//! the interpreter can run.
//!
//! ## Architecture
//!
//! - **Registration**: index every declaration into the store
//! - **Resolution**: resolve every type mention (registry signatures and body nodes)
//! - **Symbols**: confirm every name in a body refers to something and every
//!   receiver-less call or `new` has a fitting overload
//! - **Checking**: structural class rules
//!
//! Registration failures stop the pipeline. Failures in later passes are
//! collected across all classes and reported as one batch.
//!
//! ## Modules
//!
//! - [`checker`]: structural class rules and inheritance cycle detection
//! - [`overload`]: tiered overload selection
//! - [`passes`]: the four passes
//! - [`resolver`]: value-space and call-space identifier chains
//! - [`scope`]: lexical type scopes seen by the resolver
//! - [`type_resolver`]: type mentions to data types
//! - [`visibility`]: access checks

pub mod checker;
pub mod overload;
pub mod passes;
pub mod resolver;
pub mod scope;
pub mod type_resolver;
pub mod visibility;

pub use checker::ClassChecker;
pub use overload::{MatchTier, OverloadMatch, select_overload};
pub use passes::{
    CheckingPass, RegistrationOutput, RegistrationPass, ResolutionPass, SymbolPass,
};
pub use resolver::{
    CallReceiver, FieldStep, ResolvedCall, ResolvedVariable, SymbolResolver, VariableRoot,
};
pub use scope::{EmptyScope, TypeScope};
pub use type_resolver::TypeResolver;
pub use visibility::is_visible;

use tracing::{debug, warn};

use apex_ast::NodeRef;
use apex_core::{Diagnostics, TypeHash};
use apex_registry::NamespaceStore;

/// Result of compilation.
#[derive(Debug, Default)]
pub struct CompilationResult {
    /// User classes registered, inner classes after their outer class.
    pub classes: Vec<TypeHash>,
    pub triggers: usize,
    pub diagnostics: Diagnostics,
}

impl CompilationResult {
    /// Check if compilation succeeded (no diagnostics).
    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// `Ok` with the result, or the diagnostics batch.
    pub fn into_result(self) -> Result<Self, Diagnostics> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.diagnostics)
        }
    }
}

/// The compiler entry point.
pub struct Compiler;

impl Compiler {
    /// Compile `declarations` into `store`.
    ///
    /// On success the store is sealed: nothing more may be registered and
    /// it is read-only from here on.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(store: &mut NamespaceStore, declarations: &[NodeRef]) -> CompilationResult {
        let registered = RegistrationPass::new(store).run(declarations);
        let mut result = CompilationResult {
            classes: registered.classes,
            triggers: registered.triggers,
            diagnostics: registered.diagnostics,
        };
        if !result.is_success() {
            for error in result.diagnostics.iter() {
                warn!(error = %error, "registration failed");
            }
            return result;
        }

        let resolved = ResolutionPass::new(store).run();
        result.diagnostics.extend(resolved.diagnostics);
        let symbols = SymbolPass::new(store).run();
        result.diagnostics.extend(symbols.diagnostics);
        let checked = CheckingPass::new(store).run();
        result.diagnostics.extend(checked.diagnostics);

        debug!(
            classes = result.classes.len(),
            triggers = result.triggers,
            bodies = symbols.bodies,
            errors = result.diagnostics.len(),
            "compilation finished"
        );
        if result.is_success() {
            store.seal();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apex_ast::build::*;
    use apex_core::{Diagnostic, Modifiers, RegistrationError};
    use apex_registry::{ClassKind, ClassType};

    fn store() -> NamespaceStore {
        let mut store = NamespaceStore::new();
        store
            .register_class(ClassType::in_namespace("System", "Integer", ClassKind::Class))
            .unwrap();
        store
    }

    #[test]
    fn successful_compilation_seals_the_store() {
        let mut store = store();
        let class = ClassBuilder::new("A")
            .field(Modifiers::PUBLIC, "Integer", "n", Some(int(1)))
            .method(static_method("get", "Integer", vec![ret(Some(int(2)))]))
            .build();
        let result = Compiler::compile(&mut store, &[class]);
        assert!(result.is_success(), "{}", result.diagnostics);
        assert_eq!(result.classes, vec![TypeHash::from_name("a")]);
        assert!(store.is_sealed());
        assert!(store.register_class(ClassType::new("Late", ClassKind::Class)).is_err());
    }

    #[test]
    fn registration_errors_stop_the_pipeline() {
        let mut store = store();
        let a = ClassBuilder::new("A").build();
        let again = ClassBuilder::new("A").field(Modifiers::PUBLIC, "Missing", "x", None).build();
        let result = Compiler::compile(&mut store, &[a, again]);
        let errors = result.diagnostics.into_vec();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            Diagnostic::Registration(RegistrationError::DuplicateClass { .. })
        ));
        assert!(!store.is_sealed());
    }

    #[test]
    fn later_passes_report_one_batch() {
        let mut store = store();
        let a = ClassBuilder::new("A")
            .field(Modifiers::PUBLIC, "Missing", "x", None)
            .method(MethodBuilder::new("run").body(vec![expr_stmt(name("ghost"))]))
            .method(MethodBuilder::new("f").modifiers(Modifiers::OVERRIDE))
            .build();
        let result = Compiler::compile(&mut store, &[a]);
        assert_eq!(result.diagnostics.len(), 3);
        assert_eq!(result.diagnostics.resolutions().count(), 2);
        assert_eq!(result.diagnostics.checks().count(), 1);
        assert!(result.into_result().is_err());
    }
}
