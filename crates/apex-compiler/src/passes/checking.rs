//! Checking Pass - run the structural class rules.
//!
//! Inheritance cycles are reported first, then every declared class is
//! checked independently. All violations are collected.

use tracing::{debug, warn};

use apex_core::Diagnostics;
use apex_registry::NamespaceStore;

use crate::checker::ClassChecker;

/// Output of the checking pass.
#[derive(Debug, Default)]
pub struct CheckingOutput {
    pub classes: usize,
    pub diagnostics: Diagnostics,
}

pub struct CheckingPass<'a> {
    store: &'a NamespaceStore,
}

impl<'a> CheckingPass<'a> {
    pub fn new(store: &'a NamespaceStore) -> Self {
        Self { store }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> CheckingOutput {
        let checker = ClassChecker::new(self.store);
        let mut output = CheckingOutput::default();
        for cycle in checker.find_cycles() {
            warn!(error = %cycle, "class check failed");
            output.diagnostics.push(cycle);
        }
        for class in self.store.classes().filter(|c| c.declaration.is_some()) {
            let mut found = Diagnostics::new();
            checker.check_class(class, &mut found);
            for error in found.iter() {
                warn!(error = %error, "class check failed");
            }
            debug!(class = %class.qualified_name, errors = found.len(), "checked class");
            output.diagnostics.extend(found);
            output.classes += 1;
        }
        output
    }
}
