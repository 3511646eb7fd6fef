//! Native modules.
//!
//! A [`Module`] is a batch of prebuilt [`ClassType`]s (usually with native
//! method bodies) that is installed into a [`NamespaceStore`] before any user
//! code is registered.

use tracing::debug;

use apex_core::{RegistrationError, TypeHash};

use crate::class_type::ClassType;
use crate::store::NamespaceStore;

/// A named group of classes to install.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    classes: Vec<ClassType>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: ClassType) -> Self {
        self.classes.push(class);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn classes(&self) -> &[ClassType] {
        &self.classes
    }

    /// Register every class, stopping at the first failure.
    pub fn install(self, store: &mut NamespaceStore) -> Result<Vec<TypeHash>, RegistrationError> {
        let mut hashes = Vec::with_capacity(self.classes.len());
        for class in self.classes {
            hashes.push(store.register_class(class)?);
        }
        debug!(module = %self.name, classes = hashes.len(), "installed module");
        Ok(hashes)
    }
}
