//! Engine context: configuration, installed modules and schema.
//!
//! A `Context` owns the class table every unit starts from. Modules and
//! schema objects are installed into it during a single-writer phase; the
//! first successful [`Unit::build`] seals the context and any later install
//! is rejected with [`ContextError::AlreadySealed`].
//!
//! # Example
//!
//! ```
//! use apex::{Context, EngineConfig, SchemaMap};
//!
//! let mut ctx = Context::new(EngineConfig::default().with_max_call_depth(64));
//! for module in apex_modules::default_modules() {
//!     ctx.install(module).unwrap();
//! }
//! ctx.load_schema(&SchemaMap::new().with_object("Account", &[("Name", "String")]))
//!     .unwrap();
//! let unit = ctx.create_unit();
//! assert!(!unit.is_built());
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use apex_core::ContextError;
use apex_modules::default_modules;
use apex_registry::{Module, NamespaceStore, SchemaMap, register_schema};

use crate::query::QueryRunner;
use crate::unit::Unit;

// ============================================================================
// EngineConfig
// ============================================================================

/// Limits and switches for interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Deepest allowed chain of nested method calls.
    pub max_call_depth: usize,
    /// Budget of evaluated statements and expressions per entry call.
    pub max_steps: Option<u64>,
    /// Also log `System.debug` lines through `tracing`.
    pub echo_debug_output: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 512,
            max_steps: None,
            echo_debug_output: false,
        }
    }
}

impl EngineConfig {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn with_echo_debug_output(mut self, echo: bool) -> Self {
        self.echo_debug_output = echo;
        self
    }
}

// ============================================================================
// Context
// ============================================================================

/// Top-level container that owns installed modules.
///
/// The Context:
/// - Holds the [`EngineConfig`] handed to every unit
/// - Installs native [`Module`]s and schema objects into its class table
/// - Creates [`Unit`]s, each starting from a copy of that table
pub struct Context {
    config: EngineConfig,
    store: NamespaceStore,
    /// Names of installed modules, in install order.
    modules: Vec<String>,
    query_runner: Option<Rc<dyn QueryRunner>>,
    /// Set by the first unit that builds successfully.
    sealed: Rc<Cell<bool>>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("modules", &self.modules)
            .field("classes", &self.store.class_count())
            .field("sealed", &self.is_sealed())
            .finish_non_exhaustive()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Context {
    /// Create an empty context.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: NamespaceStore::new(),
            modules: Vec::new(),
            query_runner: None,
            sealed: Rc::new(Cell::new(false)),
        }
    }

    /// Create a context with the standard library installed and the
    /// default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any default module fails to install.
    pub fn with_default_modules() -> Result<Self, ContextError> {
        Self::with_config(EngineConfig::default())
    }

    /// [`Context::with_default_modules`] with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any default module fails to install.
    pub fn with_config(config: EngineConfig) -> Result<Self, ContextError> {
        let mut ctx = Self::new(config);
        for module in default_modules() {
            ctx.install(module)?;
        }
        Ok(ctx)
    }

    /// Install a module's classes.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::AlreadySealed`] once a unit has been built,
    /// and [`ContextError::Install`] if a class fails to register.
    pub fn install(&mut self, module: Module) -> Result<(), ContextError> {
        let name = module.name().to_string();
        if self.is_sealed() {
            return Err(ContextError::AlreadySealed { module: name });
        }
        module
            .install(&mut self.store)
            .map_err(|source| ContextError::Install {
                module: name.clone(),
                source,
            })?;
        self.modules.push(name);
        Ok(())
    }

    /// Register one class per schema object.
    ///
    /// # Errors
    ///
    /// Same as [`Context::install`]; the module name reported is `schema`.
    pub fn load_schema(&mut self, schema: &SchemaMap) -> Result<(), ContextError> {
        const MODULE: &str = "schema";
        if self.is_sealed() {
            return Err(ContextError::AlreadySealed {
                module: MODULE.to_string(),
            });
        }
        let hashes = register_schema(&mut self.store, schema).map_err(|source| {
            ContextError::Install {
                module: MODULE.to_string(),
                source,
            }
        })?;
        debug!(objects = hashes.len(), "loaded schema");
        Ok(())
    }

    /// Answer embedded queries of every unit created afterwards with `runner`.
    pub fn set_query_runner(&mut self, runner: Rc<dyn QueryRunner>) {
        self.query_runner = Some(runner);
    }

    /// Whether a unit built from this context has sealed it.
    pub fn is_sealed(&self) -> bool {
        self.sealed.get()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Names of installed modules, in install order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// The class table units start from.
    pub fn store(&self) -> &NamespaceStore {
        &self.store
    }

    /// Create a compilation unit over a copy of the current class table.
    pub fn create_unit(&self) -> Unit {
        Unit::new(
            self.store.clone(),
            self.config.clone(),
            self.query_runner.clone(),
            Rc::clone(&self.sealed),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
