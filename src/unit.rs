//! Compilation unit API.
//!
//! A unit collects parsed declarations, compiles them against the class
//! table of the [`Context`](crate::Context) it was created from, and runs
//! entry methods and triggers. Static fields and `System.debug` output
//! persist between invocations of the same unit.
//!
//! # Example
//!
//! ```
//! use apex::{Context, Value};
//! use apex_ast::build::*;
//! use apex_ast::BinaryOp;
//! use apex_core::Modifiers;
//!
//! let ctx = Context::with_default_modules().unwrap();
//! let mut unit = ctx.create_unit();
//! unit.add_declaration(
//!     ClassBuilder::new("Greeter")
//!         .method(
//!             MethodBuilder::new("greet")
//!                 .modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
//!                 .returns("String")
//!                 .param("String", "who")
//!                 .body(vec![ret(Some(binary(BinaryOp::Add, string("Hello, "), name("who"))))]),
//!         )
//!         .build(),
//! )
//! .unwrap();
//! unit.build().unwrap();
//!
//! let greeting = unit.invoke("Greeter.greet", &[Value::from("Ada")]).unwrap();
//! assert_eq!(greeting.as_str(), Some("Hello, Ada"));
//! ```

use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use apex_ast::{NodeRef, TriggerEvent, TriggerOperation, TriggerTiming};
use apex_compiler::{Compiler, TypeResolver, select_overload};
use apex_core::{
    ApexError, DataType, Location, ResolutionError, RuntimeError, Value, builtins,
};
use apex_modules::trigger::FLAGS;
use apex_registry::{MethodKind, NamespaceStore};

use crate::context::EngineConfig;
use crate::interpreter::{Interpreter, RuntimeState};
use crate::query::QueryRunner;

/// A compilation unit ready for execution.
///
/// 1. Create a unit with [`Context::create_unit`](crate::Context::create_unit)
/// 2. Add parsed declarations with [`Unit::add_declaration`]
/// 3. Compile with [`Unit::build`]
/// 4. Run entry methods with [`Unit::invoke`] and triggers with [`Unit::fire_trigger`]
pub struct Unit {
    store: NamespaceStore,
    config: EngineConfig,
    query_runner: Option<Rc<dyn QueryRunner>>,
    /// Shared with the creating context, which rejects installs once set.
    sealed: Rc<Cell<bool>>,
    declarations: Vec<NodeRef>,
    state: RuntimeState,
    is_built: bool,
}

impl Unit {
    pub(crate) fn new(
        store: NamespaceStore,
        config: EngineConfig,
        query_runner: Option<Rc<dyn QueryRunner>>,
        sealed: Rc<Cell<bool>>,
    ) -> Self {
        let state = RuntimeState::new(config.echo_debug_output);
        Self {
            store,
            config,
            query_runner,
            sealed,
            declarations: Vec::new(),
            state,
            is_built: false,
        }
    }

    /// Add a class, interface or trigger declaration.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::AlreadyBuilt`] once the unit has been built.
    pub fn add_declaration(&mut self, declaration: NodeRef) -> Result<(), UnitError> {
        if self.is_built {
            return Err(UnitError::AlreadyBuilt);
        }
        self.declarations.push(declaration);
        Ok(())
    }

    /// Add several declarations at once.
    ///
    /// # Errors
    ///
    /// Same as [`Unit::add_declaration`].
    pub fn add_declarations(
        &mut self,
        declarations: impl IntoIterator<Item = NodeRef>,
    ) -> Result<(), UnitError> {
        for declaration in declarations {
            self.add_declaration(declaration)?;
        }
        Ok(())
    }

    /// Compile every declaration.
    ///
    /// Runs registration, resolution, symbol checking and class checking
    /// through [`Compiler::compile`] on a copy of the class table.
    /// Registration failures stop the build; later failures are collected
    /// into one batch. A successful build seals the class table and the
    /// context the unit came from. A failed build keeps the unit's class
    /// table and declarations, so it can be retried; type mentions already
    /// resolved inside declaration bodies stay resolved.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::AlreadyBuilt`], [`UnitError::NoDeclarations`], or
    /// the collected diagnostics as [`ApexError::Compilation`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(&mut self) -> Result<(), UnitError> {
        if self.is_built {
            return Err(UnitError::AlreadyBuilt);
        }
        if self.declarations.is_empty() {
            return Err(UnitError::NoDeclarations);
        }

        let mut store = self.store.clone();
        let compiled = Compiler::compile(&mut store, &self.declarations)
            .into_result()
            .map_err(ApexError::Compilation)?;

        self.store = store;
        self.sealed.set(true);
        self.is_built = true;
        debug!(
            classes = compiled.classes.len(),
            triggers = compiled.triggers,
            "unit built"
        );
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.is_built
    }

    /// The class table: the context's copy before build, the compiled one after.
    pub fn store(&self) -> &NamespaceStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answer this unit's embedded queries with `runner`.
    pub fn set_query_runner(&mut self, runner: Rc<dyn QueryRunner>) {
        self.query_runner = Some(runner);
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Call the public static method `entry`, written `Class.method` or
    /// `Outer.Inner.method`, with `args`.
    ///
    /// The overload is selected from the runtime types of `args`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::NotBuilt`] before a successful build. Resolution
    /// failures, uncaught exceptions and fatal runtime errors are reported as
    /// [`ApexError::Runtime`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn invoke(&mut self, entry: &str, args: &[Value]) -> Result<Value, UnitError> {
        if !self.is_built {
            return Err(UnitError::NotBuilt);
        }
        let at = Location::synthetic();
        let Some((class_name, method_name)) = entry.rsplit_once('.') else {
            return Err(RuntimeError::from(ResolutionError::MethodNotFound {
                name: entry.to_string(),
                owner: String::new(),
                location: at,
            })
            .into());
        };

        let names: Vec<String> = class_name.split('.').map(str::to_string).collect();
        let class = TypeResolver::new(&self.store)
            .lookup(&names)
            .ok_or_else(|| ResolutionError::TypeNotFound {
                name: class_name.to_string(),
                location: at.clone(),
            })
            .map_err(RuntimeError::from)?;
        let candidates = self.store.method_candidates(class, method_name, MethodKind::Static);
        if candidates.is_empty() {
            return Err(RuntimeError::from(ResolutionError::MethodNotFound {
                name: method_name.to_string(),
                owner: class_name.to_string(),
                location: at,
            })
            .into());
        }
        let arg_types: Vec<DataType> = args.iter().map(Value::data_type).collect();
        let selected = select_overload(&self.store, &candidates, &arg_types, None, method_name, &at)
            .map_err(RuntimeError::from)?
            .method;

        debug!(entry, args = args.len(), "invoking entry method");
        let mut interpreter = Interpreter::new(&self.store, &self.config, &mut self.state)
            .with_query_runner(self.query_runner.as_deref());
        Ok(interpreter.call(&selected, Value::Null, args.to_vec())?)
    }

    /// Run every trigger on `object` registered for `event`.
    ///
    /// `Trigger.new` holds `new` except on delete, `Trigger.old` holds `old`
    /// except on insert and undelete. The context fields are reset to null
    /// afterwards. Returns the number of triggers run.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::NotBuilt`] before a successful build, and the
    /// first failing trigger's error as [`ApexError::Runtime`]; triggers
    /// after it do not run.
    pub fn fire_trigger(
        &mut self,
        object: &str,
        event: TriggerEvent,
        new: Vec<Value>,
        old: Vec<Value>,
    ) -> Result<usize, UnitError> {
        if !self.is_built {
            return Err(UnitError::NotBuilt);
        }
        let names: Vec<String> = object.split('.').map(str::to_string).collect();
        let Some(object_type) = TypeResolver::new(&self.store).lookup(&names) else {
            return Err(RuntimeError::from(ResolutionError::TypeNotFound {
                name: object.to_string(),
                location: Location::synthetic(),
            })
            .into());
        };

        let store = &self.store;
        let triggers: Vec<_> = store.triggers_for(object_type, event).collect();
        if triggers.is_empty() {
            return Ok(0);
        }
        let mut interpreter = Interpreter::new(store, &self.config, &mut self.state)
            .with_query_runner(self.query_runner.as_deref());
        bind_trigger_context(&mut interpreter, event, new, old)?;

        let mut fired = 0;
        let mut outcome = Ok(());
        for trigger in triggers {
            debug!(trigger = %trigger.name, %event, "firing trigger");
            outcome = interpreter.run_body(&trigger.body);
            if outcome.is_err() {
                break;
            }
            fired += 1;
        }
        clear_trigger_context(&mut interpreter)?;
        outcome?;
        Ok(fired)
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Lines written by `System.debug` so far.
    pub fn debug_output(&self) -> &[String] {
        self.state.debug_lines()
    }

    pub fn take_debug_output(&mut self) -> Vec<String> {
        self.state.take_debug_lines()
    }

    /// Render `value` the way `System.debug` prints it.
    pub fn inspect(&self, value: &Value) -> String {
        crate::inspect::inspect(&self.store, value)
    }

    /// Forget static field values and debug output.
    pub fn reset_state(&mut self) {
        self.state.reset();
    }
}

fn bind_trigger_context(
    interpreter: &mut Interpreter<'_>,
    event: TriggerEvent,
    new: Vec<Value>,
    old: Vec<Value>,
) -> Result<(), RuntimeError> {
    let records = DataType::simple(builtins::SOBJECT, "SObject");
    let op = event.operation;
    let size = if op == TriggerOperation::Delete { old.len() } else { new.len() };
    let new = match op {
        TriggerOperation::Delete => Value::Null,
        _ => Value::list(records.clone(), new),
    };
    let old = match op {
        TriggerOperation::Insert | TriggerOperation::Undelete => Value::Null,
        _ => Value::list(records, old),
    };

    interpreter.set_static(builtins::TRIGGER, "new", new)?;
    interpreter.set_static(builtins::TRIGGER, "old", old)?;
    interpreter.set_static(builtins::TRIGGER, "size", Value::Integer(size as i64))?;
    for flag in FLAGS {
        let set = match *flag {
            "isExecuting" => true,
            "isBefore" => event.timing == TriggerTiming::Before,
            "isAfter" => event.timing == TriggerTiming::After,
            "isInsert" => op == TriggerOperation::Insert,
            "isUpdate" => op == TriggerOperation::Update,
            "isDelete" => op == TriggerOperation::Delete,
            "isUndelete" => op == TriggerOperation::Undelete,
            _ => false,
        };
        interpreter.set_static(builtins::TRIGGER, flag, Value::Boolean(set))?;
    }
    Ok(())
}

fn clear_trigger_context(interpreter: &mut Interpreter<'_>) -> Result<(), RuntimeError> {
    for name in ["new", "old", "size"].iter().chain(FLAGS) {
        interpreter.set_static(builtins::TRIGGER, name, Value::Null)?;
    }
    Ok(())
}

/// Errors from adding declarations, building or running a unit.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("unit has already been built")]
    AlreadyBuilt,

    #[error("unit has not been built")]
    NotBuilt,

    #[error("no declarations added to unit")]
    NoDeclarations,

    #[error(transparent)]
    Apex(#[from] ApexError),
}

impl From<RuntimeError> for UnitError {
    fn from(error: RuntimeError) -> Self {
        UnitError::Apex(ApexError::Runtime(error))
    }
}

impl UnitError {
    /// The runtime error this wraps, if any.
    pub fn as_runtime(&self) -> Option<&RuntimeError> {
        match self {
            UnitError::Apex(ApexError::Runtime(error)) => Some(error),
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
    use crate::Context;
    use apex_ast::build::*;
    use apex_ast::{BinaryOp, NodeKind};

    fn counter() -> NodeRef {
        ClassBuilder::new("Counter")
            .field(
                apex_core::Modifiers::PRIVATE | apex_core::Modifiers::STATIC,
                "Integer",
                "count",
                Some(int(0)),
            )
            .method(static_method(
                "next",
                "Integer",
                vec![
                    expr_stmt(compound(BinaryOp::Add, name("count"), int(1))),
                    ret(Some(name("count"))),
                ],
            ))
            .build()
    }

    #[test]
    fn unit_build_requires_declarations() {
        let ctx = Context::with_default_modules().unwrap();
        let mut unit = ctx.create_unit();
        assert!(matches!(unit.build(), Err(UnitError::NoDeclarations)));
    }

    #[test]
    fn unit_rejects_changes_after_build() {
        let ctx = Context::with_default_modules().unwrap();
        let mut unit = ctx.create_unit();
        unit.add_declaration(counter()).unwrap();
        unit.build().unwrap();
        assert!(unit.is_built());
        assert!(unit.store().is_sealed());
        assert!(matches!(unit.add_declaration(counter()), Err(UnitError::AlreadyBuilt)));
        assert!(matches!(unit.build(), Err(UnitError::AlreadyBuilt)));
    }

    #[test]
    fn unit_invoke_requires_build() {
        let ctx = Context::with_default_modules().unwrap();
        let mut unit = ctx.create_unit();
        unit.add_declaration(counter()).unwrap();
        assert!(matches!(unit.invoke("Counter.next", &[]), Err(UnitError::NotBuilt)));
    }

    #[test]
    fn unit_statics_persist_between_invocations() {
        let ctx = Context::with_default_modules().unwrap();
        let mut unit = ctx.create_unit();
        unit.add_declaration(counter()).unwrap();
        unit.build().unwrap();
        assert_eq!(unit.invoke("Counter.next", &[]).unwrap().as_integer(), Some(1));
        assert_eq!(unit.invoke("Counter.next", &[]).unwrap().as_integer(), Some(2));

        unit.reset_state();
        assert_eq!(unit.invoke("Counter.next", &[]).unwrap().as_integer(), Some(1));
    }

    #[test]
    fn unit_invoke_unknown_entry() {
        let ctx = Context::with_default_modules().unwrap();
        let mut unit = ctx.create_unit();
        unit.add_declaration(counter()).unwrap();
        unit.build().unwrap();

        let err = unit.invoke("Missing.run", &[]).unwrap_err();
        assert!(matches!(
            err.as_runtime(),
            Some(RuntimeError::Resolution(ResolutionError::TypeNotFound { .. }))
        ));
        let err = unit.invoke("Counter.missing", &[]).unwrap_err();
        assert!(matches!(
            err.as_runtime(),
            Some(RuntimeError::Resolution(ResolutionError::MethodNotFound { .. }))
        ));
    }

    #[test]
    fn unit_private_entry_is_not_visible() {
        let ctx = Context::with_default_modules().unwrap();
        let mut unit = ctx.create_unit();
        unit.add_declaration(
            ClassBuilder::new("Hidden")
                .method(
                    MethodBuilder::new("secret")
                        .modifiers(apex_core::Modifiers::STATIC)
                        .returns("Integer")
                        .body(vec![ret(Some(int(1)))]),
                )
                .build(),
        )
        .unwrap();
        unit.build().unwrap();
        let err = unit.invoke("Hidden.secret", &[]).unwrap_err();
        assert!(matches!(
            err.as_runtime(),
            Some(RuntimeError::Resolution(ResolutionError::NotVisible { .. }))
        ));
    }

    #[test]
    fn unit_failed_build_can_be_retried() {
        let ctx = Context::with_default_modules().unwrap();
        let mut unit = ctx.create_unit();
        unit.add_declaration(ClassBuilder::new("Child").extends("Parent").build())
            .unwrap();
        let err = unit.build().unwrap_err();
        assert!(matches!(err, UnitError::Apex(ref e) if e.is_compilation()));
        assert!(!unit.is_built());

        unit.add_declaration(ClassBuilder::new("Parent").build()).unwrap();
        unit.build().unwrap();
        assert!(unit.is_built());
    }

    #[test]
    fn unit_retry_keeps_body_type_resolutions() {
        let ctx = Context::with_default_modules().unwrap();
        let mut unit = ctx.create_unit();
        let local_decl = local("Integer", "n", Some(call("Helper.two", vec![])));
        let main = ClassBuilder::new("Main")
            .method(static_method(
                "run",
                "Integer",
                vec![share(&local_decl), ret(Some(name("n")))],
            ))
            .build();
        unit.add_declaration(main).unwrap();
        assert!(unit.build().is_err());

        let NodeKind::LocalVariable(decl) = &local_decl.kind else {
            panic!("expected a local declaration");
        };
        assert!(decl.type_ref.is_resolved());

        unit.add_declaration(
            ClassBuilder::new("Helper")
                .method(static_method("two", "Integer", vec![ret(Some(int(2)))]))
                .build(),
        )
        .unwrap();
        unit.build().unwrap();
        assert_eq!(unit.invoke("Main.run", &[]).unwrap().as_integer(), Some(2));
    }
}
