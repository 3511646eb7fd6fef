//! Tree-walking interpreter.
//!
//! Bodies are evaluated directly from the resolved tree. Every statement
//! produces a [`ControlFlow`] sentinel; every expression produces a value or
//! unwinds with a raised exception or a fatal [`RuntimeError`].
//!
//! ## Algorithm
//!
//! - **Statements** return `Normal`, `Return`, `Break`, `Continue` or
//!   `Raise`. Blocks stop at the first non-`Normal` sentinel; loops consume
//!   `Break` and `Continue`; a method call consumes `Return` and turns
//!   `Raise` back into an unwinding expression.
//! - **Binary operators** dispatch on the runtime types of their operands
//!   (see [`operators`]). `&&` and `||` short-circuit.
//! - **Calls** resolve the receiver chain with the compiler's
//!   [`SymbolResolver`], select an overload from the runtime argument types,
//!   then dispatch virtually on the receiver's runtime class. `super.m()`
//!   is not dispatched.
//! - **Constructors** chain through `this(...)` or `super(...)` (implicitly
//!   the no-argument superclass constructor), then run the class's field
//!   initializers, then the rest of the body.
//! - **Static fields** are initialized per class on first access and
//!   persist in [`RuntimeState`] across entry calls.
//!
//! Recursion uses the host stack; [`EngineConfig::max_call_depth`] bounds
//! it and [`EngineConfig::max_steps`] bounds total work.
//!
//! ## Modules
//!
//! - `statements`: statement execution and `try`/`catch`/`finally`
//! - `expressions`: expression evaluation, assignment targets, queries
//! - `calls`: method invocation, natives and constructors
//! - `fields`: variable chains, instance fields, statics and properties
//! - [`operators`]: pure operator semantics on values

mod calls;
mod expressions;
mod fields;
pub mod operators;
mod statements;

use rustc_hash::FxHashMap;
use tracing::debug;

use apex_ast::NodeRef;
use apex_compiler::{SymbolResolver, TypeResolver, TypeScope};
use apex_core::{
    DataType, Env, IdentMap, Location, ResolutionError, RuntimeError, SharedState, TypeHash,
    TypeRef, Value, builtins,
};
use apex_modules::{exception_message, new_exception};
use apex_registry::{MethodRef, NamespaceStore};

use crate::context::EngineConfig;
use crate::query::QueryRunner;

const NULL_DEREFERENCE: &str = "Attempt to de-reference a null object";

// ============================================================================
// Sentinels
// ============================================================================

/// Outcome of executing a statement.
#[derive(Debug, Clone)]
pub enum ControlFlow {
    /// Fall through to the next statement.
    Normal,
    /// Unwind to the enclosing call with a result.
    Return(Value),
    /// Leave the nearest loop.
    Break,
    /// Skip to the nearest loop's next iteration.
    Continue,
    /// Unwind to the nearest matching `catch` with an exception object.
    Raise(Value),
}

impl ControlFlow {
    pub fn is_normal(&self) -> bool {
        matches!(self, ControlFlow::Normal)
    }
}

/// Why an expression did not produce a value.
#[derive(Debug)]
pub(crate) enum Unwind {
    /// A catchable exception.
    Raise(Value),
    /// A fault the program cannot handle.
    Fatal(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Fatal(error)
    }
}

impl From<ResolutionError> for Unwind {
    fn from(error: ResolutionError) -> Self {
        Unwind::Fatal(RuntimeError::Resolution(error))
    }
}

pub(crate) type Eval<T> = Result<T, Unwind>;

/// Unwrap an expression result inside statement execution, turning a raised
/// exception into the `Raise` sentinel.
macro_rules! attempt {
    ($eval:expr) => {
        match $eval {
            Ok(value) => value,
            Err($crate::interpreter::Unwind::Raise(exception)) => {
                return Ok($crate::interpreter::ControlFlow::Raise(exception));
            }
            Err($crate::interpreter::Unwind::Fatal(error)) => return Err(error),
        }
    };
}
pub(crate) use attempt;

// ============================================================================
// State
// ============================================================================

/// State that outlives a single entry call.
#[derive(Debug, Default)]
pub struct RuntimeState {
    /// Static field slots of every class initialized so far.
    statics: FxHashMap<TypeHash, IdentMap<Value>>,
    shared: SharedState,
}

impl RuntimeState {
    pub fn new(echo_debug: bool) -> Self {
        let mut state = Self::default();
        state.shared.echo_debug = echo_debug;
        state
    }

    /// Lines written by `System.debug`, in order.
    pub fn debug_lines(&self) -> &[String] {
        &self.shared.debug_lines
    }

    pub fn take_debug_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.shared.debug_lines)
    }

    pub fn is_initialized(&self, class: TypeHash) -> bool {
        self.statics.contains_key(&class)
    }

    /// Forget every static field and collected debug line.
    pub fn reset(&mut self) {
        self.statics.clear();
        self.shared.debug_lines.clear();
        self.shared.extra.clear();
    }
}

/// A typed local binding.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    ty: DataType,
    value: Value,
}

impl Slot {
    fn new(ty: DataType, value: Value) -> Self {
        let value = coerce(&ty, value);
        Self { ty, value }
    }
}

/// One activation: a method, constructor, accessor, initializer or trigger body.
#[derive(Debug)]
pub(crate) struct Frame {
    env: Env<Slot>,
    /// Receiver, `Null` in static contexts.
    this: Value,
    class: Option<TypeHash>,
    is_static: bool,
    /// The property whose accessor is running, which reads its own slot directly.
    accessor: Option<(TypeHash, String)>,
}

impl Frame {
    fn new(class: Option<TypeHash>, is_static: bool, this: Value) -> Self {
        Self {
            env: Env::new(),
            this,
            class,
            is_static,
            accessor: None,
        }
    }

    fn define(&mut self, name: &str, ty: DataType, value: Value) {
        self.env.define(name, Slot::new(ty, value));
    }
}

impl TypeScope for Frame {
    fn local_type(&self, name: &str) -> Option<DataType> {
        self.env.lookup(name).map(|slot| slot.ty.clone())
    }
}

/// Values stored into `Double` slots are widened.
pub(crate) fn coerce(ty: &DataType, value: Value) -> Value {
    match value {
        Value::Integer(i) if ty.is(builtins::DOUBLE) => Value::Double(i as f64),
        other => other,
    }
}

// ============================================================================
// Interpreter
// ============================================================================

/// Evaluates bodies against a compiled, sealed store.
pub struct Interpreter<'a> {
    store: &'a NamespaceStore,
    config: &'a EngineConfig,
    state: &'a mut RuntimeState,
    query_runner: Option<&'a dyn QueryRunner>,
    frames: Vec<Frame>,
    /// Frame used when no call is active.
    host: Frame,
    depth: usize,
    steps: u64,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        store: &'a NamespaceStore,
        config: &'a EngineConfig,
        state: &'a mut RuntimeState,
    ) -> Self {
        Self {
            store,
            config,
            state,
            query_runner: None,
            frames: Vec::new(),
            host: Frame::new(None, true, Value::Null),
            depth: 0,
            steps: 0,
        }
    }

    pub fn with_query_runner(mut self, runner: Option<&'a dyn QueryRunner>) -> Self {
        self.query_runner = runner;
        self
    }

    /// Number of statements and expressions evaluated so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Call `method` from the host.
    ///
    /// # Errors
    ///
    /// An exception that escapes the call is reported as
    /// [`RuntimeError::UncaughtException`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(
        &mut self,
        method: &MethodRef,
        this: Value,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let result = self.invoke(method, this, args, &Location::synthetic());
        self.settle(result)
    }

    /// Run a body outside any class, as a trigger body runs.
    ///
    /// # Errors
    ///
    /// Same as [`Interpreter::call`].
    pub fn run_body(&mut self, body: &NodeRef) -> Result<(), RuntimeError> {
        let result = self.run_frame(Frame::new(None, true, Value::Null), body);
        self.settle(result).map(|_| ())
    }

    /// Assign static field `name` of `class` from the host.
    ///
    /// # Errors
    ///
    /// Fails if the class's static initializers raise or the field does not exist.
    pub fn set_static(
        &mut self,
        class: TypeHash,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let result = self.write_static(class, name, value, &Location::synthetic());
        self.settle(result).map(|_| ())
    }

    fn settle<T>(&self, result: Eval<T>) -> Result<T, RuntimeError> {
        match result {
            Ok(value) => Ok(value),
            Err(Unwind::Raise(exception)) => Err(self.uncaught(&exception)),
            Err(Unwind::Fatal(error)) => Err(error),
        }
    }

    fn uncaught(&self, exception: &Value) -> RuntimeError {
        let ty = exception.data_type();
        let class = self
            .store
            .class(ty.base)
            .map(|c| c.qualified_name.clone())
            .unwrap_or_else(|| ty.to_string());
        let message = exception_message(exception).unwrap_or_default();
        debug!(class = %class, message = %message, "uncaught exception");
        RuntimeError::UncaughtException { class, message }
    }

    // ========================================================================
    // Frames and limits
    // ========================================================================

    fn frame(&self) -> &Frame {
        self.frames.last().unwrap_or(&self.host)
    }

    fn frame_mut(&mut self) -> &mut Frame {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => &mut self.host,
        }
    }

    /// Count one unit of work against the step budget.
    fn step(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        match self.config.max_steps {
            Some(limit) if self.steps > limit => Err(RuntimeError::StepLimitExceeded { limit }),
            _ => Ok(()),
        }
    }

    fn enter(&mut self) -> Result<(), RuntimeError> {
        if self.depth >= self.config.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.config.max_call_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Execute `body` in a fresh frame and extract the call's result.
    fn run_frame(&mut self, frame: Frame, body: &NodeRef) -> Eval<Value> {
        self.enter()?;
        self.frames.push(frame);
        let flow = self.exec(body);
        self.frames.pop();
        self.leave();
        match flow? {
            ControlFlow::Normal => Ok(Value::Null),
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Raise(exception) => Err(Unwind::Raise(exception)),
            ControlFlow::Break => Err(escape("break", body)),
            ControlFlow::Continue => Err(escape("continue", body)),
        }
    }

    /// Evaluate one expression in a fresh frame, for initializers.
    fn eval_in(&mut self, frame: Frame, expr: &NodeRef) -> Eval<Value> {
        self.frames.push(frame);
        let result = self.eval(expr);
        self.frames.pop();
        result
    }

    // ========================================================================
    // Resolution helpers
    // ========================================================================

    fn resolver(&self) -> SymbolResolver<'_> {
        let frame = self.frame();
        SymbolResolver::new(self.store, frame).in_class(frame.class, frame.is_static)
    }

    fn resolve_type(&self, type_ref: &TypeRef, at: &Location) -> Result<DataType, RuntimeError> {
        TypeResolver::new(self.store)
            .within(self.frame().class)
            .resolve(type_ref, at)
            .map_err(RuntimeError::from)
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    /// A new instance of platform exception `class`.
    fn exception(&self, class: TypeHash, message: impl Into<String>) -> Value {
        let ty = self
            .store
            .data_type(class)
            .unwrap_or_else(|| DataType::simple(class, "Exception"));
        new_exception(ty, message)
    }

    fn raise(&self, class: TypeHash, message: impl Into<String>) -> Unwind {
        Unwind::Raise(self.exception(class, message))
    }

    fn null_exception(&self) -> Value {
        self.exception(builtins::NULL_POINTER_EXCEPTION, NULL_DEREFERENCE)
    }

    fn null_pointer(&self) -> Unwind {
        Unwind::Raise(self.null_exception())
    }

    fn render(&self, value: &Value) -> String {
        crate::inspect::inspect(self.store, value)
    }
}

/// `break` or `continue` reached a body boundary outside any loop.
fn escape(what: &'static str, body: &NodeRef) -> Unwind {
    Unwind::Fatal(RuntimeError::ControlFlowEscape {
        what,
        boundary: "body",
        location: body.location.clone(),
    })
}
