//! Native function storage and call context.
//!
//! Standard-library methods are Rust closures registered on a class. The
//! interpreter invokes them with a [`CallContext`] giving access to the
//! receiver, the evaluated arguments and the engine's shared state.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::NativeError;
use crate::value::{ObjectRef, Value};

/// Type-erased native function.
///
/// The callable is wrapped in `Arc` so method tables can be cloned cheaply.
pub struct NativeFn {
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn call(&self, ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
        self.inner.call(ctx)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}

impl Clone for NativeFn {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Trait for callable native functions.
pub trait NativeCallable {
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<Value, NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext<'_>) -> Result<Value, NativeError>,
{
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
        (self)(ctx)
    }
}

/// State shared by every native call of one interpreter.
#[derive(Debug, Default)]
pub struct SharedState {
    /// Lines written by `System.debug`, in order.
    pub debug_lines: Vec<String>,
    /// Also emit `System.debug` lines through `tracing`.
    pub echo_debug: bool,
    /// Open-ended slots for native modules.
    pub extra: FxHashMap<String, Value>,
}

/// Context passed to a native closure.
pub struct CallContext<'a> {
    this: &'a Value,
    args: &'a [Value],
    shared: &'a mut SharedState,
    render: &'a dyn Fn(&Value) -> String,
}

impl<'a> CallContext<'a> {
    /// `this` is `Value::Null` for static calls.
    pub fn new(
        this: &'a Value,
        args: &'a [Value],
        shared: &'a mut SharedState,
        render: &'a dyn Fn(&Value) -> String,
    ) -> Self {
        Self {
            this,
            args,
            shared,
            render,
        }
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }

    pub fn arg(&self, index: usize) -> Result<&Value, NativeError> {
        self.args
            .get(index)
            .ok_or(NativeError::ArgumentIndexOutOfBounds {
                index,
                count: self.args.len(),
            })
    }

    pub fn arg_integer(&self, index: usize) -> Result<i64, NativeError> {
        let v = self.arg(index)?;
        v.as_integer().ok_or_else(|| NativeError::ArgumentType {
            index,
            expected: "Integer",
            actual: v.type_name(),
        })
    }

    /// Numeric argument, widening Integer to Double.
    pub fn arg_double(&self, index: usize) -> Result<f64, NativeError> {
        let v = self.arg(index)?;
        v.as_double().ok_or_else(|| NativeError::ArgumentType {
            index,
            expected: "Double",
            actual: v.type_name(),
        })
    }

    pub fn arg_str(&self, index: usize) -> Result<&str, NativeError> {
        let v = self.arg(index)?;
        v.as_str().ok_or_else(|| NativeError::ArgumentType {
            index,
            expected: "String",
            actual: v.type_name(),
        })
    }

    pub fn arg_bool(&self, index: usize) -> Result<bool, NativeError> {
        let v = self.arg(index)?;
        v.as_bool().ok_or_else(|| NativeError::ArgumentType {
            index,
            expected: "Boolean",
            actual: v.type_name(),
        })
    }

    pub fn this(&self) -> &Value {
        self.this
    }

    /// Receiver as an object instance.
    pub fn this_object(&self) -> Result<&ObjectRef, NativeError> {
        self.this
            .as_object()
            .ok_or_else(|| {
                NativeError::invalid_this(format!("expected object, got {}", self.this.type_name()))
            })
    }

    /// Receiver as a String primitive.
    pub fn this_str(&self) -> Result<&str, NativeError> {
        self.this
            .as_str()
            .ok_or_else(|| {
                NativeError::invalid_this(format!("expected String, got {}", self.this.type_name()))
            })
    }

    pub fn shared(&mut self) -> &mut SharedState {
        self.shared
    }

    /// Render a value the way string conversion does.
    pub fn render(&self, value: &Value) -> String {
        (self.render)(value)
    }
}
