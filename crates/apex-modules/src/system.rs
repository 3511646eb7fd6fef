//! The `System` class: debug output and assertions.
//!
//! `System.debug` appends the rendered argument to
//! [`SharedState::debug_lines`](apex_core::SharedState), which the host reads
//! back after a run. With echo enabled the line is also logged through
//! `tracing` under the `apex::debug` target.

use tracing::info;

use apex_core::{CallContext, DataType, NativeError, Value, builtins};
use apex_registry::{Method, Module};

use crate::{native, system_class};

fn assertion_failed(detail: String) -> NativeError {
    NativeError::raise(
        builtins::ASSERT_EXCEPTION,
        "AssertException",
        format!("Assertion Failed: {detail}"),
    )
}

/// Optional trailing message argument, rendered.
fn message_arg(ctx: &CallContext<'_>, index: usize) -> Option<String> {
    ctx.args()
        .get(index)
        .filter(|v| !v.is_null())
        .map(|v| ctx.render(v))
}

fn debug(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let line = ctx.render(ctx.arg(0)?);
    let shared = ctx.shared();
    if shared.echo_debug {
        info!(target: "apex::debug", "{line}");
    }
    shared.debug_lines.push(line);
    Ok(Value::Null)
}

fn assert(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    if ctx.arg_bool(0)? {
        return Ok(Value::Null);
    }
    Err(assertion_failed(message_arg(ctx, 1).unwrap_or_default()))
}

fn assert_equals(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let expected = ctx.arg(0)?;
    let actual = ctx.arg(1)?;
    if expected.same(actual) {
        return Ok(Value::Null);
    }
    let mut detail = format!(
        "Expected: {}, Actual: {}",
        ctx.render(expected),
        ctx.render(actual)
    );
    if let Some(message) = message_arg(ctx, 2) {
        detail = format!("{message}. {detail}");
    }
    Err(assertion_failed(detail))
}

fn assert_not_equals(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let unexpected = ctx.arg(0)?;
    let actual = ctx.arg(1)?;
    if !unexpected.same(actual) {
        return Ok(Value::Null);
    }
    let mut detail = format!("Same value: {}", ctx.render(actual));
    if let Some(message) = message_arg(ctx, 2) {
        detail = format!("{message}. {detail}");
    }
    Err(assertion_failed(detail))
}

pub fn module() -> Module {
    let object = DataType::object();
    let boolean = DataType::boolean();
    let void = DataType::void();
    let system = system_class("System")
        .with_method(Method::native_static(
            "debug",
            vec![object.clone()],
            void.clone(),
            native(debug),
        ))
        .with_method(Method::native_static(
            "assert",
            vec![boolean.clone()],
            void.clone(),
            native(assert),
        ))
        .with_method(Method::native_static(
            "assert",
            vec![boolean, object.clone()],
            void.clone(),
            native(assert),
        ))
        .with_method(Method::native_static(
            "assertEquals",
            vec![object.clone(), object.clone()],
            void.clone(),
            native(assert_equals),
        ))
        .with_method(Method::native_static(
            "assertEquals",
            vec![object.clone(), object.clone(), object.clone()],
            void.clone(),
            native(assert_equals),
        ))
        .with_method(Method::native_static(
            "assertNotEquals",
            vec![object.clone(), object.clone()],
            void.clone(),
            native(assert_not_equals),
        ))
        .with_method(Method::native_static(
            "assertNotEquals",
            vec![object.clone(), object.clone(), object],
            void,
            native(assert_not_equals),
        ));
    Module::new("system").with_class(system)
}
