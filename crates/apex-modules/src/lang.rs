//! Primitive classes: `Object`, `Integer`, `Double`, `String`, `Boolean`
//! and the `SObject` record base.
//!
//! Primitive values are held inline by the interpreter; these classes give
//! them a home in the store (so type mentions resolve) and carry the
//! conversion and string methods.

use apex_core::{CallContext, DataType, NativeError, Value, builtins};
use apex_registry::{ClassType, Method, Module};

use crate::{native, system_class};

fn type_error(message: String) -> NativeError {
    NativeError::raise(builtins::TYPE_EXCEPTION, "TypeException", message)
}

fn string_error(message: String) -> NativeError {
    NativeError::raise(builtins::STRING_EXCEPTION, "StringException", message)
}

// =============================================================================
// CONVERSIONS
// =============================================================================

fn integer_value_of(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let text = ctx.arg_str(0)?.trim();
    text.parse::<i64>()
        .map(Value::Integer)
        .map_err(|_| type_error(format!("Invalid integer: {text}")))
}

fn double_value_of(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let text = ctx.arg_str(0)?.trim();
    text.parse::<f64>()
        .map(Value::Double)
        .map_err(|_| type_error(format!("Invalid double: {text}")))
}

fn boolean_value_of(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Boolean(ctx.arg_str(0)?.eq_ignore_ascii_case("true")))
}

fn string_value_of(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let arg = ctx.arg(0)?;
    Ok(Value::String(ctx.render(arg)))
}

fn string_is_blank(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let blank = match ctx.arg(0)? {
        Value::Null => true,
        other => other.as_str().is_some_and(|s| s.trim().is_empty()),
    };
    Ok(Value::Boolean(blank))
}

// =============================================================================
// STRING METHODS
// =============================================================================

fn length(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Integer(ctx.this_str()?.chars().count() as i64))
}

fn to_upper_case(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::String(ctx.this_str()?.to_uppercase()))
}

fn to_lower_case(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::String(ctx.this_str()?.to_lowercase()))
}

fn trim(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::String(ctx.this_str()?.trim().to_string()))
}

fn contains(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Boolean(ctx.this_str()?.contains(ctx.arg_str(0)?)))
}

fn starts_with(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Boolean(ctx.this_str()?.starts_with(ctx.arg_str(0)?)))
}

fn ends_with(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Boolean(ctx.this_str()?.ends_with(ctx.arg_str(0)?)))
}

fn equals(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let this = ctx.this_str()?;
    Ok(Value::Boolean(ctx.arg(0)?.as_str() == Some(this)))
}

fn equals_ignore_case(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let this = ctx.this_str()?;
    let same = ctx.arg(0)?.as_str().is_some_and(|s| s.eq_ignore_ascii_case(this));
    Ok(Value::Boolean(same))
}

fn index_of(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let this = ctx.this_str()?;
    let index = this
        .find(ctx.arg_str(0)?)
        .map(|byte| this[..byte].chars().count() as i64)
        .unwrap_or(-1);
    Ok(Value::Integer(index))
}

/// Characters `[start, end)`, counted in chars.
fn char_range(text: &str, start: i64, end: i64) -> Result<String, NativeError> {
    let len = text.chars().count() as i64;
    if start < 0 || end > len || start > end {
        return Err(string_error(format!(
            "Ending position out of bounds: {end}"
        )));
    }
    Ok(text
        .chars()
        .skip(start as usize)
        .take((end - start) as usize)
        .collect())
}

fn substring_from(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let text = ctx.this_str()?;
    let start = ctx.arg_integer(0)?;
    let len = text.chars().count() as i64;
    if start < 0 || start > len {
        return Err(string_error(format!("Starting position out of bounds: {start}")));
    }
    char_range(text, start, len).map(Value::String)
}

fn substring_between(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let text = ctx.this_str()?;
    char_range(text, ctx.arg_integer(0)?, ctx.arg_integer(1)?).map(Value::String)
}

// =============================================================================
// SOBJECT METHODS
// =============================================================================

fn sobject_get(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let name = ctx.arg_str(0)?;
    let obj = ctx.this_object()?.borrow();
    Ok(obj.fields.get(name).cloned().unwrap_or_default())
}

fn sobject_put(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let name = ctx.arg_str(0)?.to_string();
    let value = ctx.arg(1)?.clone();
    let mut obj = ctx.this_object()?.borrow_mut();
    Ok(obj.fields.insert(name, value).unwrap_or_default())
}

// =============================================================================
// MODULE
// =============================================================================

fn string_class() -> ClassType {
    let string = DataType::string();
    let integer = DataType::integer();
    let boolean = DataType::boolean();
    system_class("String")
        .with_method(Method::native_static(
            "valueOf",
            vec![DataType::object()],
            string.clone(),
            native(string_value_of),
        ))
        .with_method(Method::native_static(
            "isBlank",
            vec![string.clone()],
            boolean.clone(),
            native(string_is_blank),
        ))
        .with_method(Method::native("length", vec![], integer.clone(), native(length)))
        .with_method(Method::native("toUpperCase", vec![], string.clone(), native(to_upper_case)))
        .with_method(Method::native("toLowerCase", vec![], string.clone(), native(to_lower_case)))
        .with_method(Method::native("trim", vec![], string.clone(), native(trim)))
        .with_method(Method::native(
            "contains",
            vec![string.clone()],
            boolean.clone(),
            native(contains),
        ))
        .with_method(Method::native(
            "startsWith",
            vec![string.clone()],
            boolean.clone(),
            native(starts_with),
        ))
        .with_method(Method::native(
            "endsWith",
            vec![string.clone()],
            boolean.clone(),
            native(ends_with),
        ))
        .with_method(Method::native(
            "equals",
            vec![DataType::object()],
            boolean.clone(),
            native(equals),
        ))
        .with_method(Method::native(
            "equalsIgnoreCase",
            vec![string.clone()],
            boolean,
            native(equals_ignore_case),
        ))
        .with_method(Method::native(
            "indexOf",
            vec![string.clone()],
            integer.clone(),
            native(index_of),
        ))
        .with_method(Method::native(
            "substring",
            vec![integer.clone()],
            string.clone(),
            native(substring_from),
        ))
        .with_method(Method::native(
            "substring",
            vec![integer.clone(), integer],
            string,
            native(substring_between),
        ))
}

/// `Object`, the primitives and `SObject`.
pub fn module() -> Module {
    let string = DataType::string();
    Module::new("lang")
        .with_class(system_class("Object"))
        .with_class(system_class("Integer").with_method(Method::native_static(
            "valueOf",
            vec![string.clone()],
            DataType::integer(),
            native(integer_value_of),
        )))
        .with_class(system_class("Double").with_method(Method::native_static(
            "valueOf",
            vec![string.clone()],
            DataType::double(),
            native(double_value_of),
        )))
        .with_class(system_class("Boolean").with_method(Method::native_static(
            "valueOf",
            vec![string.clone()],
            DataType::boolean(),
            native(boolean_value_of),
        )))
        .with_class(string_class())
        .with_class(
            system_class("SObject")
                .with_method(Method::native(
                    "get",
                    vec![string.clone()],
                    DataType::object(),
                    native(sobject_get),
                ))
                .with_method(Method::native(
                    "put",
                    vec![string, DataType::object()],
                    DataType::object(),
                    native(sobject_put),
                )),
        )
}
