//! `Exception` and the platform exception classes.
//!
//! An exception is an ordinary object whose message is kept in
//! [`Object::extra`] under [`MESSAGE_KEY`]. User classes extend `Exception`
//! like any other class; the interpreter raises platform failures by
//! building instances of the subclasses registered here.

use apex_core::{
    CallContext, DataType, MESSAGE_KEY, NativeError, Object, TypeHash, TypeRef, Value, builtins,
};
use apex_registry::{ClassType, Method, Module};

use crate::{native, system_class};

/// Platform exception classes, all direct subclasses of `Exception`.
pub const PLATFORM_EXCEPTIONS: &[(TypeHash, &str)] = &[
    (builtins::NULL_POINTER_EXCEPTION, "NullPointerException"),
    (builtins::MATH_EXCEPTION, "MathException"),
    (builtins::TYPE_EXCEPTION, "TypeException"),
    (builtins::LIST_EXCEPTION, "ListException"),
    (builtins::QUERY_EXCEPTION, "QueryException"),
    (builtins::ASSERT_EXCEPTION, "AssertException"),
    (builtins::STRING_EXCEPTION, "StringException"),
];

/// A new instance of exception class `ty` carrying `message`.
pub fn new_exception(ty: DataType, message: impl Into<String>) -> Value {
    let value = Value::new_object(ty);
    if let Some(obj) = value.as_object() {
        obj.borrow_mut()
            .extra
            .insert(MESSAGE_KEY.to_string(), Value::String(message.into()));
    }
    value
}

/// Message of an exception instance; `None` for non-objects or when unset.
pub fn exception_message(value: &Value) -> Option<String> {
    let obj = value.as_object()?.borrow();
    obj.extra.get(MESSAGE_KEY).and_then(|m| m.as_str().map(str::to_string))
}

/// `System.`-qualified name for platform classes, the plain name otherwise.
fn type_name(class: &DataType) -> String {
    let platform = class.base == builtins::EXCEPTION
        || PLATFORM_EXCEPTIONS.iter().any(|(hash, _)| *hash == class.base);
    if platform {
        format!("System.{}", class.name)
    } else {
        class.name.to_string()
    }
}

fn describe(obj: &Object, _render: &dyn Fn(&Value) -> String) -> String {
    match obj.extra.get(MESSAGE_KEY).and_then(Value::as_str) {
        Some(message) => format!("{}: {message}", type_name(&obj.class)),
        None => type_name(&obj.class),
    }
}

// =============================================================================
// METHODS
// =============================================================================

fn construct(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let message = match ctx.arg_count() {
        0 => Value::Null,
        _ => ctx.arg(0)?.clone(),
    };
    if !message.is_null() {
        let text = ctx.render(&message);
        ctx.this_object()?
            .borrow_mut()
            .extra
            .insert(MESSAGE_KEY.to_string(), Value::String(text));
    }
    Ok(Value::Null)
}

fn get_message(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let obj = ctx.this_object()?.borrow();
    Ok(obj.extra.get(MESSAGE_KEY).cloned().unwrap_or_default())
}

fn set_message(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let message = ctx.arg(0)?.clone();
    ctx.this_object()?
        .borrow_mut()
        .extra
        .insert(MESSAGE_KEY.to_string(), message);
    Ok(Value::Null)
}

fn get_type_name(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let obj = ctx.this_object()?.borrow();
    Ok(Value::String(type_name(&obj.class)))
}

/// Constructors `()` and `(String)`. Constructors are not inherited, so
/// every platform exception carries its own pair.
fn with_constructors(class: ClassType) -> ClassType {
    let name = class.name.clone();
    class
        .with_constructor(Method::native(
            name.as_str(),
            vec![],
            DataType::void(),
            native(construct),
        ))
        .with_constructor(Method::native(
            name.as_str(),
            vec![DataType::string()],
            DataType::void(),
            native(construct),
        ))
}

/// `Exception` and its platform subclasses.
pub fn module() -> Module {
    let string = DataType::string();
    let base = with_constructors(system_class("Exception"))
        .with_to_string(describe)
        .with_method(Method::native("getMessage", vec![], string.clone(), native(get_message)))
        .with_method(Method::native(
            "setMessage",
            vec![string.clone()],
            DataType::void(),
            native(set_message),
        ))
        .with_method(Method::native("getTypeName", vec![], string, native(get_type_name)));

    PLATFORM_EXCEPTIONS
        .iter()
        .fold(Module::new("exception").with_class(base), |module, (_, name)| {
            let class = with_constructors(system_class(*name))
                .with_super(TypeRef::builtin(builtins::EXCEPTION, "Exception"))
                .with_to_string(describe);
            module.with_class(class)
        })
}
