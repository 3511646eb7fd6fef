//! The `Math` class.
//!
//! Integer overloads stay in 64-bit integer arithmetic with wrapping
//! semantics; Double overloads accept Integer arguments through widening.

use apex_core::{CallContext, DataType, NativeError, Value, builtins};
use apex_registry::{Method, Module};

use crate::{native, system_class};

fn abs_integer(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Integer(ctx.arg_integer(0)?.wrapping_abs()))
}

fn abs_double(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Double(ctx.arg_double(0)?.abs()))
}

fn max_integer(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Integer(ctx.arg_integer(0)?.max(ctx.arg_integer(1)?)))
}

fn max_double(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Double(ctx.arg_double(0)?.max(ctx.arg_double(1)?)))
}

fn min_integer(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Integer(ctx.arg_integer(0)?.min(ctx.arg_integer(1)?)))
}

fn min_double(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Double(ctx.arg_double(0)?.min(ctx.arg_double(1)?)))
}

fn modulo(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    let divisor = ctx.arg_integer(1)?;
    if divisor == 0 {
        return Err(NativeError::raise(builtins::MATH_EXCEPTION, "MathException", "Divide by 0"));
    }
    Ok(Value::Integer(ctx.arg_integer(0)?.wrapping_rem(divisor)))
}

fn sqrt(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Double(ctx.arg_double(0)?.sqrt()))
}

fn pow(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Double(ctx.arg_double(0)?.powf(ctx.arg_double(1)?)))
}

/// Round half away from zero.
fn round(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Integer(ctx.arg_double(0)?.round() as i64))
}

fn floor(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Double(ctx.arg_double(0)?.floor()))
}

fn ceil(ctx: &mut CallContext<'_>) -> Result<Value, NativeError> {
    Ok(Value::Double(ctx.arg_double(0)?.ceil()))
}

pub fn module() -> Module {
    let int = DataType::integer;
    let dbl = DataType::double;
    let math = system_class("Math")
        .with_method(Method::native_static("abs", vec![int()], int(), native(abs_integer)))
        .with_method(Method::native_static("abs", vec![dbl()], dbl(), native(abs_double)))
        .with_method(Method::native_static("max", vec![int(), int()], int(), native(max_integer)))
        .with_method(Method::native_static("max", vec![dbl(), dbl()], dbl(), native(max_double)))
        .with_method(Method::native_static("min", vec![int(), int()], int(), native(min_integer)))
        .with_method(Method::native_static("min", vec![dbl(), dbl()], dbl(), native(min_double)))
        .with_method(Method::native_static("mod", vec![int(), int()], int(), native(modulo)))
        .with_method(Method::native_static("sqrt", vec![dbl()], dbl(), native(sqrt)))
        .with_method(Method::native_static("pow", vec![dbl(), dbl()], dbl(), native(pow)))
        .with_method(Method::native_static("round", vec![dbl()], int(), native(round)))
        .with_method(Method::native_static("floor", vec![dbl()], dbl(), native(floor)))
        .with_method(Method::native_static("ceil", vec![dbl()], dbl(), native(ceil)));
    Module::new("math").with_class(math)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::invoke;
    use apex_registry::ClassType;

    fn math() -> ClassType {
        module().classes()[0].clone()
    }

    fn call(name: &str, args: &[Value]) -> Result<Value, NativeError> {
        invoke(&math(), name, &Value::Null, args)
    }

    #[test]
    fn integer_overloads_keep_integers() {
        assert_eq!(call("abs", &[(-5i64).into()]).unwrap().as_integer(), Some(5));
        assert_eq!(call("max", &[3i64.into(), 9i64.into()]).unwrap().as_integer(), Some(9));
        assert_eq!(call("min", &[3i64.into(), 9i64.into()]).unwrap().as_integer(), Some(3));
        assert_eq!(call("mod", &[7i64.into(), 3i64.into()]).unwrap().as_integer(), Some(1));
    }

    #[test]
    fn double_overloads_widen_integers() {
        assert_eq!(call("sqrt", &[16i64.into()]).unwrap().as_double(), Some(4.0));
        assert_eq!(call("pow", &[2.0.into(), 10i64.into()]).unwrap().as_double(), Some(1024.0));
        assert_eq!(call("round", &[2.5.into()]).unwrap().as_integer(), Some(3));
    }

    #[test]
    fn mod_by_zero_raises_math_exception() {
        let err = call("mod", &[1i64.into(), 0i64.into()]).unwrap_err();
        assert_eq!(err.to_string(), "MathException: Divide by 0");
    }
}
