//! Operator semantics on runtime values.
//!
//! Binary operators dispatch on the runtime types of both operands:
//!
//! | Operands            | Operators                                        |
//! |---------------------|--------------------------------------------------|
//! | any                 | `==` `!=` (case-insensitive text), `===` `!==`   |
//! | Integer, Integer    | arithmetic (wrapping), comparison, shifts, bitwise |
//! | Integer/Double mix  | arithmetic and comparison, widened to Double     |
//! | String, String      | comparison on lower-cased text                   |
//! | Boolean, Boolean    | `&&` `\|\|` `&` `\|` `^`                          |
//!
//! String concatenation is not handled here: it needs the value renderer,
//! so the interpreter intercepts `+` with a String operand first.
//!
//! Every function is pure; failures are reported as [`OperatorFault`] and
//! turned into exceptions or runtime errors by the caller.

use apex_ast::{BinaryOp, UnaryOp};
use apex_core::Value;

/// Why an operator could not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFault {
    /// No rule for these operand types.
    Unsupported,
    /// Integer or Double division or remainder by zero.
    DivideByZero,
    /// A `null` operand where a value is required.
    NullOperand,
}

pub type OperatorResult = Result<Value, OperatorFault>;

/// `==` as the language defines it: identity for objects, numeric widening,
/// case-insensitive comparison for text.
pub fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
        _ => left.same(right),
    }
}

/// Apply a non-short-circuit binary operator.
///
/// `&&` and `||` are accepted too, with both operands already evaluated.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> OperatorResult {
    use BinaryOp::*;

    match op {
        Equal => return Ok(Value::Boolean(equals(left, right))),
        NotEqual => return Ok(Value::Boolean(!equals(left, right))),
        ExactEqual => return Ok(Value::Boolean(left.same(right))),
        ExactNotEqual => return Ok(Value::Boolean(!left.same(right))),
        _ => {}
    }
    if left.is_null() || right.is_null() {
        return Err(OperatorFault::NullOperand);
    }

    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer(op, *a, *b),
        (Value::Integer(_) | Value::Double(_), Value::Integer(_) | Value::Double(_)) => {
            // Both are numeric, at least one Double.
            let (a, b) = (
                left.as_double().unwrap_or_default(),
                right.as_double().unwrap_or_default(),
            );
            double(op, a, b)
        }
        (Value::String(a), Value::String(b)) => string(op, a, b),
        (Value::Boolean(a), Value::Boolean(b)) => boolean(op, *a, *b),
        _ => Err(OperatorFault::Unsupported),
    }
}

fn integer(op: BinaryOp, a: i64, b: i64) -> OperatorResult {
    use BinaryOp::*;

    let value = match op {
        Add => Value::Integer(a.wrapping_add(b)),
        Sub => Value::Integer(a.wrapping_sub(b)),
        Mul => Value::Integer(a.wrapping_mul(b)),
        Div | Mod if b == 0 => return Err(OperatorFault::DivideByZero),
        Div => Value::Integer(a.wrapping_div(b)),
        Mod => Value::Integer(a.wrapping_rem(b)),
        Less => Value::Boolean(a < b),
        LessEqual => Value::Boolean(a <= b),
        Greater => Value::Boolean(a > b),
        GreaterEqual => Value::Boolean(a >= b),
        ShiftLeft => Value::Integer(a.wrapping_shl(b as u32)),
        ShiftRight => Value::Integer(a.wrapping_shr(b as u32)),
        ShiftRightUnsigned => Value::Integer(((a as u64).wrapping_shr(b as u32)) as i64),
        BitwiseAnd => Value::Integer(a & b),
        BitwiseOr => Value::Integer(a | b),
        BitwiseXor => Value::Integer(a ^ b),
        _ => return Err(OperatorFault::Unsupported),
    };
    Ok(value)
}

fn double(op: BinaryOp, a: f64, b: f64) -> OperatorResult {
    use BinaryOp::*;

    let value = match op {
        Add => Value::Double(a + b),
        Sub => Value::Double(a - b),
        Mul => Value::Double(a * b),
        Div | Mod if b == 0.0 => return Err(OperatorFault::DivideByZero),
        Div => Value::Double(a / b),
        Mod => Value::Double(a % b),
        Less => Value::Boolean(a < b),
        LessEqual => Value::Boolean(a <= b),
        Greater => Value::Boolean(a > b),
        GreaterEqual => Value::Boolean(a >= b),
        _ => return Err(OperatorFault::Unsupported),
    };
    Ok(value)
}

fn string(op: BinaryOp, a: &str, b: &str) -> OperatorResult {
    use BinaryOp::*;

    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    let value = match op {
        Less => a < b,
        LessEqual => a <= b,
        Greater => a > b,
        GreaterEqual => a >= b,
        _ => return Err(OperatorFault::Unsupported),
    };
    Ok(Value::Boolean(value))
}

fn boolean(op: BinaryOp, a: bool, b: bool) -> OperatorResult {
    use BinaryOp::*;

    let value = match op {
        LogicalAnd | BitwiseAnd => a && b,
        LogicalOr | BitwiseOr => a || b,
        BitwiseXor => a ^ b,
        _ => return Err(OperatorFault::Unsupported),
    };
    Ok(Value::Boolean(value))
}

/// Apply a non-mutating unary operator.
///
/// Increment and decrement are rewritten by the caller as `x + 1` and
/// `x - 1` and never reach this function.
pub fn unary(op: UnaryOp, operand: &Value) -> OperatorResult {
    match (op, operand) {
        (_, Value::Null) => Err(OperatorFault::NullOperand),
        (UnaryOp::Neg, Value::Integer(i)) => Ok(Value::Integer(i.wrapping_neg())),
        (UnaryOp::Neg, Value::Double(d)) => Ok(Value::Double(-d)),
        (UnaryOp::Plus, Value::Integer(_) | Value::Double(_)) => Ok(operand.clone()),
        (UnaryOp::LogicalNot, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (UnaryOp::BitwiseNot, Value::Integer(i)) => Ok(Value::Integer(!i)),
        _ => Err(OperatorFault::Unsupported),
    }
}
