use std::cmp::Ordering;

use serde_json::{Number, Value};

use super::ExprError;
use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::Values;

/// Integers up to this magnitude are stored as JSON integers.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Evaluates `expr` against `ctx`. Keys missing from the context read as
/// `null`.
pub fn evaluate(expr: &Expr, ctx: &Values) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::FieldRef(key) => Ok(ctx.get(key).cloned().unwrap_or(Value::Null)),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, ctx)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&value))),
                UnaryOp::Neg => finite(-to_number(&value, "-")?),
                UnaryOp::Plus => finite(to_number(&value, "+")?),
            }
        }
        Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, ctx),
        Expr::Concat(parts) => {
            let mut out = String::new();
            for part in parts {
                out.push_str(&display(&evaluate(part, ctx)?));
            }
            Ok(Value::String(out))
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if truthy(&evaluate(condition, ctx)?) {
                evaluate(then, ctx)
            } else {
                evaluate(otherwise, ctx)
            }
        }
    }
}

fn evaluate_binary(op: BinaryOp, left: &Expr, right: &Expr, ctx: &Values) -> Result<Value, ExprError> {
    let lhs = evaluate(left, ctx)?;
    match op {
        BinaryOp::And if !truthy(&lhs) => return Ok(lhs),
        BinaryOp::Or if truthy(&lhs) => return Ok(lhs),
        BinaryOp::And | BinaryOp::Or => return evaluate(right, ctx),
        _ => {}
    }
    let rhs = evaluate(right, ctx)?;
    match op {
        BinaryOp::Eq => Ok(Value::Bool(loose_eq(&lhs, &rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!loose_eq(&lhs, &rhs))),
        BinaryOp::Lt => ordered(op, &lhs, &rhs, |o| o == Ordering::Less),
        BinaryOp::Le => ordered(op, &lhs, &rhs, |o| o != Ordering::Greater),
        BinaryOp::Gt => ordered(op, &lhs, &rhs, |o| o == Ordering::Greater),
        BinaryOp::Ge => ordered(op, &lhs, &rhs, |o| o != Ordering::Less),
        BinaryOp::Add if lhs.is_string() || rhs.is_string() => {
            Ok(Value::String(format!("{}{}", display(&lhs), display(&rhs))))
        }
        BinaryOp::Add => arithmetic(op, &lhs, &rhs, |a, b| a + b),
        BinaryOp::Sub => arithmetic(op, &lhs, &rhs, |a, b| a - b),
        BinaryOp::Mul => arithmetic(op, &lhs, &rhs, |a, b| a * b),
        BinaryOp::Div | BinaryOp::Rem => {
            let divisor = to_number(&rhs, op.symbol())?;
            if divisor == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            let dividend = to_number(&lhs, op.symbol())?;
            if op == BinaryOp::Div {
                finite(dividend / divisor)
            } else {
                finite(dividend % divisor)
            }
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators handled above"),
    }
}

fn arithmetic(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    apply: impl Fn(f64, f64) -> f64,
) -> Result<Value, ExprError> {
    let a = to_number(lhs, op.symbol())?;
    let b = to_number(rhs, op.symbol())?;
    finite(apply(a, b))
}

fn finite(value: f64) -> Result<Value, ExprError> {
    number_value(value).ok_or(ExprError::NonFinite)
}

/// JSON number for `value`; integral values become integers. `None` for
/// NaN and infinities, which JSON cannot hold.
pub fn number_value(value: f64) -> Option<Value> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::Number(Number::from(value as i64)));
    }
    Number::from_f64(value).map(Value::Number)
}

/// Truthiness as the form designer understands it: `false`, `null`, `0`
/// and `""` are falsy, everything else (arrays included) is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form used by concatenation. `null` renders as nothing.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => display_number(number),
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn display_number(number: &Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER => {
            (value as i64).to_string()
        }
        Some(value) => value.to_string(),
        None => number.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Numbers and numeric strings coerce; anything else is a type error.
fn to_number(value: &Value, op: &'static str) -> Result<f64, ExprError> {
    let coerced = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_numeric(text),
        _ => None,
    };
    coerced.ok_or_else(|| ExprError::TypeMismatch {
        op,
        found: type_name(value),
    })
}

fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(a), Value::String(b)) | (Value::String(b), Value::Number(a)) => {
            parse_numeric(b).is_some_and(|b| a.as_f64() == Some(b))
        }
        _ => lhs == rhs,
    }
}

/// Relational result. A `null` side (an empty or missing field) is
/// unordered, so every relation against it is `false`.
fn ordered(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    holds: impl Fn(Ordering) -> bool,
) -> Result<Value, ExprError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Bool(false));
    }
    compare(op, lhs, rhs).map(|o| Value::Bool(holds(o)))
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Ordering, ExprError> {
    let ordering = match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(_) | Value::String(_), Value::Number(_) | Value::String(_)) => {
            match (to_number(lhs, op.symbol()), to_number(rhs, op.symbol())) {
                (Ok(a), Ok(b)) => a.partial_cmp(&b),
                _ => None,
            }
        }
        _ => None,
    };
    ordering.ok_or_else(|| ExprError::Incomparable {
        op: op.symbol(),
        left: type_name(lhs),
        right: type_name(rhs),
    })
}
