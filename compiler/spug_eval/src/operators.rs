//! Operator semantics over values.
//!
//! Dispatch is a direct match on the operator and the operand kinds. Short
//! circuit operators, member access and assignment live in the evaluator
//! since they need the context; everything here is a pure function of
//! values.

use std::cmp::Ordering;

use spug_ir::{Dict, Op, Value};

use crate::error::{EvalError, EvalResult};

/// Integer view of bools and integers.
fn int_like(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn operands(op: Op, left: &Value, right: &Value) -> EvalError {
    EvalError::Operands {
        op: op.symbol(),
        left: left.kind_name(),
        right: right.kind_name(),
    }
}

/// Binary operator on two values. `&&` and `||` are not handled here.
pub fn binary(op: Op, left: &Value, right: &Value) -> EvalResult<Value> {
    match op {
        Op::Eq => Ok(Value::Bool(left == right)),
        Op::NotEq => Ok(Value::Bool(left != right)),
        Op::Lt | Op::LtEq | Op::Gt | Op::GtEq => compare(op, left, right).map(Value::Bool),
        Op::Comma => {
            let mut text = left.to_text().into_owned();
            text.push_str(&right.to_text());
            Ok(Value::Str(text))
        }
        _ if left.is_null() || right.is_null() => Err(EvalError::NullOperand(op.symbol())),
        Op::Sum => sum(left, right),
        Op::Sub | Op::Mult | Op::Div => numeric(op, left, right),
        Op::Rem | Op::ShiftLeft | Op::ShiftRight | Op::BitAnd | Op::BitXor | Op::BitOr => {
            integer(op, left, right)
        }
        _ => Err(EvalError::Unsupported(op.symbol())),
    }
}

/// Ordering comparison; false when either side is null.
fn compare(op: Op, left: &Value, right: &Value) -> EvalResult<bool> {
    if left.is_null() || right.is_null() {
        return Ok(false);
    }
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ if left.is_basic() && right.is_basic() => match (int_like(left), int_like(right)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => left.as_float().partial_cmp(&right.as_float()),
        },
        _ => return Err(operands(op, left, right)),
    };
    // NaN compares false both ways.
    Ok(ordering.is_some_and(|ordering| match op {
        Op::Lt => ordering == Ordering::Less,
        Op::LtEq => ordering != Ordering::Greater,
        Op::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }))
}

fn sum(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Str(_), _) | (_, Value::Str(_)) if !left.is_container() && !right.is_container() => {
            let mut text = left.to_text().into_owned();
            text.push_str(&right.to_text());
            Ok(Value::Str(text))
        }
        (Value::Array(a), Value::Array(b)) => {
            Ok(Value::Array(a.iter().chain(b.iter()).cloned().collect()))
        }
        (Value::Dict(a), Value::Dict(b)) => {
            let mut union: Dict = a.clone();
            union.extend(b.iter().map(|(k, v)| (k.clone(), v.clone())));
            Ok(Value::Dict(union))
        }
        _ => numeric(Op::Sum, left, right),
    }
}

/// Integer arithmetic when both sides are integers, float otherwise.
fn numeric(op: Op, left: &Value, right: &Value) -> EvalResult<Value> {
    if !left.is_basic() || !right.is_basic() {
        return Err(operands(op, left, right));
    }
    if let (Some(a), Some(b)) = (int_like(left), int_like(right)) {
        return match op {
            Op::Sum => Ok(Value::Int(a.wrapping_add(b))),
            Op::Sub => Ok(Value::Int(a.wrapping_sub(b))),
            Op::Mult => Ok(Value::Int(a.wrapping_mul(b))),
            Op::Div if b == 0 => Err(EvalError::DivisionByZero),
            Op::Div => Ok(Value::Int(a.wrapping_div(b))),
            _ => Err(EvalError::Unsupported(op.symbol())),
        };
    }
    let (a, b) = (left.as_float(), right.as_float());
    match op {
        Op::Sum => Ok(Value::Float(a + b)),
        Op::Sub => Ok(Value::Float(a - b)),
        Op::Mult => Ok(Value::Float(a * b)),
        Op::Div => Ok(Value::Float(a / b)),
        _ => Err(EvalError::Unsupported(op.symbol())),
    }
}

fn integer(op: Op, left: &Value, right: &Value) -> EvalResult<Value> {
    let (Some(a), Some(b)) = (int_like(left), int_like(right)) else {
        return Err(operands(op, left, right));
    };
    let shift = || u32::try_from(b).map_err(|_| operands(op, left, right));
    let value = match op {
        Op::Rem if b == 0 => return Err(EvalError::DivisionByZero),
        Op::Rem => a.wrapping_rem(b),
        Op::ShiftLeft => a.checked_shl(shift()?).unwrap_or(0),
        Op::ShiftRight => a.checked_shr(shift()?).unwrap_or(if a < 0 { -1 } else { 0 }),
        Op::BitAnd => a & b,
        Op::BitXor => a ^ b,
        Op::BitOr => a | b,
        _ => return Err(EvalError::Unsupported(op.symbol())),
    };
    Ok(Value::Int(value))
}

/// Prefix `-`, `!` and `~`.
pub fn unary(op: Op, value: &Value) -> EvalResult<Value> {
    let invalid = || EvalError::Operand {
        op: op.symbol(),
        kind: value.kind_name(),
    };
    match op {
        Op::Neg => Ok(Value::Bool(!value.as_bool())),
        _ if value.is_null() => Err(EvalError::NullOperand(op.symbol())),
        Op::Minus => match value {
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Str(_) => Ok(Value::Float(-value.as_float())),
            _ => int_like(value)
                .map(|i| Value::Int(i.wrapping_neg()))
                .ok_or_else(invalid),
        },
        Op::BitNot => int_like(value).map(|i| Value::Int(!i)).ok_or_else(invalid),
        _ => Err(EvalError::Unsupported(op.symbol())),
    }
}

/// Binary operator a compound assignment applies.
pub fn assignment_base(op: Op) -> Option<Op> {
    Some(match op {
        Op::SumAssignment => Op::Sum,
        Op::DiffAssignment => Op::Sub,
        Op::MultAssignment => Op::Mult,
        Op::DivAssignment => Op::Div,
        Op::RemAssignment => Op::Rem,
        Op::ShlAssignment => Op::ShiftLeft,
        Op::ShrAssignment => Op::ShiftRight,
        Op::AndAssignment => Op::BitAnd,
        Op::XorAssignment => Op::BitXor,
        Op::OrAssignment => Op::BitOr,
        _ => return None,
    })
}

/// Apply a compound assignment in place. `+=` stores into null, appends to
/// strings and extends arrays and dictionaries.
pub fn apply_assignment(op: Op, target: &mut Value, rhs: Value) -> EvalResult<()> {
    let base = assignment_base(op).ok_or(EvalError::Unsupported(op.symbol()))?;
    if base == Op::Sum {
        match (target, rhs) {
            (target, rhs) if target.is_null() => *target = rhs,
            (Value::Str(text), rhs) if !rhs.is_container() => text.push_str(&rhs.to_text()),
            (Value::Array(items), Value::Array(more)) => items.extend(more),
            (Value::Dict(entries), Value::Dict(more)) => entries.extend(more),
            (target, rhs) => *target = binary(base, target, &rhs)?,
        }
        return Ok(());
    }
    let value = binary(base, target, &rhs)?;
    *target = value;
    Ok(())
}

/// `++` / `--` in place.
pub fn step(target: &mut Value, up: bool) -> EvalResult<()> {
    let symbol = if up { "++" } else { "--" };
    match target {
        Value::Int(i) => *i = if up { i.wrapping_add(1) } else { i.wrapping_sub(1) },
        Value::Float(f) => *f += if up { 1.0 } else { -1.0 },
        Value::Null => return Err(EvalError::NullOperand(symbol)),
        _ => {
            return Err(EvalError::Operand {
                op: symbol,
                kind: target.kind_name(),
            })
        }
    }
    Ok(())
}
