//! Runtime values and the operations defined directly on them.
//!
//! Arithmetic is arbitrary precision; `//` and `%` round toward negative
//! infinity. `==` on references is identity, never structural.

use crate::error::{EvalError, EvalResult};
use crate::heap::ObjectId;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::rc::Rc;
use typy_types::ast::BinOp;

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(BigInt),
    Bool(bool),
    /// Immutable string, shared between bindings.
    Str(Rc<str>),
    /// Handle to a live instance in the heap.
    Object(ObjectId),
    None,
}

impl Value {
    pub fn int(n: i64) -> Self {
        Value::Int(BigInt::from(n))
    }

    pub fn str(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    /// Type name used in fault messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Object(_) => "object",
            Value::None => "NoneType",
        }
    }

    /// The value as a condition. Only `bool` is accepted.
    pub fn as_condition(&self, context: &str) -> EvalResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EvalError::TypeMismatch(format!(
                "{context} requires bool, got {}",
                other.type_name()
            ))),
        }
    }

    /// `a is b`: same instance, or both `None`.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::None, Value::None) => true,
            _ => false,
        }
    }

    /// `a == b`. Values of different kinds are never equal.
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => self.is_identical(other),
        }
    }

    /// Ordering comparisons: `<`, `>`, `<=`, `>=`.
    pub fn compare(&self, op: BinOp, other: &Value) -> EvalResult<bool> {
        let ordering = match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => {
                return Err(EvalError::TypeMismatch(format!(
                    "'{}' not supported between {} and {}",
                    op.as_str(),
                    self.type_name(),
                    other.type_name()
                )))
            }
        };
        Ok(match op {
            BinOp::Less => ordering == Ordering::Less,
            BinOp::Greater => ordering == Ordering::Greater,
            BinOp::LessEq => ordering != Ordering::Greater,
            BinOp::GreaterEq => ordering != Ordering::Less,
            _ => {
                return Err(EvalError::TypeMismatch(format!(
                    "'{}' is not an ordering operator",
                    op.as_str()
                )))
            }
        })
    }

    // ── Arithmetic ──────────────────────────────────────────────────────

    /// `+` on ints, or string concatenation.
    pub fn add(&self, other: &Value) -> EvalResult<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
            (Value::Str(a), Value::Str(b)) => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                Ok(Value::Str(Rc::from(joined)))
            }
            _ => Err(mismatch(BinOp::Add, self, other)),
        }
    }

    pub fn sub(&self, other: &Value) -> EvalResult<Value> {
        let (a, b) = int_operands(BinOp::Sub, self, other)?;
        Ok(Value::Int(a - b))
    }

    /// `*` on ints, or string repetition in either operand order.
    pub fn mul(&self, other: &Value) -> EvalResult<Value> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => repeat(s, n),
            _ => Err(mismatch(BinOp::Mul, self, other)),
        }
    }

    /// `//`, rounding toward negative infinity.
    pub fn floordiv(&self, other: &Value) -> EvalResult<Value> {
        let (a, b) = int_operands(BinOp::FloorDiv, self, other)?;
        if b.is_zero() {
            return Err(EvalError::DivisionByZero(format!("{a} // 0")));
        }
        Ok(Value::Int(a.div_floor(b)))
    }

    /// `%`, with the sign of the divisor.
    pub fn modulo(&self, other: &Value) -> EvalResult<Value> {
        let (a, b) = int_operands(BinOp::Mod, self, other)?;
        if b.is_zero() {
            return Err(EvalError::DivisionByZero(format!("{a} % 0")));
        }
        Ok(Value::Int(a.mod_floor(b)))
    }

    pub fn neg(&self) -> EvalResult<Value> {
        match self {
            Value::Int(n) => Ok(Value::Int(-n)),
            other => Err(EvalError::TypeMismatch(format!(
                "bad operand type for unary -: {}",
                other.type_name()
            ))),
        }
    }

    pub fn not(&self) -> EvalResult<Value> {
        Ok(Value::Bool(!self.as_condition("'not'")?))
    }
}

fn mismatch(op: BinOp, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "unsupported operand types for {}: {} and {}",
        op.as_str(),
        left.type_name(),
        right.type_name()
    ))
}

fn int_operands<'a>(op: BinOp, left: &'a Value, right: &'a Value) -> EvalResult<(&'a BigInt, &'a BigInt)> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok((a, b)),
        _ => Err(mismatch(op, left, right)),
    }
}

fn repeat(s: &str, count: &BigInt) -> EvalResult<Value> {
    if !count.is_positive() {
        return Ok(Value::str(""));
    }
    let n = count
        .to_usize()
        .filter(|n| n.checked_mul(s.len()).is_some())
        .ok_or_else(|| EvalError::ValueError(format!("repeat count {count} is too large")))?;
    Ok(Value::Str(Rc::from(s.repeat(n))))
}

// ══════════════════════════════════════════════════════════════════════════════
// Strings
// ══════════════════════════════════════════════════════════════════════════════

/// Clamp a possibly huge integer into `i64`, saturating by sign.
pub(crate) fn saturating_i64(n: &BigInt) -> i64 {
    n.to_i64()
        .unwrap_or(if n.is_negative() { i64::MIN } else { i64::MAX })
}

/// `s[i]`, with negative indices counted from the end.
pub fn index_str(s: &str, index: &BigInt) -> EvalResult<Value> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let raw = saturating_i64(index);
    let normalized = if raw < 0 { raw.saturating_add(len) } else { raw };
    if normalized < 0 || normalized >= len {
        return Err(EvalError::IndexError(format!(
            "string index {index} out of range for length {len}"
        )));
    }
    Ok(Value::Str(Rc::from(chars[normalized as usize].to_string())))
}

/// Resolve slice bounds against a sequence length.
///
/// Omitted bounds default by the sign of `step`; negative bounds count from
/// the end; out-of-range bounds are clamped. Returns `(start, stop)` ready
/// for stepping with `step`.
pub fn adjust_slice(len: i64, start: Option<i64>, stop: Option<i64>, step: i64) -> (i64, i64) {
    let clamp = |bound: i64| -> i64 {
        if bound < 0 {
            let shifted = bound.saturating_add(len);
            if shifted < 0 {
                if step < 0 {
                    -1
                } else {
                    0
                }
            } else {
                shifted
            }
        } else if bound >= len {
            if step < 0 {
                len - 1
            } else {
                len
            }
        } else {
            bound
        }
    };
    let start = match start {
        Some(b) => clamp(b),
        None if step < 0 => len - 1,
        None => 0,
    };
    let stop = match stop {
        Some(b) => clamp(b),
        None if step < 0 => -1,
        None => len,
    };
    (start, stop)
}

/// `s[start:stop:step]`.
pub fn slice_str(s: &str, start: Option<&BigInt>, stop: Option<&BigInt>, step: Option<&BigInt>) -> EvalResult<Value> {
    let step = step.map(saturating_i64).unwrap_or(1);
    if step == 0 {
        return Err(EvalError::ValueError("slice step cannot be zero".into()));
    }
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let (start, stop) = adjust_slice(len, start.map(saturating_i64), stop.map(saturating_i64), step);

    let mut out = String::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(chars[i as usize]);
        i = match i.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Value::Str(Rc::from(out)))
}
