//! Runtime fault types for the typy evaluator.
//!
//! Every fault is unrecoverable: it unwinds to the top level and halts the
//! module. `1 // 0` is how programs spell "assertion failed", so
//! [`EvalError::DivisionByZero`] doubles as the assertion signal.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use typy_types::Span;

/// Evaluation error — the fault taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Operand or operator kind mismatch, wrong argument count.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Unbound identifier or unknown callee.
    #[error("name error: {0}")]
    NameError(String),
    /// Field not declared on the instance's class.
    #[error("no such field: {0}")]
    NoSuchField(String),
    /// Method not declared on the receiver's class.
    #[error("no such method: {0}")]
    NoSuchMethod(String),
    /// String index out of range.
    #[error("index error: {0}")]
    IndexError(String),
    /// Integer `//` or `%` by zero.
    #[error("division by zero: {0}")]
    DivisionByZero(String),
    /// Field access or method call on `None`.
    #[error("none dereference: {0}")]
    NoneDereference(String),
    /// Well-typed operand with an unusable value, e.g. a zero slice step.
    #[error("value error: {0}")]
    ValueError(String),
    /// Call depth exceeded `EvalConfig::max_call_depth`.
    #[error("recursion limit exceeded: depth {0}")]
    RecursionLimit(usize),
    /// Step budget exhausted.
    #[error("step limit exceeded: {0} steps")]
    StepLimitExceeded(u64),
}

impl EvalError {
    /// The kind of this fault, without its message.
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::TypeMismatch(_) => FaultKind::TypeMismatch,
            Self::NameError(_) => FaultKind::NameError,
            Self::NoSuchField(_) => FaultKind::NoSuchField,
            Self::NoSuchMethod(_) => FaultKind::NoSuchMethod,
            Self::IndexError(_) => FaultKind::IndexError,
            Self::DivisionByZero(_) => FaultKind::DivisionByZero,
            Self::NoneDereference(_) => FaultKind::NoneDereference,
            Self::ValueError(_) => FaultKind::ValueError,
            Self::RecursionLimit(_) => FaultKind::RecursionLimit,
            Self::StepLimitExceeded(_) => FaultKind::StepLimitExceeded,
        }
    }
}

/// Serializable discriminant of an [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    TypeMismatch,
    NameError,
    NoSuchField,
    NoSuchMethod,
    IndexError,
    DivisionByZero,
    NoneDereference,
    ValueError,
    RecursionLimit,
    StepLimitExceeded,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TypeMismatch => "TypeMismatch",
            Self::NameError => "NameError",
            Self::NoSuchField => "NoSuchField",
            Self::NoSuchMethod => "NoSuchMethod",
            Self::IndexError => "IndexError",
            Self::DivisionByZero => "DivisionByZero",
            Self::NoneDereference => "NoneDereference",
            Self::ValueError => "ValueError",
            Self::RecursionLimit => "RecursionLimit",
            Self::StepLimitExceeded => "StepLimitExceeded",
        };
        f.write_str(name)
    }
}

/// A fault as reported to the host: the error plus the span of the
/// statement that was executing when it was raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
    pub span: Span,
    #[serde(skip)]
    pub error: EvalError,
}

impl Fault {
    pub fn new(error: EvalError, span: Span) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            span,
            error,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
