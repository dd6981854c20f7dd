//! typy tree-walking evaluator.
//!
//! Executes a typed-Python module directly from its AST and captures what it
//! prints. Faults halt the module; integer division by zero doubles as the
//! assertion signal.

pub mod config;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod heap;
pub mod runner;
mod stack;
pub mod value;

pub use config::EvalConfig;
pub use error::{EvalError, EvalResult, Fault, FaultKind};
pub use runner::{execute, execute_with_config, ExecState, Interpreter, Outcome};
pub use value::Value;
