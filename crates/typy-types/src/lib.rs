//! Shared types for the typy runtime.
//!
//! This crate defines the AST consumed by the evaluator, source spans,
//! the in-memory construction API and the JSON handoff used by external
//! front-ends.

mod error;
mod load;
mod span;
pub mod ast;
pub mod build;

pub use error::{LoadError, LoadResult};
pub use load::{load_module_json, module_to_json, validate_module};
pub use span::Span;
