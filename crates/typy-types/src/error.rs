use thiserror::Error;

/// Errors raised while handing a parsed module over to the runtime.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The JSON text is not a well-formed module tree.
    #[error("malformed module JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The tree decoded but is structurally unusable.
    #[error("invalid module: {0}")]
    Invalid(String),
}

/// Result alias for module loading.
pub type LoadResult<T> = std::result::Result<T, LoadError>;
