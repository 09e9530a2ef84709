//! Errors raised while loading records or configuring the engine.
//!
//! Materialization itself never fails: missing targets and exhausted budgets
//! are logged and folded into the output document instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("record is not a JSON object")]
    InvalidRecord,

    #[error("record has no string `{field}` field")]
    MissingId { field: &'static str },

    #[error("invalid path pattern `{pattern}`: {message}")]
    InvalidPathPattern { pattern: String, message: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
