//! # Core Error Types
//!
//! Errors raised by the foundational primitives. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations. Crates higher in
//! the stack define their own error enums and wrap these where needed.

use thiserror::Error;

/// Errors from the core primitive types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A timestamp string failed to parse or violated the UTC-only policy.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// An identifier string failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}
