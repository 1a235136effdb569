//! Identifier Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Only [`FromStr`](std::str::FromStr) surfaces these; the
//! top-level [`parse`](crate::parse) function logs and swallows them.

use derive_more::{Display, Error};

/// An identifier parsing error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for identifier parsing.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The text does not match any known identifier layout; it needs a manual
    /// correction before it can be used.
    #[display("unrecognized identifier: {_0:?}")]
    Unrecognized(#[error(not(source))] String),
    /// The text matched a layout, but a captured field could not be converted.
    #[display("failed to parse field '{field}', found value: {value}")]
    ParseError {
        /// The field that failed to parse.
        field: &'static str,
        /// The captured text.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Parsing is pure: the same text always fails the same way.
        false
    }
}
