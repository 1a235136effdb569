//! Pipeline Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Configuration could not be loaded.
    #[display("configuration error")]
    Config,
    /// The OCR cache is unusable.
    #[display("OCR cache error")]
    Cache,
    /// The OCR capability failed for a card.
    #[display("OCR failed for card {_0}")]
    Recognition(#[error(not(source))] u32),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Recognition(_))
    }
}
