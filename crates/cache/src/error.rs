//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Only unrecoverable conditions become errors. Stale caches and unreadable
//! entries are expected and are handled (and logged) inside the cache.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Language code cannot be used as a single directory name.
    #[display("invalid path segment: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// A dependency artifact exists but could not be read.
    #[display("unable to read dependency: {}", _0.display())]
    Dependency(#[error(not(source))] PathBuf),
    /// The dependency manifest could not be serialized or written.
    #[display("unable to write manifest: {}", _0.display())]
    Manifest(#[error(not(source))] PathBuf),
    /// The cache directory (or something in it) could not be created, listed,
    /// cleared or written.
    #[display("unusable cache storage: {}", _0.display())]
    Storage(#[error(not(source))] PathBuf),
    /// A value could not be converted to or from its stored representation.
    #[display("unable to encode or decode cached value")]
    Codec,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Manifest(_))
    }
}
