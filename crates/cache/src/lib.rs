//! Self-invalidating on-disk cache for OCR results.
//!
//! OCR is the most expensive step of the card pipeline, and its output only
//! depends on the card image and the OCR implementation. This crate stores
//! each card's OCR result on disk, keyed by language and card ID, and
//! remembers a [`Manifest`] of BLAKE3 digests of the artifacts that make up
//! the OCR implementation. When any of those artifacts change, validation
//! throws every cached result away: nobody has to remember to bump a cache
//! version.
//!
//! # Failure handling
//! - A stale cache is cleared and rebuilt; that's logged, not an error.
//! - A corrupt entry is logged and reported as a miss.
//! - Failing to create, clear or write the cache storage (or the manifest)
//!   is an [`Error`](error::Error), since the cache can't work without it.

mod cache;
mod codec;
pub mod error;
mod fs;
mod manifest;
mod path;

pub use crate::cache::{CacheOptions, ENTRY_EXTENSION, MANIFEST_FILE, OcrCache};
pub use crate::codec::{Codec, Json, Raw};
pub use crate::manifest::{Manifest, Staleness};
