//! Card text extraction pipeline.
//!
//! Glues the [OCR result cache](lorcana_ocr_cache) to the
//! [identifier parser](lorcana_identifier): each card's OCR output is reused
//! from the cache when the OCR implementation hasn't changed, and its
//! identifier line is parsed into a structured [`Identifier`].

pub mod error;
mod pipeline;

pub use crate::pipeline::{Pipeline, Processed, Recognizer, Source};
pub use lorcana_identifier::Identifier;
