use std::cell::Cell;
use std::error::Error as StdError;
use std::path::Path;

use exn::ResultExt;
use lorcana_identifier::Identifier;
use lorcana_ocr_cache::{Codec, OcrCache};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// The OCR capability: turns a card image into OCR output.
///
/// How recognition works is none of the pipeline's business. Its errors are
/// never masked: they abort processing of that card.
pub trait Recognizer {
    /// Whatever the OCR step produces for one card. Cached as-is.
    type Output;
    type Error: StdError + Send + Sync + 'static;

    fn recognize(&self, card_id: u32, image: &Path) -> std::result::Result<Self::Output, Self::Error>;

    /// The identifier line (bottom-left of the card) from the OCR output.
    fn identifier_text<'a>(&self, output: &'a Self::Output) -> &'a str;
}

/// Where a card's OCR output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Reused from the OCR cache.
    Cached,
    /// Freshly recognized (and now cached).
    Recognized,
}

/// The result of processing a single card.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed<T> {
    pub card_id: u32,
    pub output: T,
    /// [`None`] if the identifier line could not be parsed; the card needs a
    /// manual correction.
    pub identifier: Option<Identifier>,
    pub source: Source,
}

/// Per-run card processing: cache lookup, OCR on a miss, identifier parsing.
pub struct Pipeline<R, C>
where
    R: Recognizer,
    C: Codec<Value = R::Output>,
{
    cache: OcrCache<C>,
    recognizer: R,
    cache_was_valid: bool,
    recognized: Cell<usize>,
}
impl<R, C> Pipeline<R, C>
where
    R: Recognizer,
    C: Codec<Value = R::Output>,
{
    /// Starts a run, validating the cache exactly once.
    pub fn start(cache: OcrCache<C>, recognizer: R) -> Result<Self> {
        let cache_was_valid = cache.validate().or_raise(|| ErrorKind::Cache)?;
        Ok(Self {
            cache,
            recognizer,
            cache_was_valid,
            recognized: Cell::new(0),
        })
    }

    /// Whether cached results from previous runs could be reused.
    pub fn cache_was_valid(&self) -> bool {
        self.cache_was_valid
    }

    pub fn cache(&self) -> &OcrCache<C> {
        &self.cache
    }

    /// Number of cards that needed OCR so far in this run.
    pub fn recognized(&self) -> usize {
        self.recognized.get()
    }

    /// Processes one card.
    ///
    /// A cache miss and a corrupt cache entry are handled identically: the
    /// card goes through OCR again and the result replaces the entry.
    #[instrument(skip(self, image), fields(image = %image.display()))]
    pub fn process(&self, card_id: u32, image: &Path) -> Result<Processed<R::Output>> {
        let (output, source) = match self.cache.get(card_id) {
            Some(output) => (output, Source::Cached),
            None => {
                let output = self.recognizer.recognize(card_id, image).or_raise(|| ErrorKind::Recognition(card_id))?;
                self.recognized.set(self.recognized.get() + 1);
                self.cache.put(card_id, &output).or_raise(|| ErrorKind::Cache)?;
                (output, Source::Recognized)
            },
        };
        let identifier = lorcana_identifier::parse(self.recognizer.identifier_text(&output));
        Ok(Processed { card_id, output, identifier, source })
    }
}
