//! The on-disk OCR result cache.
//!
//! ```text
//! <root>/
//! ├── manifest.json        dependency name → BLAKE3 digest
//! ├── en/
//! │   ├── 1.ocr
//! │   └── 2.ocr
//! └── fr/
//!     └── 1.ocr
//! ```

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use exn::ResultExt;
use tracing::instrument;

use crate::codec::Codec;
use crate::error::{ErrorKind, Result};
use crate::fs::write_atomic;
use crate::manifest::Manifest;
use crate::path::validate_segment;

/// File name of the persisted dependency manifest, directly inside the root.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Extension of cached entry files.
pub const ENTRY_EXTENSION: &str = "ocr";

/// Everything needed to construct an [`OcrCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Cache root directory. Created on demand.
    pub root: PathBuf,
    /// Language code; selects the subdirectory entries are stored in.
    pub language: String,
    /// Artifacts whose bytes determine OCR output. Any change to them
    /// invalidates the whole cache.
    pub dependencies: Vec<PathBuf>,
}

/// Persistent cache of OCR results, keyed by card ID within one language.
///
/// OCR output is deterministic for a given image and OCR implementation, so
/// entries stay valid until one of the configured dependencies changes.
/// [`validate()`](Self::validate) must be called once per run, before any
/// [`get()`](Self::get) or [`put()`](Self::put); it is not re-checked per
/// call.
///
/// Several instances (e.g. one per language) may share a root, but only one
/// process may use a root at a time. Nothing is locked.
///
/// # Examples
///
/// ```no_run
/// use lorcana_ocr_cache::{CacheOptions, OcrCache, Raw};
///
/// # fn example() -> lorcana_ocr_cache::error::Result<()> {
/// let cache = OcrCache::new(
///     CacheOptions {
///         root: "output/cachedOcr".into(),
///         language: "en".to_string(),
///         dependencies: vec!["OCR/ImageParser.py".into()],
///     },
///     Raw,
/// )?;
/// cache.validate()?;
/// if cache.get(42).is_none() {
///     cache.put(42, &b"expensive OCR output".to_vec())?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OcrCache<C: Codec> {
    root: PathBuf,
    language: String,
    language_dir: PathBuf,
    dependencies: Vec<PathBuf>,
    codec: C,
}
impl<C: Codec> OcrCache<C> {
    /// Create a new cache. Nothing is touched on disk until the first
    /// operation.
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the language code
    /// can't be used as a directory name.
    pub fn new(options: CacheOptions, codec: C) -> Result<Self> {
        let language_dir = options.root.join(validate_segment(&options.language)?);
        Ok(Self {
            root: options.root,
            language: options.language,
            language_dir,
            dependencies: options.dependencies,
            codec,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn entry_path(&self, card_id: u32) -> PathBuf {
        self.language_dir.join(format!("{card_id}.{ENTRY_EXTENSION}"))
    }

    /// Computes the manifest for the current state of the dependencies.
    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::compute(&self.dependencies)
    }

    /// Checks whether previously cached results can still be trusted,
    /// clearing the cache if they can't.
    ///
    /// Returns `true` if the cache was valid, or `false` if it did not exist
    /// yet or was stale (in which case it has now been cleared, and records
    /// the current manifest).
    #[instrument(skip(self), fields(language = %self.language, root = %self.root.display()))]
    pub fn validate(&self) -> Result<bool> {
        let fresh = self.manifest()?;
        if !self.root.is_dir() {
            tracing::info!("OCR cache directory doesn't exist; creating it and its manifest for future checks");
            fs::create_dir_all(&self.root).or_raise(|| ErrorKind::Storage(self.root.clone()))?;
            fresh.persist(&self.manifest_path())?;
            return Ok(false);
        }
        let stale = match Manifest::load(&self.manifest_path()) {
            None => {
                tracing::info!("OCR cache manifest is missing or unreadable; rebuilding OCR cache");
                true
            },
            Some(persisted) => match persisted.staleness(&fresh) {
                Some(reason) => {
                    tracing::info!(%reason, "OCR cache is stale; clearing it");
                    true
                },
                None => false,
            },
        };
        if stale {
            self.clear(Some(fresh))?;
        }
        Ok(!stale)
    }

    /// Deletes every cached entry, for all languages, then records
    /// `manifest` (or the freshly computed manifest, if `None`).
    ///
    /// Creates the cache root if it doesn't exist.
    #[instrument(skip(self, manifest), fields(language = %self.language, root = %self.root.display()))]
    pub fn clear(&self, manifest: Option<Manifest>) -> Result<()> {
        let started = Instant::now();
        let manifest = match manifest {
            Some(manifest) => manifest,
            None => self.manifest()?,
        };
        if self.root.is_dir() {
            let entries = fs::read_dir(&self.root).or_raise(|| ErrorKind::Storage(self.root.clone()))?;
            for entry in entries {
                let entry = entry.or_raise(|| ErrorKind::Storage(self.root.clone()))?;
                let path = entry.path();
                let file_type = entry.file_type().or_raise(|| ErrorKind::Storage(path.clone()))?;
                let removed = match file_type.is_dir() {
                    true => fs::remove_dir_all(&path),
                    false => fs::remove_file(&path),
                };
                removed.or_raise(|| ErrorKind::Storage(path.clone()))?;
            }
        } else {
            fs::create_dir_all(&self.root).or_raise(|| ErrorKind::Storage(self.root.clone()))?;
        }
        manifest.persist(&self.manifest_path())?;
        tracing::info!(elapsed = ?started.elapsed(), "Cleared OCR cache");
        Ok(())
    }

    /// Retrieves the cached value for a card, if there is one.
    ///
    /// An entry that can't be read or decoded is logged and reported as a
    /// miss; the caller should regenerate it exactly as if it were absent.
    #[instrument(skip(self), fields(language = %self.language))]
    pub fn get(&self, card_id: u32) -> Option<C::Value> {
        let path = self.entry_path(card_id);
        if !path.is_file() {
            return None;
        }
        let loaded = fs::read(&path)
            .or_raise(|| ErrorKind::Storage(path.clone()))
            .and_then(|bytes| self.codec.decode(&bytes));
        match loaded {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(card_id, path = %path.display(), error = ?err, "Unable to load cached OCR result");
                None
            },
        }
    }

    /// Stores the value for a card, replacing any existing entry.
    #[instrument(skip(self, value), fields(language = %self.language))]
    pub fn put(&self, card_id: u32, value: &C::Value) -> Result<()> {
        let bytes = self.codec.encode(value)?;
        fs::create_dir_all(&self.language_dir).or_raise(|| ErrorKind::Storage(self.language_dir.clone()))?;
        let path = self.entry_path(card_id);
        write_atomic(&path, &bytes).or_raise(|| ErrorKind::Storage(path.clone()))?;
        tracing::debug!(card_id, bytes = bytes.len(), "Stored OCR result");
        Ok(())
    }

    /// Returns `true` if an entry exists for the card (readable or not).
    pub fn contains(&self, card_id: u32) -> bool {
        self.entry_path(card_id).is_file()
    }

    /// Deletes the entry for one card. Returns `false` if there was none.
    #[instrument(skip(self), fields(language = %self.language))]
    pub fn remove(&self, card_id: u32) -> Result<bool> {
        let path = self.entry_path(card_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).or_raise(|| ErrorKind::Storage(path.clone())),
        }
    }

    /// Card IDs with an entry in this cache's language, in ascending order.
    ///
    /// Files that don't look like entries are ignored.
    pub fn card_ids(&self) -> Result<Vec<u32>> {
        let entries = match fs::read_dir(&self.language_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Storage(self.language_dir.clone())),
        };
        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.or_raise(|| ErrorKind::Storage(self.language_dir.clone()))?.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && let Ok(id) = stem.parse::<u32>()
                // Must round-trip, or entry_path(id) would name a different file.
                && id.to_string() == stem
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}
