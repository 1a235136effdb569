//! Layered configuration for the OCR pipeline.
//!
//! Sources are merged with [figment], later sources overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. The user configuration file in the platform configuration directory
//!    (e.g. `~/.config/lorcana-ocr/config.toml` on Linux)
//! 3. An explicitly requested configuration file (TOML, YAML or JSON,
//!    chosen by extension)
//! 4. Environment variables prefixed with `LORCANA_`, using `__` to nest
//!    (e.g. `LORCANA_CACHE__ROOT=/tmp/cache`)
//! 5. Command-line overrides (currently only the language)
//!
//! Nothing in the pipeline reads configuration globally: the loaded
//! [`Config`] is converted into each component's own options, such as
//! [`CacheOptions`], and passed in at construction.

pub mod error;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use lorcana_ocr_cache::CacheOptions;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};

/// Prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "LORCANA_";
/// Name of the file looked up in the user configuration directory.
pub const USER_CONFIG_FILE: &str = "config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language code of the cards being processed (e.g. `en`, `fr`).
    pub language: String,
    pub cache: CacheConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            cache: CacheConfig::default(),
        }
    }
}

/// OCR cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the manifest and one subdirectory per language.
    pub root: PathBuf,
    /// Files implementing the OCR step. Changing any of them invalidates
    /// every cached result.
    pub dependencies: Vec<PathBuf>,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: Path::new("output").join("cachedOcr"),
            dependencies: vec![
                Path::new("OCR").join("ImageArea.py"),
                Path::new("OCR").join("ImageParser.py"),
                Path::new("OCR").join("ParseSettings.py"),
            ],
        }
    }
}

impl Config {
    /// Loads configuration from all the default sources.
    pub fn load() -> Result<Self> {
        Loader::new().load()
    }

    /// Path of the user configuration file for this platform, if a home
    /// directory can be determined.
    pub fn user_config_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lorcana-ocr").map(|dirs| dirs.config_dir().join(USER_CONFIG_FILE))
    }

    /// Checks values that deserialize fine but can't be used.
    pub fn validate(&self) -> Result<()> {
        if self.language.is_empty() || !self.language.chars().all(|c| c.is_ascii_alphanumeric()) {
            exn::bail!(ErrorKind::Invalid {
                field: "language",
                reason: format!("expected a non-empty alphanumeric language code, found {:?}", self.language),
            });
        }
        if self.cache.root.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid {
                field: "cache.root",
                reason: "cache root must not be empty".to_string(),
            });
        }
        if self.cache.dependencies.is_empty() {
            exn::bail!(ErrorKind::Invalid {
                field: "cache.dependencies",
                reason: "at least one dependency is required to detect stale results".to_string(),
            });
        }
        Ok(())
    }

    /// Options for constructing the OCR cache for the configured language.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            root: self.cache.root.clone(),
            language: self.language.clone(),
            dependencies: self.cache.dependencies.clone(),
        }
    }
}

/// Chooses which sources contribute to a [`Config`].
#[derive(Debug, Clone)]
pub struct Loader {
    user_config: bool,
    env: bool,
    file: Option<PathBuf>,
    language: Option<String>,
}
impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
impl Loader {
    /// A loader using the user configuration file and environment.
    pub fn new() -> Self {
        Self {
            user_config: true,
            env: true,
            file: None,
            language: None,
        }
    }

    /// Skip the user configuration file.
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Skip environment variables.
    pub fn without_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Merge an explicit configuration file, which must exist.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Override the language, regardless of what other sources say.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Builds the merged [`Figment`] without extracting it.
    pub fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if self.user_config
            && let Some(path) = Config::user_config_file()
            && path.is_file()
        {
            tracing::debug!(path = %path.display(), "Merging user configuration file");
            figment = figment.merge(Toml::file_exact(path));
        }
        if let Some(path) = &self.file {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.clone()));
            }
            tracing::debug!(path = %path.display(), "Merging configuration file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file_exact(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.clone())),
            };
        }
        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }
        if let Some(language) = &self.language {
            figment = figment.merge(Serialized::default("language", language));
        }
        Ok(figment)
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<Config> {
        let config: Config = self.figment()?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(language = %config.language, cache_root = %config.cache.root.display(), "Configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    fn isolated() -> Loader {
        Loader::new().without_user_config().without_env()
    }

    #[test]
    fn test_defaults() {
        let config = isolated().load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.language, "en");
        assert_eq!(config.cache.root, Path::new("output/cachedOcr"));
        assert_eq!(config.cache.dependencies.len(), 3);
    }

    #[rstest]
    #[case("config.toml", "language = \"fr\"\n[cache]\nroot = \"/tmp/ocr\"\n")]
    #[case("config.yaml", "language: fr\ncache:\n  root: /tmp/ocr\n")]
    #[case("config.yml", "language: fr\ncache:\n  root: /tmp/ocr\n")]
    #[case("config.json", r#"{"language": "fr", "cache": {"root": "/tmp/ocr"}}"#)]
    fn test_file_formats(#[case] name: &str, #[case] contents: &str) {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(name);
        fs::write(&path, contents).unwrap();
        let config = isolated().file(&path).load().unwrap();
        assert_eq!(config.language, "fr");
        assert_eq!(config.cache.root, Path::new("/tmp/ocr"));
        // Unspecified values keep their defaults.
        assert_eq!(config.cache.dependencies, CacheConfig::default().dependencies);
    }

    #[test]
    fn test_language_override_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "language = \"fr\"\n").unwrap();
        let config = isolated().file(&path).language("de").load().unwrap();
        assert_eq!(config.language, "de");
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = isolated().file(temp_dir.path().join("nope.toml")).load().unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_unsupported_format() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.ini");
        fs::write(&path, "language=fr\n").unwrap();
        let err = isolated().file(&path).load().unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "language = [\n").unwrap();
        let err = isolated().file(&path).load().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load));
    }

    #[rstest]
    #[case("")]
    #[case("en/fr")]
    #[case("..")]
    fn test_invalid_language(#[case] language: &str) {
        let err = isolated().language(language).load().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid { field: "language", .. }));
    }

    #[test]
    fn test_empty_dependencies() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"cache": {"dependencies": []}}"#).unwrap();
        let err = isolated().file(&path).load().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid { field: "cache.dependencies", .. }));
    }

    #[test]
    fn test_cache_options() {
        let config = isolated().language("fr").load().unwrap();
        let options = config.cache_options();
        assert_eq!(options.language, "fr");
        assert_eq!(options.root, config.cache.root);
        assert_eq!(options.dependencies, config.cache.dependencies);
    }
}
