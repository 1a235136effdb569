//! Command-line interface definition and command handlers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use exn::ResultExt;
use lorcana_config::{Config, Loader};
use lorcana_ocr::error::{ErrorKind, Result};
use lorcana_ocr_cache::{OcrCache, Raw};
use tracing::level_filters::LevelFilter;

/// Maintain the OCR result cache and parse card identifiers.
#[derive(Debug, Parser)]
#[command(name = "lorcana-ocr", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON) merged over the defaults.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Language code of the cards, overriding configuration.
    #[arg(long, short, global = true, value_name = "CODE")]
    pub language: Option<String>,
    /// Minimum level of log messages. `RUST_LOG` directives take precedence.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the cache against the OCR implementation, clearing it if stale.
    Validate,
    /// Delete all cached OCR results, for every language.
    Clear,
    /// Parse card identifier lines.
    Parse {
        #[arg(required = true, value_name = "TEXT")]
        texts: Vec<String>,
    },
    /// List card IDs with cached OCR results.
    Cached,
}

impl Cli {
    fn config(&self, mut loader: Loader) -> Result<Config> {
        if let Some(path) = &self.config {
            loader = loader.file(path);
        }
        if let Some(language) = &self.language {
            loader = loader.language(language);
        }
        loader.load().or_raise(|| ErrorKind::Config)
    }

    fn cache(&self, loader: Loader) -> Result<OcrCache<Raw>> {
        OcrCache::new(self.config(loader)?.cache_options(), Raw).or_raise(|| ErrorKind::Cache)
    }

    /// Runs the selected command. Returns `false` if it completed but some
    /// of its input was rejected.
    pub fn run(&self) -> Result<bool> {
        self.run_with(Loader::new())
    }

    /// Runs the selected command, layering the command-line options over
    /// the sources chosen by `loader`.
    fn run_with(&self, loader: Loader) -> Result<bool> {
        match &self.command {
            Command::Validate => {
                let cache = self.cache(loader)?;
                let valid = cache.validate().or_raise(|| ErrorKind::Cache)?;
                match valid {
                    true => println!("OCR cache at {} is valid", cache.root().display()),
                    false => println!("OCR cache at {} was rebuilt", cache.root().display()),
                }
                Ok(true)
            },
            Command::Clear => {
                let cache = self.cache(loader)?;
                cache.clear(None).or_raise(|| ErrorKind::Cache)?;
                println!("Cleared OCR cache at {}", cache.root().display());
                Ok(true)
            },
            Command::Parse { texts } => Ok(parse_all(texts)),
            Command::Cached => {
                let cache = self.cache(loader)?;
                for card_id in cache.card_ids().or_raise(|| ErrorKind::Cache)? {
                    println!("{card_id}");
                }
                Ok(true)
            },
        }
    }
}

fn parse_all(texts: &[String]) -> bool {
    let mut all_parsed = true;
    for text in texts {
        match lorcana_identifier::parse(text) {
            Some(identifier) => println!("{identifier}"),
            None => {
                eprintln!("Unable to parse identifier: {text:?}");
                all_parsed = false;
            },
        }
    }
    all_parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Ignores the user configuration file and `LORCANA_*` variables.
    fn isolated() -> Loader {
        Loader::new().without_user_config().without_env()
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["lorcana-ocr", "cached", "--language", "fr", "--log-level", "debug"]).unwrap();
        assert!(matches!(cli.command, Command::Cached));
        assert_eq!(cli.language.as_deref(), Some("fr"));
        assert_eq!(cli.log_level, LevelFilter::DEBUG);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["lorcana-ocr", "validate"]).unwrap();
        assert_eq!(cli.log_level, LevelFilter::INFO);
        assert_eq!(cli.config, None);
        assert_eq!(cli.language, None);
    }

    #[rstest]
    #[case(&["lorcana-ocr"])]
    #[case(&["lorcana-ocr", "parse"])]
    #[case(&["lorcana-ocr", "--log-level", "loud", "clear"])]
    fn test_rejected_arguments(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[rstest]
    #[case(&["1/204 • EN • 1", "1TFC EN 7/P1"], true)]
    #[case(&["1/204 • EN • 1", "not an identifier"], false)]
    fn test_parse_all(#[case] texts: &[&str], #[case] expected: bool) {
        let texts: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
        assert_eq!(parse_all(&texts), expected);
    }

    #[test]
    fn test_cached_lists_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = temp_dir.path().join("config.json");
        let root = temp_dir.path().join("cachedOcr");
        std::fs::write(
            &config,
            format!(r#"{{"cache": {{"root": {:?}, "dependencies": ["ImageParser.py"]}}}}"#, root.display().to_string()),
        )
        .unwrap();
        let cli = Cli::try_parse_from(["lorcana-ocr", "--config", config.to_str().unwrap(), "-l", "de", "cached"]).unwrap();
        let cache = cli.cache(isolated()).unwrap();
        assert_eq!(cache.language(), "de");
        assert_eq!(cache.root(), root);
        cache.put(7, &b"seven".to_vec()).unwrap();
        assert!(cli.run_with(isolated()).unwrap());
    }
}
