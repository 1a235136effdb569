//! Card identifier parsing.
//!
//! Turns the OCR-read identifier line printed at the bottom-left of a card
//! (`"4/204 • EN • 1"`) into a structured [`Identifier`], compensating for
//! the separator glyphs and characters the OCR engine is known to misread.
//!
//! Parsing is pure: no state, no I/O. The only side effect is diagnostic
//! logging through [`tracing`].

mod consts;
pub mod error;
mod grammar;
pub mod models;

use tracing::instrument;

use crate::error::ErrorKind;
pub use crate::models::Identifier;

/// Easy, top-level entrypoint for parsing an OCR-read identifier line.
///
/// Returns [`None`] when the text matches no known layout, logging a single
/// warning with the offending text so that it can be fixed by a manual
/// correction. Use [`Identifier::from_str`](std::str::FromStr) to get the
/// reason instead.
///
/// # Examples
///
/// ```rust
/// let identifier = lorcana_identifier::parse("4/204 EN 1").unwrap();
/// assert_eq!(identifier.number, 4);
/// assert_eq!(identifier.grouping, "204");
/// assert!(!identifier.is_promo());
///
/// assert!(lorcana_identifier::parse("smudge").is_none());
/// ```
#[instrument(level = "debug")]
pub fn parse(text: &str) -> Option<Identifier> {
    match grammar::parse(text) {
        Ok(identifier) => Some(identifier),
        Err(err) => {
            let reason: &ErrorKind = &err;
            tracing::warn!(text, reason = %reason, "Unable to parse identifier");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Counts events at exactly the given level.
    struct CountingLayer {
        level: Level,
        count: Arc<AtomicUsize>,
    }
    impl<S: Subscriber> Layer<S> for CountingLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == self.level {
                self.count.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn count_events<T>(level: Level, f: impl FnOnce() -> T) -> (T, usize) {
        let count = Arc::new(AtomicUsize::new(0));
        let layer = CountingLayer { level, count: Arc::clone(&count) };
        let subscriber = tracing_subscriber::registry().with(layer);
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, count.load(Ordering::SeqCst))
    }

    #[test]
    fn test_standard_identifier() {
        let identifier = parse("4/204 EN 1").unwrap();
        assert_eq!(
            identifier,
            Identifier {
                number: 4,
                variant: None,
                grouping: "204".to_string(),
                language: "EN".to_string(),
                set_code: "1".to_string(),
            }
        );
        assert!(!identifier.is_promo());
        assert!(!identifier.is_quest());
    }

    #[test]
    fn test_legacy_identifier() {
        let identifier = parse("1TFC EN 7/P1").unwrap();
        assert_eq!(identifier.grouping, "P1");
        assert_eq!(identifier.language, "EN");
        assert_eq!(identifier.number, 7);
        assert_eq!(identifier.set_code, "1");
        assert_eq!(identifier.variant, None);
        assert!(identifier.is_promo());
    }

    #[test]
    fn test_failure_logs_exactly_one_warning() {
        let (result, warnings) = count_events(Level::WARN, || parse("this is not an identifier"));
        assert!(result.is_none());
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_success_logs_no_warning() {
        let (result, warnings) = count_events(Level::WARN, || parse("V/31 EN 01"));
        let identifier = result.unwrap();
        assert_eq!(identifier.number, 1);
        assert_eq!(identifier.set_code, "Q1");
        assert!(identifier.is_quest());
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_corrections_are_logged() {
        let (_, infos) = count_events(Level::INFO, || parse("V/31 EN 01"));
        assert_eq!(infos, 2);
    }

    #[test]
    fn test_from_str_does_not_log() {
        let (result, warnings) = count_events(Level::WARN, || "garbage".parse::<Identifier>());
        assert!(result.is_err());
        assert_eq!(warnings, 0);
    }
}
