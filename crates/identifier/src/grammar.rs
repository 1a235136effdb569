//! Identifier grammar and known-misread corrections.
//!
//! The grammar is an ordered list of [`Rule`]s. A rule with a literal prefix
//! claims every input starting with that prefix; the first claiming rule is
//! the only one tried. Captured text then passes through [`CORRECTIONS`]
//! before being converted into an [`Identifier`].

use std::sync::LazyLock;

use exn::{OptionExt, ResultExt};
use regex::{Captures, Regex};
use tracing::instrument;

use crate::consts;
use crate::error::{ErrorKind, Result};
use crate::models::Identifier;

/// Identifier fields a [`Correction`] can apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Number,
    SetCode,
}
impl Field {
    fn name(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::SetCode => "setCode",
        }
    }
}

/// A systematic OCR misread and the text that was actually printed.
#[derive(Debug)]
pub(crate) struct Correction {
    pub(crate) field: Field,
    pub(crate) misread: &'static str,
    pub(crate) corrected: &'static str,
}

/// Misreads observed in real scans. Only add entries for misreads that have
/// actually been seen.
pub(crate) static CORRECTIONS: &[Correction] = &[
    Correction { field: Field::Number, misread: "V", corrected: "1" },
    Correction { field: Field::SetCode, misread: "01", corrected: "Q1" },
];

/// One identifier layout.
pub(crate) struct Rule {
    pub(crate) name: &'static str,
    /// Inputs starting with this prefix are handled by this rule only.
    pub(crate) prefix: Option<&'static str>,
    pub(crate) pattern: &'static LazyLock<Regex>,
    /// Value for the grouping when the layout does not print one.
    pub(crate) grouping: Option<&'static str>,
    /// Value for the set code when the layout does not print one.
    pub(crate) set_code: Option<&'static str>,
}
impl Rule {
    fn claims(&self, text: &str) -> bool {
        self.prefix.is_none_or(|prefix| text.starts_with(prefix))
    }
}

pub(crate) static RULES: &[Rule] = &[
    // The first print run used "1TFC EN n/P1", before set codes and
    // groupings moved into their current positions.
    Rule {
        name: "legacy",
        prefix: Some(consts::LEGACY_PREFIX),
        pattern: &consts::LEGACY_REGEX,
        grouping: Some("P1"),
        set_code: Some("1"),
    },
    Rule {
        name: "standard",
        prefix: None,
        pattern: &consts::STANDARD_REGEX,
        grouping: None,
        set_code: None,
    },
];

fn correct(field: Field, captured: &str) -> &str {
    match CORRECTIONS.iter().find(|c| c.field == field && c.misread == captured) {
        Some(correction) => {
            tracing::info!(
                field = field.name(),
                misread = correction.misread,
                corrected = correction.corrected,
                "Correcting known OCR misread"
            );
            correction.corrected
        },
        None => captured,
    }
}

fn capture<'t>(captures: &Captures<'t>, name: &'static str) -> Result<&'t str> {
    captures.name(name).map(|m| m.as_str()).ok_or_raise(|| ErrorKind::ParseError {
        field: name,
        value: String::new(),
    })
}

/// Parses identifier text according to [`RULES`], without logging failures.
#[instrument(level = "trace")]
pub(crate) fn parse(text: &str) -> Result<Identifier> {
    let Some(rule) = RULES.iter().find(|rule| rule.claims(text)) else {
        exn::bail!(ErrorKind::Unrecognized(text.to_string()));
    };
    let Some(captures) = rule.pattern.captures(text) else {
        exn::bail!(ErrorKind::Unrecognized(text.to_string()));
    };
    tracing::trace!(rule = rule.name, "Identifier layout matched");

    let number = correct(Field::Number, capture(&captures, "number")?);
    let number = number.parse::<u32>().or_raise(|| ErrorKind::ParseError {
        field: "number",
        value: number.to_string(),
    })?;
    let grouping = match rule.grouping {
        Some(fixed) => fixed,
        None => capture(&captures, "grouping")?,
    };
    let set_code = match rule.set_code {
        Some(fixed) => fixed,
        None => correct(Field::SetCode, capture(&captures, "setCode")?),
    };
    Ok(Identifier {
        number,
        variant: captures.name("variant").and_then(|m| m.as_str().chars().next()),
        grouping: grouping.to_string(),
        language: capture(&captures, "language")?.to_string(),
        set_code: set_code.to_string(),
    })
}
