use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::consts::PRINTED_SEPARATOR;
use crate::error::Error;

/// A card identifier as printed at the bottom-left of a card.
///
/// Regular and Enchanted cards share a numeric grouping (the size of the
/// set, e.g. `204`); promotional prints use a lettered grouping such as `P1`
/// or `D23`. Quest cards carry a set code starting with `Q`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Identifier {
    /// Collector number within the grouping
    pub number: u32,
    /// Single-letter variant marker, if any (e.g. `a`)
    pub variant: Option<char>,
    /// `204` for regular cards, `P1`, `D23`, ... for promos
    pub grouping: String,
    /// Language code as printed (e.g. `EN`)
    pub language: String,
    /// Set code as printed (e.g. `1`, `Q1`)
    pub set_code: String,
}
impl Identifier {
    /// Returns `true` if this identifier belongs to a promotional print.
    ///
    /// ```
    /// use lorcana_identifier::models::Identifier;
    /// let promo: Identifier = "7/P1 • EN • 1".parse().unwrap();
    /// assert!(promo.is_promo());
    /// ```
    pub fn is_promo(&self) -> bool {
        self.grouping.is_empty() || !self.grouping.chars().all(char::is_numeric)
    }

    /// Returns `true` if this identifier belongs to a Quest card.
    pub fn is_quest(&self) -> bool {
        self.set_code.starts_with('Q')
    }
}
impl FromStr for Identifier {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::grammar::parse(s)
    }
}
impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.number)?;
        if let Some(variant) = self.variant {
            write!(f, "{variant}")?;
        }
        write!(
            f,
            "/{} {PRINTED_SEPARATOR} {} {PRINTED_SEPARATOR} {}",
            self.grouping, self.language, self.set_code
        )
    }
}
