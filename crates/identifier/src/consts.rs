use regex::Regex;
use std::sync::LazyLock;

/// Glyphs the OCR engine produces when reading the printed separator dot.
const SEPARATOR: &str = r"( ?[-+<«.]{1,2} ?| (. )?)";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Separator printed between identifier fields.
pub(crate) const PRINTED_SEPARATOR: char = '•';
/// Prefix of the identifier on cards from the very first print run.
pub(crate) const LEGACY_PREFIX: &str = "1TFC ";

regex!(LEGACY_REGEX, r"^1TFC (?P<language>[A-Z]+) (?P<number>\d+)/P1");
regex!(
    STANDARD_REGEX,
    format!(
        r"^(?P<number>[0-9V]+)(?P<variant>[A-Za-z])?[/1](?P<grouping>[A-Z]?\d+){SEPARATOR}(?P<language>\w+){SEPARATOR}(?P<setCode>\S+)\n?$"
    )
    .as_str()
);
