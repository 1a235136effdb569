//! Path validation for values that end up as cache directory names.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates that `segment` is exactly one normal path component, so that it
/// can't escape (or alias) the cache root.
///
/// Trailing separators are tolerated and stripped. Null bytes are rejected:
/// they pass through [`Path::components`] on Unix but truncate C-based
/// syscalls.
pub(crate) fn validate_segment(segment: &str) -> Result<PathBuf> {
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(s)), None) if !s.as_encoded_bytes().contains(&0) => Ok(PathBuf::from(s)),
        _ => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(segment))),
    }
}
