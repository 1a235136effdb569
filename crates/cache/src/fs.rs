use std::io::{Result as IoResult, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Writes `data` to `path` via a temporary file in the same directory, so
/// readers only ever see the previous contents or the complete new contents.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> IoResult<()> {
    let directory = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(directory)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_atomic_replaces_contents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("entry.ocr");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        // No temporary files left behind.
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomic_requires_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(write_atomic(&temp_dir.path().join("missing/entry.ocr"), b"data").is_err());
    }
}
