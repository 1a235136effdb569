//! Digests of the artifacts that determine what the OCR step produces.
//!
//! If any of them change, cached OCR results can no longer be trusted.

use std::collections::BTreeMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::fs;

use derive_more::Display;
use exn::ResultExt;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};
use crate::fs::write_atomic;

/// Mapping of dependency name to the BLAKE3 hex digest of its raw bytes.
///
/// Dependency names are the configured paths, as written in the
/// configuration. Ordered, so the persisted form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

/// Why a persisted manifest no longer describes the current dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Staleness {
    #[display("digest mismatch for '{_0}'")]
    Changed(String),
    #[display("dependency '{_0}' has disappeared")]
    Missing(String),
    #[display("dependency '{_0}' is missing from the manifest")]
    Added(String),
}

impl Manifest {
    /// Computes the manifest for the current bytes of each dependency.
    ///
    /// Dependencies that do not exist are left out (and will make a manifest
    /// that previously contained them stale). Any other read failure is an
    /// error.
    pub fn compute(dependencies: &[PathBuf]) -> Result<Self> {
        let mut digests = BTreeMap::new();
        for dependency in dependencies {
            let bytes = match fs::read(dependency) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == IoErrorKind::NotFound => {
                    tracing::warn!(dependency = %dependency.display(), "OCR cache dependency not found; leaving it out of the manifest");
                    continue;
                },
                Err(e) => return Err(e).or_raise(|| ErrorKind::Dependency(dependency.clone())),
            };
            digests.insert(Self::name(dependency), blake3::hash(&bytes).to_string());
        }
        Ok(Self(digests))
    }

    /// Manifest key used for a dependency path.
    pub fn name(dependency: &Path) -> String {
        dependency.to_string_lossy().into_owned()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Compares this (persisted) manifest against a freshly computed one,
    /// returning the first reason it is stale, if any.
    pub fn staleness(&self, fresh: &Manifest) -> Option<Staleness> {
        for (name, digest) in &self.0 {
            match fresh.get(name) {
                None => return Some(Staleness::Missing(name.clone())),
                Some(current) if current != digest => return Some(Staleness::Changed(name.clone())),
                Some(_) => {},
            }
        }
        fresh.0.keys().find(|name| !self.0.contains_key(*name)).map(|name| Staleness::Added(name.clone()))
    }

    /// Reads a persisted manifest. Missing and unreadable manifests both
    /// come back as [`None`].
    pub(crate) fn load(path: &Path) -> Option<Self> {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unable to read OCR cache manifest");
                return None;
            },
        };
        match serde_json::from_slice(&contents) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "OCR cache manifest is corrupt");
                None
            },
        }
    }

    pub(crate) fn persist(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).or_raise(|| ErrorKind::Manifest(path.to_path_buf()))?;
        write_atomic(path, &json).or_raise(|| ErrorKind::Manifest(path.to_path_buf()))
    }
}
impl FromIterator<(String, String)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn manifest(entries: &[(&str, &str)]) -> Manifest {
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_compute_hashes_raw_bytes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let area = temp_dir.path().join("ImageArea.py");
        let parser = temp_dir.path().join("ImageParser.py");
        fs::write(&area, b"AREA = 1\n").unwrap();
        fs::write(&parser, b"def parse(): pass\n").unwrap();

        let computed = Manifest::compute(&[area.clone(), parser.clone()]).unwrap();
        assert_eq!(computed.len(), 2);
        assert_eq!(computed.get(&Manifest::name(&area)), Some(blake3::hash(b"AREA = 1\n").to_string().as_str()));
        // Deterministic.
        assert_eq!(computed, Manifest::compute(&[parser, area]).unwrap());
    }

    #[test]
    fn test_compute_skips_missing_dependencies() {
        let temp_dir = tempfile::tempdir().unwrap();
        let present = temp_dir.path().join("present.py");
        fs::write(&present, b"x").unwrap();
        let computed = Manifest::compute(&[present.clone(), temp_dir.path().join("absent.py")]).unwrap();
        assert_eq!(computed.len(), 1);
        assert!(computed.get(&Manifest::name(&present)).is_some());
    }

    #[test]
    fn test_compute_fails_on_unreadable_dependency() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A directory exists, but can't be read as a file.
        let err = Manifest::compute(&[temp_dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Dependency(_)));
    }

    #[rstest]
    #[case(manifest(&[("a", "1"), ("b", "2")]), None)]
    #[case(manifest(&[("a", "1"), ("b", "3")]), Some(Staleness::Changed("b".to_string())))]
    #[case(manifest(&[("a", "1")]), Some(Staleness::Missing("b".to_string())))]
    #[case(manifest(&[("a", "1"), ("b", "2"), ("c", "3")]), Some(Staleness::Added("c".to_string())))]
    #[case(manifest(&[]), Some(Staleness::Missing("a".to_string())))]
    fn test_staleness(#[case] fresh: Manifest, #[case] expected: Option<Staleness>) {
        let persisted = manifest(&[("a", "1"), ("b", "2")]);
        assert_eq!(persisted.staleness(&fresh), expected);
    }

    #[test]
    fn test_persist_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("manifest.json");
        let original = manifest(&[("OCR/ImageArea.py", "abc"), ("OCR/ImageParser.py", "def")]);
        original.persist(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"OCR/ImageArea.py\": \"abc\""));
        assert_eq!(Manifest::load(&path), Some(original));
    }

    #[test]
    fn test_hand_edited_digest_is_just_stale() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("manifest.json");
        let edited = manifest(&[("OCR/ImageArea.py", "abcdefghijké-digest")]);
        edited.persist(&path).unwrap();
        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded.get("OCR/ImageArea.py"), Some("abcdefghijké-digest"));
        assert_eq!(
            loaded.staleness(&manifest(&[("OCR/ImageArea.py", "abc")])),
            Some(Staleness::Changed("OCR/ImageArea.py".to_string()))
        );
    }

    #[test]
    fn test_load_missing_or_corrupt() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("manifest.json");
        assert_eq!(Manifest::load(&path), None);
        fs::write(&path, b"{\"truncated\": ").unwrap();
        assert_eq!(Manifest::load(&path), None);
        fs::write(&path, b"[1, 2, 3]").unwrap();
        assert_eq!(Manifest::load(&path), None);
    }
}
