//! JSON document I/O shared by every layer.
//!
//! Documents are written with sorted keys and four-space indentation so that
//! config files diff cleanly under version control.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};

/// Result of a save that does not raise on file system failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The document was written to this path.
    Written(PathBuf),
    /// Nothing was written (no location configured, or the target is read-only).
    Skipped,
    /// The write failed; the failure was logged and in-memory state is intact.
    Failed(PathBuf),
}

impl SaveOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Read and parse a JSON document.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).map_err(|e| ConfigError::read_file(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ConfigError::parse(path, e))
}

/// Serialize a value as a key-sorted, four-space-indented JSON document.
pub fn to_document_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let value = sort_keys(serde_json::to_value(value)?);
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Write a document, creating parent directories as needed.
pub fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    // Serialize first so a bad value never truncates an existing file.
    let bytes = to_document_bytes(value)?;
    create_parent_dir(path)?;
    std::fs::write(path, bytes).map_err(|e| ConfigError::write_file(path, e))
}

/// Write a document, logging file system failures instead of raising them.
///
/// Serialization errors are still returned: they indicate a programming
/// error rather than an environmental one.
pub fn save_document<T: Serialize>(path: &Path, value: &T) -> Result<SaveOutcome> {
    match write_document(path, value) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Saved config document");
            Ok(SaveOutcome::Written(path.to_path_buf()))
        }
        Err(err) if err.is_write_failure() => {
            tracing::error!("{err}");
            Ok(SaveOutcome::Failed(path.to_path_buf()))
        }
        Err(err) => Err(err),
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    match std::fs::create_dir_all(parent) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(ConfigError::create_dir(parent, e)),
    }
}

/// Rebuild every object with its keys in sorted order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        zeta: String,
        alpha: Vec<Inner>,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Inner {
        y: u32,
        b: u32,
    }

    fn sample() -> Doc {
        Doc {
            zeta: "z".to_string(),
            alpha: vec![Inner { y: 1, b: 2 }],
        }
    }

    #[test]
    fn keys_are_sorted_and_indented() {
        let text = String::from_utf8(to_document_bytes(&sample()).unwrap()).unwrap();
        let alpha = text.find("\"alpha\"").unwrap();
        let zeta = text.find("\"zeta\"").unwrap();
        assert!(alpha < zeta);
        let b = text.find("\"b\"").unwrap();
        let y = text.find("\"y\"").unwrap();
        assert!(b < y);
        assert!(text.contains("\n    \"alpha\""));
    }

    #[test]
    fn output_is_deterministic() {
        let first = to_document_bytes(&sample()).unwrap();
        let second = to_document_bytes(&sample()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn write_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a").join("b").join("doc.cfg");

        write_document(&path, &sample()).unwrap();
        let loaded: Doc = read_document(&path).unwrap();

        assert_eq!(loaded, sample());
    }

    #[test]
    fn write_into_existing_directory_succeeds() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.cfg");
        write_document(&path, &sample()).unwrap();
        write_document(&path, &sample()).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn read_malformed_document_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.cfg");
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_document::<Doc>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn read_missing_document_is_read_error() {
        let temp = TempDir::new().unwrap();
        let err = read_document::<Doc>(&temp.path().join("missing.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn save_reports_failure_without_raising() {
        let temp = TempDir::new().unwrap();
        // A regular file where a directory is expected makes the write fail.
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("doc.cfg");

        let outcome = save_document(&path, &sample()).unwrap();
        assert_eq!(outcome, SaveOutcome::Failed(path));
    }
}
