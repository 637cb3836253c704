//! Shared file storage helpers
//!
//! Every record is a single pretty-printed JSON file. Writes go to a
//! `.tmp` sibling first and are renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Chat session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Default location for application data (e.g., ~/.local/share/lingobud)
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|p| p.join("lingobud"))
        .ok_or(StorageError::DataDirNotFound)
}

/// Serialize `value` to `path` using atomic write (write to .tmp then rename)
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, serde_json::to_string_pretty(value)?)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load every `*.json` record in a directory. Unreadable files are skipped
/// with a warning so one corrupt record does not hide the rest.
pub fn read_json_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut records = Vec::new();
    if !dir.exists() {
        return Ok(records);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            match read_json(&path) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Record {
        name: String,
    }

    #[test]
    fn test_write_and_read_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("records");

        write_json_atomic(&dir.join("a.json"), &Record { name: "a".into() }).unwrap();
        write_json_atomic(&dir.join("b.json"), &Record { name: "b".into() }).unwrap();
        fs::write(dir.join("broken.json"), "{not json").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let mut records: Vec<Record> = read_json_dir(&dir).unwrap();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "a");
        assert!(!dir.join("a.json.tmp").exists());
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let records: Vec<Record> = read_json_dir(&temp.path().join("nope")).unwrap();
        assert!(records.is_empty());
    }
}
