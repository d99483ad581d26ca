//! JSONL and atomic file primitives plus per-workspace write serialisation

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Append one JSON record to a JSONL file as a single write so concurrent
/// in-process appenders cannot interleave within a line.
pub fn append_jsonl<T: Serialize>(path: &Path, record: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

/// Read all records from a JSONL file in file order.
///
/// Blank lines are tolerated; lines that fail to parse are skipped with a
/// warning rather than failing the whole read.
pub fn read_jsonl<T: for<'de> Deserialize<'de>>(path: &Path) -> std::io::Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(line = index + 1, error = %err, path = %path.display(), "skipping malformed JSONL line");
            }
        }
    }

    Ok(records)
}

/// Replace a file's content atomically via temp file + rename.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, data)?;
    std::fs::rename(temp_path, path)
}

/// One mutex per workspace root, handed out on demand.
///
/// Read-modify-write files (the map, the lessons document) and the ledger
/// append path serialise through these so concurrent updates to one
/// workspace never interleave, while distinct workspaces stay independent.
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The lock for `root`, created on first use.
    pub fn lock_for(&self, root: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("path lock table poisoned");
        Arc::clone(locks.entry(root.to_path_buf()).or_default())
    }
}

impl Default for PathLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience guard helper: lock the mutex, tolerating poisoning (a
/// poisoned file lock only means a previous writer panicked mid-update).
pub(crate) fn hold(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Record {
        id: u32,
        label: String,
    }

    #[test]
    fn test_jsonl_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("records.jsonl");

        let records = vec![
            Record { id: 1, label: "first".to_string() },
            Record { id: 2, label: "second".to_string() },
        ];
        for record in &records {
            append_jsonl(&file, record).unwrap();
        }

        let read: Vec<Record> = read_jsonl(&file).unwrap();
        assert_eq!(read, records);
    }

    #[test]
    fn test_read_skips_malformed_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("records.jsonl");
        std::fs::write(
            &file,
            "{\"id\":1,\"label\":\"ok\"}\nnot json\n\n{\"id\":2,\"label\":\"also ok\"}\n\n",
        )
        .unwrap();

        let read: Vec<Record> = read_jsonl(&file).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[1].id, 2);
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let read: Vec<Record> = read_jsonl(&dir.path().join("absent.jsonl")).unwrap();
        assert!(read.is_empty());
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.md");
        atomic_write(&file, b"one").unwrap();
        atomic_write(&file, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "two");
    }

    #[test]
    fn test_path_locks_same_root_same_lock() {
        let locks = PathLocks::new();
        let a = locks.lock_for(Path::new("/ws/one"));
        let b = locks.lock_for(Path::new("/ws/one"));
        let c = locks.lock_for(Path::new("/ws/two"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
