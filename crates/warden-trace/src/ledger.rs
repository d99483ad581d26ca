//! Append-only JSONL agent ledger

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::warn;
use warden_core::WardenResult;

use crate::io::{append_jsonl, hold, PathLocks};
use crate::paths::OrchestrationPaths;
use crate::types::TraceEntry;

/// Writer/reader for `.orchestration/agent_trace.jsonl`.
///
/// Appends are validated against the trace schema, serialised per
/// workspace root and issued as one write each, so in-process concurrent
/// writers always leave one well-formed JSON object per line. Cross-process
/// writers are out of scope.
pub struct Ledger {
    locks: PathLocks,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            locks: PathLocks::new(),
        }
    }

    /// Validate and append one entry. Returns `InvalidEntry` without
    /// touching the file when the schema check fails.
    pub fn append(&self, workspace_root: &Path, entry: &TraceEntry) -> WardenResult<()> {
        entry.validate()?;

        let paths = OrchestrationPaths::new(workspace_root);
        paths.ensure_dir()?;

        let lock = self.locks.lock_for(workspace_root);
        let _guard = hold(&lock);
        append_jsonl(&paths.trace_file(), entry)?;
        Ok(())
    }

    /// Read every valid entry in file order.
    ///
    /// Lines that fail to parse or fail schema validation are skipped with
    /// a warning; a missing ledger reads as empty.
    pub fn read(&self, workspace_root: &Path) -> WardenResult<Vec<TraceEntry>> {
        let trace_file = OrchestrationPaths::new(workspace_root).trace_file();
        if !trace_file.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&trace_file)?);
        let mut entries = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: TraceEntry = match serde_json::from_str(&line) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(line = index + 1, error = %err, "skipping unparsable trace line");
                    continue;
                }
            };
            if let Err(err) = entry.validate() {
                warn!(line = index + 1, error = %err, "skipping invalid trace line");
                continue;
            }
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Number of valid entries currently in the ledger.
    pub fn count(&self, workspace_root: &Path) -> WardenResult<usize> {
        Ok(self.read(workspace_root)?.len())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::sample_entry;
    use warden_core::WardenError;

    #[test]
    fn test_append_then_read_contains_entry_last() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new();

        let first = sample_entry();
        let second = sample_entry();
        ledger.append(dir.path(), &first).unwrap();
        ledger.append(dir.path(), &second).unwrap();

        let entries = ledger.read(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, first.id);
        assert_eq!(entries.last().unwrap().id, second.id);
    }

    #[test]
    fn test_append_rejects_invalid_entry_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new();

        let mut entry = sample_entry();
        entry.files.clear();
        let err = ledger.append(dir.path(), &entry).unwrap_err();
        assert!(matches!(err, WardenError::InvalidEntry { .. }));

        assert!(!OrchestrationPaths::new(dir.path()).trace_file().exists());
    }

    #[test]
    fn test_read_skips_corrupt_lines() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new();
        let entry = sample_entry();
        ledger.append(dir.path(), &entry).unwrap();

        let trace_file = OrchestrationPaths::new(dir.path()).trace_file();
        let mut content = std::fs::read_to_string(&trace_file).unwrap();
        content.push_str("garbage line\n");
        content.push_str("{\"id\":\"not a trace entry\"}\n");
        content.push('\n');
        std::fs::write(&trace_file, content).unwrap();

        let entries = ledger.read(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, entry.id);
    }

    #[test]
    fn test_read_missing_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Ledger::new().read(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_appends_keep_lines_well_formed() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = std::sync::Arc::new(Ledger::new());
        let root = dir.path().to_path_buf();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = std::sync::Arc::clone(&ledger);
                let root = root.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        ledger.append(&root, &sample_entry()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = ledger.read(&root).unwrap();
        assert_eq!(entries.len(), 80);
    }
}
