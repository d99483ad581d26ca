//! Optimistic-concurrency snapshots of file content

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use warden_core::digest;

use crate::clock::Clock;

/// A recorded content digest for one `(path, holder)` pair.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub digest: String,
    pub captured_at: SystemTime,
}

/// In-memory map of file snapshots keyed by workspace-relative path, then
/// by holder session id.
///
/// The store never refreshes a digest on verification: the baseline stays
/// what the holder last read, so an external mutation between two verifies
/// is still detected by the second one.
pub struct SnapshotStore {
    entries: Mutex<HashMap<String, HashMap<String, Snapshot>>>,
    clock: Clock,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::with_clock(Clock::system())
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Record the digest of `content` under `(path, holder)`, replacing any
    /// previous snapshot for the same pair.
    pub fn capture(&self, path: &str, content: &str, holder: &str) {
        let snapshot = Snapshot {
            digest: digest(content),
            captured_at: self.clock.now(),
        };
        let mut entries = self.entries.lock().expect("snapshot map poisoned");
        entries
            .entry(path.to_string())
            .or_default()
            .insert(holder.to_string(), snapshot);
    }

    /// Read the file from disk and capture its current content.
    pub fn capture_from_disk(
        &self,
        workspace_root: &Path,
        path: &str,
        holder: &str,
    ) -> io::Result<()> {
        let content = std::fs::read_to_string(workspace_root.join(path))?;
        self.capture(path, &content, holder);
        Ok(())
    }

    /// Compare the stored digest against the file's current content.
    ///
    /// No snapshot for `(path, holder)` means no prior read and therefore no
    /// stale contract: `Ok(true)`. A read failure is returned to the caller
    /// so the gatekeeper can apply its does-not-block rule.
    pub fn verify(&self, workspace_root: &Path, path: &str, holder: &str) -> io::Result<bool> {
        let baseline = {
            let entries = self.entries.lock().expect("snapshot map poisoned");
            match entries.get(path).and_then(|holders| holders.get(holder)) {
                Some(snapshot) => snapshot.digest.clone(),
                None => return Ok(true),
            }
        };

        // Disk read happens outside the lock; verification is a suspension
        // point and must not serialise unrelated store traffic.
        let content = std::fs::read_to_string(workspace_root.join(path))?;
        Ok(digest(&content) == baseline)
    }

    /// Plain-bool verification: any read failure counts as stale.
    pub fn verify_or_stale(&self, workspace_root: &Path, path: &str, holder: &str) -> bool {
        self.verify(workspace_root, path, holder).unwrap_or(false)
    }

    /// Remove the snapshot for `(path, holder)` if it belongs to `holder`.
    /// Returns whether anything was removed.
    pub fn release(&self, path: &str, holder: &str) -> bool {
        let mut entries = self.entries.lock().expect("snapshot map poisoned");
        let Some(holders) = entries.get_mut(path) else {
            return false;
        };
        let removed = holders.remove(holder).is_some();
        if holders.is_empty() {
            entries.remove(path);
        }
        removed
    }

    /// Remove every snapshot held by `holder`. Returns the count removed.
    pub fn release_all(&self, holder: &str) -> usize {
        let mut entries = self.entries.lock().expect("snapshot map poisoned");
        let mut removed = 0;
        entries.retain(|_, holders| {
            if holders.remove(holder).is_some() {
                removed += 1;
            }
            !holders.is_empty()
        });
        removed
    }

    /// Evict snapshots older than `max_age`. Returns the count evicted.
    pub fn sweep(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("snapshot map poisoned");
        let mut evicted = 0;
        entries.retain(|_, holders| {
            holders.retain(|_, snapshot| {
                let expired = now
                    .duration_since(snapshot.captured_at)
                    .map(|age| age > max_age)
                    .unwrap_or(false);
                if expired {
                    evicted += 1;
                }
                !expired
            });
            !holders.is_empty()
        });
        evicted
    }

    /// Snapshot for `(path, holder)`, if any.
    pub fn get(&self, path: &str, holder: &str) -> Option<Snapshot> {
        let entries = self.entries.lock().expect("snapshot map poisoned");
        entries.get(path).and_then(|holders| holders.get(holder)).cloned()
    }

    /// Total number of live snapshots across all paths and holders.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().expect("snapshot map poisoned");
        entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn manual_clock() -> (Clock, Arc<Mutex<Duration>>) {
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let offset = Arc::new(Mutex::new(Duration::ZERO));
        let handle = Arc::clone(&offset);
        let clock = Clock::from_fn(move || base + *handle.lock().unwrap());
        (clock, offset)
    }

    #[test]
    fn test_verify_without_snapshot_is_true() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new();
        assert!(store.verify(dir.path(), "src/a.ts", "agent-1").unwrap());
    }

    #[test]
    fn test_verify_matches_unchanged_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/a.ts"), "x = 1\n").unwrap();

        let store = SnapshotStore::new();
        store.capture_from_disk(dir.path(), "src/a.ts", "agent-1").unwrap();
        assert!(store.verify(dir.path(), "src/a.ts", "agent-1").unwrap());
    }

    #[test]
    fn test_verify_detects_external_mutation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/a.ts"), "x = 1\n").unwrap();

        let store = SnapshotStore::new();
        store.capture_from_disk(dir.path(), "src/a.ts", "agent-1").unwrap();
        std::fs::write(dir.path().join("src/a.ts"), "x = 2\n").unwrap();

        assert!(!store.verify(dir.path(), "src/a.ts", "agent-1").unwrap());
        // Verification does not refresh the baseline.
        assert!(!store.verify(dir.path(), "src/a.ts", "agent-1").unwrap());
    }

    #[test]
    fn test_verify_read_failure_is_err_and_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new();
        store.capture("src/gone.ts", "content", "agent-1");

        assert!(store.verify(dir.path(), "src/gone.ts", "agent-1").is_err());
        assert!(!store.verify_or_stale(dir.path(), "src/gone.ts", "agent-1"));
    }

    #[test]
    fn test_capture_from_disk_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new();
        assert!(store.capture_from_disk(dir.path(), "nope.ts", "agent-1").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_release_respects_holder() {
        let store = SnapshotStore::new();
        store.capture("src/a.ts", "c", "agent-1");

        assert!(!store.release("src/a.ts", "agent-2"));
        assert_eq!(store.len(), 1);
        assert!(store.release("src/a.ts", "agent-1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_release_all_removes_exactly_one_holder() {
        let store = SnapshotStore::new();
        store.capture("src/a.ts", "c", "agent-1");
        store.capture("src/b.ts", "c", "agent-1");
        store.capture("src/a.ts", "c", "agent-2");

        assert_eq!(store.release_all("agent-1"), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get("src/a.ts", "agent-2").is_some());
    }

    #[test]
    fn test_sweep_evicts_only_expired() {
        let (clock, offset) = manual_clock();
        let store = SnapshotStore::with_clock(clock);

        store.capture("old.ts", "c", "agent-1");
        *offset.lock().unwrap() = Duration::from_secs(240);
        store.capture("young.ts", "c", "agent-1");
        *offset.lock().unwrap() = Duration::from_secs(360);

        assert_eq!(store.sweep(Duration::from_secs(300)), 1);
        assert!(store.get("old.ts", "agent-1").is_none());
        assert!(store.get("young.ts", "agent-1").is_some());
    }

    #[test]
    fn test_capture_overwrites_same_pair() {
        let store = SnapshotStore::new();
        store.capture("src/a.ts", "one", "agent-1");
        let first = store.get("src/a.ts", "agent-1").unwrap();
        store.capture("src/a.ts", "two", "agent-1");
        let second = store.get("src/a.ts", "agent-1").unwrap();

        assert_ne!(first.digest, second.digest);
        assert_eq!(store.len(), 1);
    }
}
