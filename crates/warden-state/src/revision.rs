//! VCS revision probe with a short-lived per-workspace cache

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use tracing::debug;
use wait_timeout::ChildExt;

use crate::clock::Clock;

/// Revision reported when the workspace has no resolvable VCS state.
pub const UNKNOWN_REVISION: &str = "unknown";

struct CachedRevision {
    revision: String,
    fetched_at: SystemTime,
}

/// Resolves the current VCS revision of a workspace root.
///
/// Every failure class collapses to [`UNKNOWN_REVISION`]: missing binary,
/// not a repository, non-zero exit, bad encoding, subprocess timeout. The
/// probe never raises. Results are cached per root to keep burst traffic
/// from spawning a subprocess per call.
pub struct RevisionProbe {
    cache_ttl: Duration,
    subprocess_timeout: Duration,
    cache: Mutex<HashMap<PathBuf, CachedRevision>>,
    clock: Clock,
}

impl RevisionProbe {
    pub fn new() -> Self {
        Self::with_config(Duration::from_secs(5), Duration::from_secs(2))
    }

    pub fn with_config(cache_ttl: Duration, subprocess_timeout: Duration) -> Self {
        Self {
            cache_ttl,
            subprocess_timeout,
            cache: Mutex::new(HashMap::new()),
            clock: Clock::system(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current revision id for `workspace_root`, or `"unknown"`.
    pub fn current_revision(&self, workspace_root: &Path) -> String {
        let now = self.clock.now();
        {
            let cache = self.cache.lock().expect("revision cache poisoned");
            if let Some(cached) = cache.get(workspace_root) {
                let fresh = now
                    .duration_since(cached.fetched_at)
                    .map(|age| age <= self.cache_ttl)
                    .unwrap_or(true);
                if fresh {
                    return cached.revision.clone();
                }
            }
        }

        let revision = self.probe(workspace_root);
        let mut cache = self.cache.lock().expect("revision cache poisoned");
        cache.insert(
            workspace_root.to_path_buf(),
            CachedRevision {
                revision: revision.clone(),
                fetched_at: now,
            },
        );
        revision
    }

    /// Drop all cached revisions.
    pub fn invalidate(&self) {
        self.cache.lock().expect("revision cache poisoned").clear();
    }

    fn probe(&self, workspace_root: &Path) -> String {
        let mut child = match Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(workspace_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                debug!(error = %err, "revision probe could not spawn git");
                return UNKNOWN_REVISION.to_string();
            }
        };

        let status = match child.wait_timeout(self.subprocess_timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                debug!("revision probe timed out");
                return UNKNOWN_REVISION.to_string();
            }
            Err(err) => {
                debug!(error = %err, "revision probe wait failed");
                return UNKNOWN_REVISION.to_string();
            }
        };

        if !status.success() {
            return UNKNOWN_REVISION.to_string();
        }

        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            let _ = stdout.read_to_string(&mut output);
        }
        let revision = output.trim();
        if revision.is_empty() {
            UNKNOWN_REVISION.to_string()
        } else {
            revision.to_string()
        }
    }
}

impl Default for RevisionProbe {
    fn default() -> Self {
        Self::new()
    }
}
