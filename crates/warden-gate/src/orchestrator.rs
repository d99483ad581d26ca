//! Runtime root owning the shared orchestration state

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::debug;
use warden_core::{relative_to_workspace, WardenConfig, WardenError, WardenResult};
use warden_state::{RevisionProbe, SessionRegistry, SnapshotStore, Sweeper};
use warden_trace::{Intent, IntentCatalog, IntentMap, Ledger};

use crate::gatekeeper::WriteGate;
use crate::recorder::PostWriteRecorder;
use crate::types::{GateVerdict, WriteContext};

/// The single value the tool-dispatch layer talks to.
///
/// Owns one instance of every store plus the gate and recorder wired over
/// them. There is no ambient global: the embedding runtime creates an
/// orchestrator at startup, starts the sweepers, and drops it on shutdown
/// (which stops them).
pub struct Orchestrator {
    config: WardenConfig,
    snapshots: Arc<SnapshotStore>,
    sessions: Arc<SessionRegistry>,
    probe: Arc<RevisionProbe>,
    ledger: Arc<Ledger>,
    intent_map: Arc<IntentMap>,
    catalog: Arc<IntentCatalog>,
    gate: WriteGate,
    recorder: PostWriteRecorder,
    sweepers: Mutex<Vec<Sweeper>>,
}

impl Orchestrator {
    pub fn new(config: WardenConfig) -> Self {
        let snapshots = Arc::new(SnapshotStore::new());
        let sessions = Arc::new(SessionRegistry::new());
        let probe = Arc::new(RevisionProbe::with_config(
            config.revision_cache_ttl,
            config.revision_probe_timeout,
        ));
        let ledger = Arc::new(Ledger::new());
        let intent_map = Arc::new(IntentMap::new());
        let catalog = Arc::new(IntentCatalog::new());

        let gate = WriteGate::new(Arc::clone(&snapshots), Arc::clone(&catalog));
        let recorder = PostWriteRecorder::new(
            Arc::clone(&snapshots),
            Arc::clone(&probe),
            Arc::clone(&ledger),
            Arc::clone(&intent_map),
            Arc::clone(&catalog),
        );

        Self {
            config,
            snapshots,
            sessions,
            probe,
            ledger,
            intent_map,
            catalog,
            gate,
            recorder,
            sweepers: Mutex::new(Vec::new()),
        }
    }

    /// Register a fresh session and return its id.
    pub fn open_session(&self, intent_id: Option<&str>) -> String {
        let id = SessionRegistry::create_id();
        self.sessions.register(&id, intent_id);
        id
    }

    /// Unregister a session and release every snapshot it still holds.
    pub fn close_session(&self, agent_id: &str) {
        self.sessions.unregister(agent_id);
        let released = self.snapshots.release_all(agent_id);
        if released > 0 {
            debug!(agent_id, released, "released snapshots on session close");
        }
    }

    /// Read pre-hook: snapshot the file for the reader and bump activity.
    /// A file that cannot be read is simply not snapshotted; the read tool
    /// reports its own error.
    pub fn track_read(&self, workspace_root: &Path, path: &str, agent_id: &str) {
        let rel = relative_to_workspace(path, workspace_root);
        if let Err(err) = self.snapshots.capture_from_disk(workspace_root, &rel, agent_id) {
            debug!(path = %rel, error = %err, "read tracking skipped unreadable file");
        }
        self.sessions.add_file(agent_id, &rel);
    }

    /// Write pre-hook: the full gatekeeper pipeline.
    pub fn check_write(&self, workspace_root: &Path, path: &str, ctx: &WriteContext) -> GateVerdict {
        if let Some(agent_id) = ctx.agent_id.as_deref() {
            self.sessions.touch(agent_id);
        }
        self.gate.check(workspace_root, path, ctx)
    }

    /// Write post-hook: trace, map, snapshot release. Never fails the tool.
    pub fn record_write(&self, workspace_root: &Path, path: &str, content: &str, ctx: &WriteContext) {
        self.recorder.record(workspace_root, path, content, ctx);
    }

    /// Bind a session to an intent after validating it against the catalog.
    pub fn select_intent(
        &self,
        workspace_root: &Path,
        agent_id: &str,
        intent_id: &str,
    ) -> WardenResult<Intent> {
        match self.catalog.find_by_id(workspace_root, intent_id)? {
            Some(intent) => {
                self.sessions.set_intent(agent_id, intent_id);
                Ok(intent)
            }
            None => Err(WardenError::IntentNotFound {
                intent_id: intent_id.to_string(),
            }),
        }
    }

    /// Start the snapshot and session sweepers on their configured
    /// cadences. Idempotent; a second call is a no-op.
    pub fn start_sweepers(&self) {
        let mut sweepers = self.sweepers.lock().expect("sweeper list poisoned");
        if !sweepers.is_empty() {
            return;
        }

        let snapshots = Arc::clone(&self.snapshots);
        let snapshot_ttl = self.config.snapshot_ttl;
        sweepers.push(Sweeper::spawn(
            "warden-snapshot-sweeper",
            self.config.snapshot_sweep_interval,
            move || {
                let evicted = snapshots.sweep(snapshot_ttl);
                if evicted > 0 {
                    debug!(evicted, "snapshot sweeper evicted stale snapshots");
                }
            },
        ));

        // Session eviction does not release the session's snapshots; those
        // age out under the snapshot sweeper on its own TTL.
        let sessions = Arc::clone(&self.sessions);
        let session_ttl = self.config.session_ttl;
        sweepers.push(Sweeper::spawn(
            "warden-session-sweeper",
            self.config.session_sweep_interval,
            move || {
                let evicted = sessions.sweep(session_ttl);
                if !evicted.is_empty() {
                    debug!(evicted = evicted.len(), "session sweeper evicted idle sessions");
                }
            },
        ));
    }

    /// Stop both sweepers and wait for their threads to exit.
    pub fn stop_sweepers(&self) {
        let drained: Vec<Sweeper> = {
            let mut sweepers = self.sweepers.lock().expect("sweeper list poisoned");
            sweepers.drain(..).collect()
        };
        for sweeper in drained {
            sweeper.stop();
        }
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn revision_probe(&self) -> &RevisionProbe {
        &self.probe
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn intent_map(&self) -> &IntentMap {
        &self.intent_map
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(WardenConfig::default())
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.stop_sweepers();
    }
}
