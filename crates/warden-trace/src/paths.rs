//! Path resolution for the orchestration state directory

use std::io;
use std::path::{Path, PathBuf};

/// Directory under the workspace root holding all orchestration state.
pub const ORCHESTRATION_DIR: &str = ".orchestration";

/// Resolves the well-known files under `<workspace_root>/.orchestration/`.
#[derive(Debug, Clone)]
pub struct OrchestrationPaths {
    root: PathBuf,
}

impl OrchestrationPaths {
    pub fn new(workspace_root: &Path) -> Self {
        Self {
            root: workspace_root.to_path_buf(),
        }
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(ORCHESTRATION_DIR)
    }

    /// Append-only JSONL trace ledger.
    pub fn trace_file(&self) -> PathBuf {
        self.dir().join("agent_trace.jsonl")
    }

    /// Derived markdown map of intent to files.
    pub fn intent_map_file(&self) -> PathBuf {
        self.dir().join("intent_map.md")
    }

    /// Shared lessons knowledge file.
    pub fn lessons_file(&self) -> PathBuf {
        self.dir().join("CLAUDE.md")
    }

    /// Declared intents, consumed read-only.
    pub fn catalog_file(&self) -> PathBuf {
        self.dir().join("active_intents.yaml")
    }

    /// Outer-runtime session state (selected intent).
    pub fn session_state_file(&self) -> PathBuf {
        self.dir().join("session_state.json")
    }

    /// Create the orchestration directory if missing and return it.
    pub fn ensure_dir(&self) -> io::Result<PathBuf> {
        let dir = self.dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
