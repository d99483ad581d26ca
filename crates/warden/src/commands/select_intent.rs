use std::path::Path;

use serde::{Deserialize, Serialize};
use warden_trace::{atomic_write, IntentCatalog, OrchestrationPaths};

/// Selected intent persisted for the outer runtime between tool calls.
#[derive(Debug, Serialize, Deserialize)]
struct SessionState {
    intent_id: String,
    selected_at: chrono::DateTime<chrono::Utc>,
}

pub fn run(workspace_root: &Path, intent_id: &str) -> anyhow::Result<()> {
    let catalog = IntentCatalog::new();
    let Some(intent) = catalog.find_by_id(workspace_root, intent_id)? else {
        anyhow::bail!("intent '{intent_id}' not found in the active intent catalog");
    };

    let paths = OrchestrationPaths::new(workspace_root);
    paths.ensure_dir()?;
    let state = SessionState {
        intent_id: intent.id.clone(),
        selected_at: chrono::Utc::now(),
    };
    atomic_write(
        &paths.session_state_file(),
        serde_json::to_string_pretty(&state)?.as_bytes(),
    )?;

    println!("Active intent: {} ({})", intent.display_name(), intent.id);
    for pattern in &intent.owned_scope {
        println!("  owns {pattern}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_known_intent_persists_state() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OrchestrationPaths::new(dir.path());
        paths.ensure_dir().unwrap();
        std::fs::write(
            paths.catalog_file(),
            "intents:\n  - id: INT-001\n    name: Auth flow\n    owned_scope: [\"src/**\"]\n",
        )
        .unwrap();

        run(dir.path(), "INT-001").unwrap();

        let raw = std::fs::read_to_string(paths.session_state_file()).unwrap();
        let state: SessionState = serde_json::from_str(&raw).unwrap();
        assert_eq!(state.intent_id, "INT-001");
    }

    #[test]
    fn test_select_unknown_intent_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), "INT-404").is_err());
    }
}
