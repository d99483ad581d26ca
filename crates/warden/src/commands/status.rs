use std::path::Path;

use warden_lessons::LessonStore;
use warden_trace::{IntentCatalog, IntentMap, Ledger};

pub fn run(workspace_root: &Path) -> anyhow::Result<()> {
    let intents = IntentCatalog::new().list(workspace_root)?.len();
    let trace_entries = Ledger::new().count(workspace_root)?;
    let mapped_intents = IntentMap::new().read(workspace_root)?.len();
    let lessons = LessonStore::new().list(workspace_root)?.len();

    let output = serde_json::json!({
        "intents_declared": intents,
        "trace_entries": trace_entries,
        "intents_mapped": mapped_intents,
        "lessons": lessons,
    });
    println!("{output}");
    Ok(())
}
