use std::path::Path;

use warden_trace::IntentCatalog;

pub fn run(workspace_root: &Path) -> anyhow::Result<()> {
    let intents = IntentCatalog::new().list(workspace_root)?;

    if intents.is_empty() {
        println!("No intents declared. Run `warden init` and edit active_intents.yaml.");
        return Ok(());
    }

    for intent in intents {
        println!("{}: {}", intent.id, intent.display_name());
        for pattern in &intent.owned_scope {
            println!("  - {pattern}");
        }
    }
    Ok(())
}
