use std::path::Path;

use warden_trace::OrchestrationPaths;

const CATALOG_SKELETON: &str = "\
# Declared intents, consumed read-only by the write gatekeeper.
# Each intent owns a non-empty list of workspace-relative glob patterns.
#
# intents:
#   - id: INT-001
#     name: Example intent
#     owned_scope:
#       - \"src/**\"
intents: []
";

pub fn run(workspace_root: &Path) -> anyhow::Result<()> {
    let paths = OrchestrationPaths::new(workspace_root);
    let dir = paths.ensure_dir()?;

    let catalog_file = paths.catalog_file();
    if catalog_file.exists() {
        println!("✓ {} already initialised", dir.display());
    } else {
        std::fs::write(&catalog_file, CATALOG_SKELETON)?;
        println!("✓ Created {}", dir.display());
        println!("✓ Seeded {}", catalog_file.display());
        println!("\nDeclare your intents in active_intents.yaml before writing.");
    }

    Ok(())
}
