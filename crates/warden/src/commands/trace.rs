use std::path::Path;

use warden_trace::Ledger;

pub fn run(workspace_root: &Path, limit: usize) -> anyhow::Result<()> {
    let entries = Ledger::new().read(workspace_root)?;

    if entries.is_empty() {
        println!("Trace ledger is empty.");
        return Ok(());
    }

    let start = entries.len().saturating_sub(limit);
    for entry in &entries[start..] {
        let files: Vec<&str> = entry
            .files
            .iter()
            .map(|f| f.relative_path.as_str())
            .collect();
        let intents: Vec<&str> = entry
            .files
            .iter()
            .flat_map(|f| &f.conversations)
            .flat_map(|c| &c.related)
            .map(|r| r.value.as_str())
            .collect();
        println!(
            "{} {} {:<16} {} [{}]",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            &entry.id[..8],
            entry.mutation_class.as_str(),
            files.join(", "),
            intents.join(", "),
        );
    }
    println!("\n{} of {} entries shown", entries.len() - start, entries.len());
    Ok(())
}
