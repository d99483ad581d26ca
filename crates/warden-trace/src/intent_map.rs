//! Re-materialising markdown map of intent to files

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use warden_core::WardenResult;

use crate::io::{atomic_write, hold, PathLocks};
use crate::paths::OrchestrationPaths;

const MAP_HEADER: &str = "# Intent Map";
const MAP_BLURB: &str = "Files touched per active intent, maintained by the write recorder.";
const EMPTY_SECTION: &str = "*No files mapped yet*";

#[derive(Debug, Default)]
struct Section {
    name: Option<String>,
    paths: BTreeSet<String>,
}

/// Writer for `.orchestration/intent_map.md`.
///
/// Every update is a full parse/re-serialise under a per-workspace mutex;
/// sections come out sorted by intent id and paths sorted lexically, so
/// the document is deterministic regardless of update order.
pub struct IntentMap {
    locks: PathLocks,
}

impl IntentMap {
    pub fn new() -> Self {
        Self {
            locks: PathLocks::new(),
        }
    }

    /// Add `path` to the section for `intent_id`, creating the section (and
    /// the document) on demand. A known display name upgrades a name-less
    /// heading; upserting an already-mapped path is a no-op.
    pub fn upsert(
        &self,
        workspace_root: &Path,
        intent_id: &str,
        path: &str,
        intent_name: Option<&str>,
    ) -> WardenResult<()> {
        let paths = OrchestrationPaths::new(workspace_root);
        paths.ensure_dir()?;
        let map_file = paths.intent_map_file();

        let lock = self.locks.lock_for(workspace_root);
        let _guard = hold(&lock);

        let mut sections = match std::fs::read_to_string(&map_file) {
            Ok(content) => parse(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };

        let section = sections.entry(intent_id.to_string()).or_default();
        if section.name.is_none() {
            section.name = intent_name.map(str::to_string);
        }
        section.paths.insert(path.replace('\\', "/"));

        atomic_write(&map_file, render(&sections).as_bytes())?;
        Ok(())
    }

    /// Remove `path` from the section for `intent_id`; a section left empty
    /// is dropped. Missing file or section is a no-op.
    pub fn remove(&self, workspace_root: &Path, intent_id: &str, path: &str) -> WardenResult<()> {
        let map_file = OrchestrationPaths::new(workspace_root).intent_map_file();

        let lock = self.locks.lock_for(workspace_root);
        let _guard = hold(&lock);

        let content = match std::fs::read_to_string(&map_file) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        let mut sections = parse(&content);
        if let Some(section) = sections.get_mut(intent_id) {
            section.paths.remove(&path.replace('\\', "/"));
            if section.paths.is_empty() {
                sections.remove(intent_id);
            }
            atomic_write(&map_file, render(&sections).as_bytes())?;
        }
        Ok(())
    }

    /// Parsed view: intent id to sorted paths.
    pub fn read(&self, workspace_root: &Path) -> WardenResult<BTreeMap<String, Vec<String>>> {
        let map_file = OrchestrationPaths::new(workspace_root).intent_map_file();
        let content = match std::fs::read_to_string(&map_file) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };

        Ok(parse(&content)
            .into_iter()
            .map(|(id, section)| (id, section.paths.into_iter().collect()))
            .collect())
    }
}

impl Default for IntentMap {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(content: &str) -> BTreeMap<String, Section> {
    let mut sections: BTreeMap<String, Section> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("## ") {
            let (id, name) = match heading.split_once(':') {
                Some((id, name)) => (id.trim(), Some(name.trim())),
                None => (heading.trim(), None),
            };
            if id.is_empty() {
                current = None;
                continue;
            }
            let section = sections.entry(id.to_string()).or_default();
            if section.name.is_none() {
                section.name = name.filter(|n| !n.is_empty()).map(str::to_string);
            }
            current = Some(id.to_string());
        } else if let Some(bullet) = trimmed.strip_prefix("- ") {
            if let Some(id) = &current {
                let path = bullet.trim();
                if !path.is_empty() {
                    if let Some(section) = sections.get_mut(id) {
                        section.paths.insert(path.to_string());
                    }
                }
            }
        }
        // Header, blurb, placeholder and blank lines are reconstructed on
        // render and need no state here.
    }

    sections
}

fn render(sections: &BTreeMap<String, Section>) -> String {
    let mut out = format!("{MAP_HEADER}\n\n{MAP_BLURB}\n");

    for (id, section) in sections {
        out.push('\n');
        match &section.name {
            Some(name) => out.push_str(&format!("## {id}: {name}\n\n")),
            None => out.push_str(&format!("## {id}\n\n")),
        }
        if section.paths.is_empty() {
            out.push_str(EMPTY_SECTION);
            out.push('\n');
        } else {
            for path in &section.paths {
                out.push_str(&format!("- {path}\n"));
            }
        }
    }

    out
}
