//! Read-only view over the declared intent catalog

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use warden_core::{WardenError, WardenResult};

use crate::paths::OrchestrationPaths;

/// A declared unit of business work with the workspace paths it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owned_scope: Vec<String>,
}

impl Intent {
    /// Display name for messages and map headings; falls back to the id
    /// when no name was declared.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    intents: Vec<Intent>,
}

/// Projection of `.orchestration/active_intents.yaml` with a by-id cache.
///
/// The file is externally owned and consumed read-only; a missing file
/// simply means no intents are declared.
pub struct IntentCatalog {
    cache: Mutex<HashMap<String, Intent>>,
}

impl IntentCatalog {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// All declared intents in file order.
    pub fn list(&self, workspace_root: &Path) -> WardenResult<Vec<Intent>> {
        let catalog_file = OrchestrationPaths::new(workspace_root).catalog_file();
        let content = match std::fs::read_to_string(&catalog_file) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let parsed: CatalogFile =
            serde_yaml::from_str(&content).map_err(|err| WardenError::Catalog {
                reason: err.to_string(),
            })?;
        Ok(parsed.intents)
    }

    /// Resolve an intent id against the catalog file, refreshing the cache
    /// on a hit.
    pub fn find_by_id(&self, workspace_root: &Path, id: &str) -> WardenResult<Option<Intent>> {
        let found = self.list(workspace_root)?.into_iter().find(|i| i.id == id);
        if let Some(intent) = &found {
            let mut cache = self.cache.lock().expect("catalog cache poisoned");
            cache.insert(intent.id.clone(), intent.clone());
        }
        Ok(found)
    }

    /// Serve an intent from the cache only; no disk access.
    pub fn get_cached(&self, id: &str) -> Option<Intent> {
        self.cache.lock().expect("catalog cache poisoned").get(id).cloned()
    }
}

impl Default for IntentCatalog {
    fn default() -> Self {
        Self::new()
    }
}
