//! Pre-write enforcement pipeline

use std::path::Path;
use std::sync::Arc;

use tracing::warn;
use warden_core::{matches_any, relative_to_workspace, WardenError};
use warden_state::SnapshotStore;
use warden_trace::IntentCatalog;

use crate::types::{GateVerdict, WriteContext};

/// The pre-write validation pipeline: snapshot, intent presence, intent
/// existence, scope presence, scope match. First failure wins.
///
/// The gate is deterministic and idempotent and performs at most one disk
/// read (the optimistic verification) per call. It holds no locks across
/// the verdict; a verify and the write it guards are intentionally not
/// atomic with respect to external mutation.
pub struct WriteGate {
    snapshots: Arc<SnapshotStore>,
    catalog: Arc<IntentCatalog>,
}

impl WriteGate {
    pub fn new(snapshots: Arc<SnapshotStore>, catalog: Arc<IntentCatalog>) -> Self {
        Self { snapshots, catalog }
    }

    pub fn check(&self, workspace_root: &Path, path: &str, ctx: &WriteContext) -> GateVerdict {
        let rel = relative_to_workspace(path, workspace_root);

        // 1. Optimistic check against the holder's snapshot. A verification
        //    I/O failure does not block; the underlying write will surface
        //    any real error itself.
        if let Some(agent_id) = ctx.agent_id.as_deref() {
            match self.snapshots.verify(workspace_root, &rel, agent_id) {
                Ok(true) => {}
                Ok(false) => {
                    return GateVerdict::block(WardenError::StaleFile {
                        path: rel,
                        holder: agent_id.to_string(),
                    });
                }
                Err(err) => {
                    warn!(path = %rel, holder = agent_id, error = %err, "snapshot verification failed; not blocking");
                }
            }
        }

        // 2. Intent presence.
        let Some(intent_id) = ctx.intent_id.as_deref().filter(|id| !id.trim().is_empty()) else {
            return GateVerdict::block(WardenError::NoActiveIntent { path: rel });
        };

        // 3/4. Intent existence and scope. A cached scope skips the lookup.
        let (owned_scope, display_name) = match &ctx.owned_scope {
            Some(scope) => (
                scope.clone(),
                ctx.intent_name.clone().unwrap_or_else(|| intent_id.to_string()),
            ),
            None => match self.catalog.find_by_id(workspace_root, intent_id) {
                Ok(Some(intent)) => {
                    let name = intent.display_name().to_string();
                    (intent.owned_scope, name)
                }
                Ok(None) => {
                    return GateVerdict::block(WardenError::IntentNotFound {
                        intent_id: intent_id.to_string(),
                    });
                }
                Err(err) => {
                    // An unreadable catalog cannot resolve any intent.
                    warn!(intent_id, error = %err, "intent catalog lookup failed");
                    return GateVerdict::block(WardenError::IntentNotFound {
                        intent_id: intent_id.to_string(),
                    });
                }
            },
        };

        if owned_scope.is_empty() {
            return GateVerdict::block(WardenError::NoOwnedScope {
                intent_id: intent_id.to_string(),
            });
        }

        // 5. Scope match.
        if !matches_any(&rel, &owned_scope, workspace_root) {
            return GateVerdict::block(WardenError::ScopeViolation {
                intent_id: intent_id.to_string(),
                name: display_name,
                path: rel,
            });
        }

        GateVerdict::Allowed
    }
}
