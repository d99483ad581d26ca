//! Post-write trace recording

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;
use warden_core::{digest_range, relative_to_workspace, resolve, WardenResult};
use warden_state::{RevisionProbe, SnapshotStore};
use warden_trace::{
    Contributor, Conversation, EntityType, FileTrace, IntentCatalog, IntentMap, Ledger, LineRange,
    Related, RelatedType, TraceEntry, VcsInfo,
};

use crate::types::WriteContext;

/// Builds and persists the trace for a committed write: one ledger row,
/// one intent-map upsert, then a best-effort snapshot release, in that
/// order, after the write itself.
pub struct PostWriteRecorder {
    snapshots: Arc<SnapshotStore>,
    probe: Arc<RevisionProbe>,
    ledger: Arc<Ledger>,
    intent_map: Arc<IntentMap>,
    catalog: Arc<IntentCatalog>,
}

impl PostWriteRecorder {
    pub fn new(
        snapshots: Arc<SnapshotStore>,
        probe: Arc<RevisionProbe>,
        ledger: Arc<Ledger>,
        intent_map: Arc<IntentMap>,
        catalog: Arc<IntentCatalog>,
    ) -> Self {
        Self {
            snapshots,
            probe,
            ledger,
            intent_map,
            catalog,
        }
    }

    /// Record the write. Infallible by contract: ledger-layer failures are
    /// logged and swallowed so they can never fail the tool result.
    pub fn record(&self, workspace_root: &Path, path: &str, content: &str, ctx: &WriteContext) {
        if let Err(err) = self.try_record(workspace_root, path, content, ctx) {
            warn!(path, error = %err, "trace recording failed; tool result unaffected");
        }
    }

    fn try_record(
        &self,
        workspace_root: &Path,
        path: &str,
        content: &str,
        ctx: &WriteContext,
    ) -> WardenResult<()> {
        // Writes without an intent leave no trace by design.
        let Some(intent_id) = ctx.intent_id.as_deref().filter(|id| !id.trim().is_empty()) else {
            return Ok(());
        };

        let rel = relative_to_workspace(path, workspace_root);
        let revision = self.probe.current_revision(workspace_root);
        let mutation_class = resolve(
            ctx.explicit_class.as_deref(),
            ctx.old_content.as_deref(),
            content,
        );

        let line_count = content.lines().count().max(1) as u32;
        let content_hash = format!("sha256:{}", digest_range(content, 1, line_count));
        let url = ctx
            .session_url
            .clone()
            .unwrap_or_else(|| format!("session://{}", Utc::now().timestamp_millis()));

        let entry = TraceEntry {
            id: Uuid::new_v4().simple().to_string(),
            timestamp: Utc::now(),
            vcs: VcsInfo { revision_id: revision },
            files: vec![FileTrace {
                relative_path: rel.clone(),
                conversations: vec![Conversation {
                    url,
                    contributor: Contributor {
                        entity_type: EntityType::Ai,
                        model_identifier: Some(
                            ctx.model.clone().unwrap_or_else(|| "unknown".to_string()),
                        ),
                    },
                    ranges: vec![LineRange {
                        start_line: 1,
                        end_line: line_count,
                        content_hash,
                    }],
                    related: vec![Related {
                        kind: RelatedType::Specification,
                        value: intent_id.to_string(),
                    }],
                }],
            }],
            mutation_class,
        };

        // Trace append happens-before the map update; a map failure after a
        // successful append is an accepted transient inconsistency that the
        // next write for the same intent repairs.
        self.ledger.append(workspace_root, &entry)?;

        let intent_name = ctx
            .intent_name
            .clone()
            .or_else(|| self.catalog.get_cached(intent_id).map(|i| i.display_name().to_string()));
        self.intent_map
            .upsert(workspace_root, intent_id, &rel, intent_name.as_deref())?;

        if let Some(agent_id) = ctx.agent_id.as_deref() {
            self.snapshots.release(&rel, agent_id);
        }

        Ok(())
    }
}
