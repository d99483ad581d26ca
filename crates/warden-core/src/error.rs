//! Error taxonomy for the orchestration pipeline

use thiserror::Error;

/// All errors surfaced by warden components.
///
/// Gatekeeper variants carry the offending path and intent so tool-layer
/// messages can tell the agent how to recover.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Optimistic verification failed: the file changed on disk after the
    /// holder captured its snapshot.
    #[error("stale file: '{path}' changed on disk since {holder} read it; re-read the file and retry")]
    StaleFile { path: String, holder: String },

    /// A write arrived without a bound intent.
    #[error("write to '{path}' must cite a valid active intent; select an intent before editing")]
    NoActiveIntent { path: String },

    /// The cited intent does not exist in the active catalog.
    #[error("intent '{intent_id}' not found in the active intent catalog")]
    IntentNotFound { intent_id: String },

    /// The cited intent declares no owned scope.
    #[error("intent '{intent_id}' has no owned_scope; declare at least one glob pattern for it")]
    NoOwnedScope { intent_id: String },

    /// The target path falls outside the intent's owned scope.
    #[error("scope violation: intent '{name}' ({intent_id}) is not authorised to edit '{path}'; request a scope expansion or switch intents")]
    ScopeViolation {
        intent_id: String,
        name: String,
        path: String,
    },

    /// A trace entry failed schema validation at the ledger boundary.
    #[error("invalid trace entry: {reason}")]
    InvalidEntry { reason: String },

    /// The intent catalog file could not be parsed.
    #[error("intent catalog unreadable: {reason}")]
    Catalog { reason: String },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON failure: {0}")]
    Json(#[from] serde_json::Error),
}

impl WardenError {
    /// Whether the caller can recover by retrying after corrective action
    /// (re-reading the file for stale snapshots, for instance).
    pub fn recoverable(&self) -> bool {
        matches!(self, WardenError::StaleFile { .. } | WardenError::Io(_))
    }
}

/// Convenience alias for results in warden crates.
pub type WardenResult<T> = Result<T, WardenError>;
