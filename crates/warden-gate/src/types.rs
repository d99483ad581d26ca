//! Shared request context and gate verdicts

use warden_core::WardenError;

/// Everything the gatekeeper and recorder know about one write attempt.
///
/// `owned_scope` and `intent_name` act as a cache: when the dispatcher
/// already resolved the intent it can hand the scope over and the gate
/// skips the catalog lookup entirely.
#[derive(Debug, Clone, Default)]
pub struct WriteContext {
    pub intent_id: Option<String>,
    pub owned_scope: Option<Vec<String>>,
    pub intent_name: Option<String>,
    pub agent_id: Option<String>,
    /// Conversation url recorded in the trace; falls back to a synthetic
    /// `session://` url when absent.
    pub session_url: Option<String>,
    pub model: Option<String>,
    /// Mutation class claimed by the tool arguments, if any.
    pub explicit_class: Option<String>,
    /// Content before the write, when the dispatcher has it.
    pub old_content: Option<String>,
}

/// Outcome of the pre-write pipeline.
#[derive(Debug)]
pub enum GateVerdict {
    Allowed,
    Blocked {
        error: WardenError,
        recoverable: bool,
    },
}

impl GateVerdict {
    pub(crate) fn block(error: WardenError) -> Self {
        let recoverable = error.recoverable();
        GateVerdict::Blocked { error, recoverable }
    }

    pub fn blocked(&self) -> bool {
        matches!(self, GateVerdict::Blocked { .. })
    }

    /// Human-readable block reason, if blocked.
    pub fn message(&self) -> Option<String> {
        match self {
            GateVerdict::Allowed => None,
            GateVerdict::Blocked { error, .. } => Some(error.to_string()),
        }
    }
}
