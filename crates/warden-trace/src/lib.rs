//! Durable traceability state under `.orchestration/`: the JSONL agent
//! ledger, the derived intent map and the read-only intent catalog.

mod catalog;
mod intent_map;
mod io;
mod ledger;
mod paths;
mod types;

pub use catalog::{Intent, IntentCatalog};
pub use intent_map::IntentMap;
pub use io::{append_jsonl, atomic_write, read_jsonl, PathLocks};
pub use ledger::Ledger;
pub use paths::{OrchestrationPaths, ORCHESTRATION_DIR};
pub use types::{
    Contributor, Conversation, EntityType, FileTrace, LineRange, Related, RelatedType, TraceEntry,
    VcsInfo,
};
