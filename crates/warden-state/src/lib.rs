//! In-memory state for the warden runtime: content snapshots, agent
//! sessions and the VCS revision cache, each with its own eviction story.

mod clock;
mod revision;
mod session;
mod snapshot;
mod sweeper;

pub use clock::Clock;
pub use revision::{RevisionProbe, UNKNOWN_REVISION};
pub use session::{Session, SessionRegistry, SESSION_ID_PREFIX};
pub use snapshot::{Snapshot, SnapshotStore};
pub use sweeper::Sweeper;
