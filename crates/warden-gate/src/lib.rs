//! Enforcement layer between the tool dispatcher and the filesystem: the
//! write gatekeeper, the post-write trace recorder and the orchestrator
//! facade that owns the shared state.

mod gatekeeper;
mod orchestrator;
mod recorder;
mod types;

pub use gatekeeper::WriteGate;
pub use orchestrator::Orchestrator;
pub use recorder::PostWriteRecorder;
pub use types::{GateVerdict, WriteContext};
