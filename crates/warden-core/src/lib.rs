//! Pure primitives shared by the warden orchestration middleware

mod classify;
mod config;
mod error;
mod hash;
mod pathspec;

pub use classify::{classify, resolve, MutationClass};
pub use config::WardenConfig;
pub use error::{WardenError, WardenResult};
pub use hash::{digest, digest_range};
pub use pathspec::{matches_any, relative_to_workspace};
