//! Injectable time source shared by the stores

use std::sync::Arc;
use std::time::SystemTime;

/// A clock the stores read instead of calling `SystemTime::now` directly,
/// so tests can move time forward deterministically.
#[derive(Clone)]
pub struct Clock {
    source: Arc<dyn Fn() -> SystemTime + Send + Sync>,
}

impl Clock {
    /// The real system clock.
    pub fn system() -> Self {
        Self {
            source: Arc::new(SystemTime::now),
        }
    }

    /// A clock backed by an arbitrary closure.
    pub fn from_fn(source: impl Fn() -> SystemTime + Send + Sync + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn now(&self) -> SystemTime {
        (self.source)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Clock(..)")
    }
}
