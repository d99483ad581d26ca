//! Tunable lifetimes and cadences for the orchestration runtime

use std::time::Duration;

/// Lifetimes and sweep cadences owned by the runtime root.
///
/// The classifier size threshold is deliberately absent: it is a contract
/// value, not configuration.
#[derive(Debug, Clone)]
pub struct WardenConfig {
    /// Age after which an unreleased snapshot is evicted.
    pub snapshot_ttl: Duration,
    /// Cadence of the snapshot sweeper.
    pub snapshot_sweep_interval: Duration,
    /// Idle time after which an agent session is evicted.
    pub session_ttl: Duration,
    /// Cadence of the session sweeper.
    pub session_sweep_interval: Duration,
    /// How long a probed VCS revision stays cached per workspace root.
    pub revision_cache_ttl: Duration,
    /// Kill budget for the VCS subprocess.
    pub revision_probe_timeout: Duration,
}

impl WardenConfig {
    pub fn new() -> Self {
        Self {
            snapshot_ttl: Duration::from_secs(5 * 60),
            snapshot_sweep_interval: Duration::from_secs(60),
            session_ttl: Duration::from_secs(30 * 60),
            session_sweep_interval: Duration::from_secs(300),
            revision_cache_ttl: Duration::from_secs(5),
            revision_probe_timeout: Duration::from_secs(2),
        }
    }
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WardenConfig::new();
        assert_eq!(config.snapshot_ttl, Duration::from_secs(300));
        assert_eq!(config.session_ttl, Duration::from_secs(1800));
        assert_eq!(config.revision_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.snapshot_sweep_interval, Duration::from_secs(60));
        assert_eq!(config.session_sweep_interval, Duration::from_secs(300));
    }
}
