//! Agent session registry with activity-based lifecycle

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::clock::Clock;

/// Prefix carried by every generated session id.
pub const SESSION_ID_PREFIX: &str = "agent-";

/// One tracked agent session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: SystemTime,
    pub last_activity: SystemTime,
    pub intent_id: Option<String>,
    pub files: BTreeSet<String>,
}

/// Registry of live agent sessions.
///
/// Sessions appear on first interaction and disappear on explicit
/// unregister or idle eviction. Eviction is coarser than the snapshot
/// sweeper; an evicted session's snapshots linger until that sweeper
/// catches them.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
    clock: Clock,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_clock(Clock::system())
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Generate a fresh session id: the fixed prefix plus 8 hex chars.
    pub fn create_id() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("{SESSION_ID_PREFIX}{}", &hex[..8])
    }

    /// Register `id`, optionally bound to an intent. Re-registering an
    /// existing id refreshes its activity and intent binding.
    pub fn register(&self, id: &str, intent_id: Option<&str>) {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        let session = sessions.entry(id.to_string()).or_insert_with(|| Session {
            id: id.to_string(),
            created_at: now,
            last_activity: now,
            intent_id: None,
            files: BTreeSet::new(),
        });
        session.last_activity = now;
        if let Some(intent) = intent_id {
            session.intent_id = Some(intent.to_string());
        }
    }

    /// Remove a session, returning it so the caller can release whatever
    /// the session still holds.
    pub fn unregister(&self, id: &str) -> Option<Session> {
        self.sessions.lock().expect("session map poisoned").remove(id)
    }

    /// Refresh last-activity. Unknown ids are created on the spot: a
    /// session exists from its first interaction.
    pub fn touch(&self, id: &str) {
        self.register(id, None);
    }

    /// Bind `id` to an intent, creating the session if needed.
    pub fn set_intent(&self, id: &str, intent_id: &str) {
        self.register(id, Some(intent_id));
    }

    /// Intent currently bound to `id`, if any.
    pub fn intent_of(&self, id: &str) -> Option<String> {
        let sessions = self.sessions.lock().expect("session map poisoned");
        sessions.get(id).and_then(|s| s.intent_id.clone())
    }

    /// Record that `id` observed `path`. Implicitly touches the session.
    pub fn add_file(&self, id: &str, path: &str) {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        let session = sessions.entry(id.to_string()).or_insert_with(|| Session {
            id: id.to_string(),
            created_at: now,
            last_activity: now,
            intent_id: None,
            files: BTreeSet::new(),
        });
        session.last_activity = now;
        session.files.insert(path.to_string());
    }

    pub fn remove_file(&self, id: &str, path: &str) {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        if let Some(session) = sessions.get_mut(id) {
            session.files.remove(path);
        }
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.sessions.lock().expect("session map poisoned").contains_key(id)
    }

    /// Ids of all live sessions, in no particular order.
    pub fn list_active(&self) -> Vec<String> {
        let sessions = self.sessions.lock().expect("session map poisoned");
        sessions.keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.lock().expect("session map poisoned").get(id).cloned()
    }

    /// Evict sessions idle longer than `max_age`, returning the evicted
    /// sessions for the caller to log or clean up after.
    pub fn sweep(&self, max_age: Duration) -> Vec<Session> {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        let mut evicted = Vec::new();
        sessions.retain(|_, session| {
            let expired = now
                .duration_since(session.last_activity)
                .map(|idle| idle > max_age)
                .unwrap_or(false);
            if expired {
                evicted.push(session.clone());
            }
            !expired
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session map poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn manual_clock() -> (Clock, Arc<Mutex<Duration>>) {
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let offset = Arc::new(Mutex::new(Duration::ZERO));
        let handle = Arc::clone(&offset);
        let clock = Clock::from_fn(move || base + *handle.lock().unwrap());
        (clock, offset)
    }

    #[test]
    fn test_create_id_format() {
        let id = SessionRegistry::create_id();
        assert!(id.starts_with(SESSION_ID_PREFIX));
        let suffix = &id[SESSION_ID_PREFIX.len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, SessionRegistry::create_id());
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = SessionRegistry::new();
        registry.register("agent-00000001", Some("INT-001"));

        assert!(registry.is_active("agent-00000001"));
        assert_eq!(registry.intent_of("agent-00000001").as_deref(), Some("INT-001"));
        assert!(!registry.is_active("agent-ffffffff"));
    }

    #[test]
    fn test_unregister_returns_session() {
        let registry = SessionRegistry::new();
        registry.register("agent-00000001", None);
        registry.add_file("agent-00000001", "src/a.ts");

        let session = registry.unregister("agent-00000001").unwrap();
        assert!(session.files.contains("src/a.ts"));
        assert!(registry.is_empty());
        assert!(registry.unregister("agent-00000001").is_none());
    }

    #[test]
    fn test_add_file_creates_session_on_first_interaction() {
        let registry = SessionRegistry::new();
        registry.add_file("agent-00000002", "src/b.ts");

        let session = registry.get("agent-00000002").unwrap();
        assert!(session.files.contains("src/b.ts"));
        assert!(session.last_activity >= session.created_at);
    }

    #[test]
    fn test_touch_refreshes_activity() {
        let (clock, offset) = manual_clock();
        let registry = SessionRegistry::with_clock(clock);
        registry.register("agent-00000003", None);

        *offset.lock().unwrap() = Duration::from_secs(120);
        registry.touch("agent-00000003");

        let session = registry.get("agent-00000003").unwrap();
        assert_eq!(
            session.last_activity.duration_since(session.created_at).unwrap(),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_sweep_evicts_idle_sessions() {
        let (clock, offset) = manual_clock();
        let registry = SessionRegistry::with_clock(clock);

        registry.register("agent-stale", None);
        *offset.lock().unwrap() = Duration::from_secs(1700);
        registry.register("agent-fresh", None);
        *offset.lock().unwrap() = Duration::from_secs(1900);

        let evicted = registry.sweep(Duration::from_secs(1800));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, "agent-stale");
        assert!(registry.is_active("agent-fresh"));
    }

    #[test]
    fn test_remove_file() {
        let registry = SessionRegistry::new();
        registry.add_file("agent-00000004", "src/a.ts");
        registry.remove_file("agent-00000004", "src/a.ts");
        assert!(registry.get("agent-00000004").unwrap().files.is_empty());
    }
}
