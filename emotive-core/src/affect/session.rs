//! Per-conversation affect context and the registry that owns them

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::affect::state::AffectState;
use crate::debug::DebugState;

/// Session id used when the caller does not distinguish conversations
pub const DEFAULT_SESSION: &str = "default";

/// One conversation: its affect values and its debug-mode flag
///
/// All mutation goes through the closures below so a guard never outlives
/// the synchronous step that took it.
#[derive(Debug)]
pub struct Conversation {
    id: String,
    affect: Mutex<AffectState>,
    debug: Mutex<DebugState>,
    created_at: DateTime<Utc>,
    last_active: Mutex<DateTime<Utc>>,
}

impl Conversation {
    /// Create a conversation starting from `initial`
    pub fn new(id: impl Into<String>, initial: AffectState) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            affect: Mutex::new(initial),
            debug: Mutex::new(DebugState::default()),
            created_at: now,
            last_active: Mutex::new(now),
        }
    }

    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last affect or debug access
    pub fn last_active(&self) -> DateTime<Utc> {
        *self.last_active.lock()
    }

    fn touch(&self) {
        *self.last_active.lock() = Utc::now();
    }

    /// Run `f` with exclusive access to the affect state
    pub fn with_affect<R>(&self, f: impl FnOnce(&mut AffectState) -> R) -> R {
        self.touch();
        let mut guard = self.affect.lock();
        f(&mut guard)
    }

    /// Run `f` with exclusive access to both the debug flag and the affect state
    ///
    /// Lock order is debug, then affect.
    pub fn with_debug<R>(&self, f: impl FnOnce(&mut DebugState, &mut AffectState) -> R) -> R {
        self.touch();
        let mut debug = self.debug.lock();
        let mut affect = self.affect.lock();
        f(&mut debug, &mut affect)
    }

    /// Copy of the current affect values
    pub fn snapshot(&self) -> AffectState {
        self.affect.lock().clone()
    }

    /// Whether the conversation is currently in debug mode
    pub fn in_debug(&self) -> bool {
        self.debug.lock().active
    }
}

/// Owns every live conversation, keyed by session id
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Conversation>>,
    template: AffectState,
}

impl SessionRegistry {
    /// Registry whose new conversations start as a copy of `template`
    pub fn new(template: AffectState) -> Self {
        Self {
            sessions: DashMap::new(),
            template,
        }
    }

    /// Fetch a conversation, creating it on first use
    pub fn get_or_create(&self, id: &str) -> Arc<Conversation> {
        if let Some(existing) = self.sessions.get(id) {
            return existing.value().clone();
        }
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(session = id, "Creating conversation");
                Arc::new(Conversation::new(id, self.template.clone()))
            })
            .value()
            .clone()
    }

    /// Create a conversation under a fresh random id
    pub fn create(&self) -> Arc<Conversation> {
        let id = uuid::Uuid::new_v4().to_string();
        self.get_or_create(&id)
    }

    /// The shared conversation used when callers send no session id
    pub fn default_session(&self) -> Arc<Conversation> {
        self.get_or_create(DEFAULT_SESSION)
    }

    /// Fetch an existing conversation
    pub fn get(&self, id: &str) -> Option<Arc<Conversation>> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Drop a conversation. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Ids of all live conversations
    pub fn ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Drop every conversation not used for at least `max_idle`. Returns how
    /// many were dropped.
    ///
    /// Handles already taken by in-flight requests stay usable; only the
    /// registry forgets them.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, conversation| conversation.last_active() > cutoff);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            debug!(evicted, "Evicted idle conversations");
        }
        evicted
    }

    /// Number of live conversations
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no conversation exists yet
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(AffectState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affect::state::{AffectKind, PATIENCE};

    #[test]
    fn test_sessions_are_isolated() {
        let registry = SessionRegistry::default();
        let alice = registry.get_or_create("alice");
        let bob = registry.get_or_create("bob");

        alice
            .with_affect(|s| s.set(AffectKind::Emotion, PATIENCE, -0.8))
            .unwrap();

        assert_eq!(bob.snapshot().emotion(PATIENCE).unwrap(), 0.0);
        assert_eq!(alice.snapshot().emotion(PATIENCE).unwrap(), -0.8);
    }

    #[test]
    fn test_get_or_create_returns_same_handle() {
        let registry = SessionRegistry::default();
        let first = registry.get_or_create("x");
        let second = registry.get_or_create("x");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_create_and_remove() {
        let registry = SessionRegistry::default();
        let conv = registry.create();
        assert!(registry.get(conv.id()).is_some());
        assert!(registry.remove(conv.id()));
        assert!(!registry.remove(conv.id()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_evict_idle_keeps_recent_conversations() {
        let registry = SessionRegistry::default();
        let stale = registry.get_or_create("stale");
        std::thread::sleep(std::time::Duration::from_millis(60));
        registry.get_or_create("fresh").with_affect(|_| ());

        assert_eq!(registry.evict_idle(Duration::hours(1)), 0);
        assert_eq!(registry.evict_idle(Duration::milliseconds(30)), 1);
        assert_eq!(registry.ids(), vec!["fresh".to_string()]);

        // The evicted handle still works, the registry just forgot it
        assert_eq!(stale.snapshot().emotion(PATIENCE).unwrap(), 0.0);

        assert_eq!(registry.evict_idle(Duration::zero()), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_default_session_id() {
        let registry = SessionRegistry::default();
        assert_eq!(registry.default_session().id(), DEFAULT_SESSION);
        assert_eq!(registry.ids(), vec![DEFAULT_SESSION.to_string()]);
    }
}
