//! Session state storage.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

/// Default idle lifetime of a session (7 days).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Per-session server state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Set once the client has submitted the correct PIN
    pub authenticated: bool,
}

impl SessionState {
    /// State of a session that passed the PIN check.
    pub const fn authenticated() -> Self {
        Self {
            authenticated: true,
        }
    }
}

/// Storage for session state, keyed by session ID.
///
/// Unknown or expired IDs read as the default (unauthenticated) state, so
/// callers never need to distinguish "no session" from "not logged in".
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current state of a session.
    async fn get(&self, session_id: &str) -> SessionState;

    /// Create or overwrite a session.
    async fn set(&self, session_id: &str, state: SessionState);

    /// Forget a session.
    async fn remove(&self, session_id: &str);
}

struct StoredSession {
    state: SessionState,
    last_seen: Instant,
}

/// In-memory [`SessionStore`] with sliding idle expiry.
///
/// Each successful `get` extends the session's lifetime. Expired entries are
/// ignored on read and dropped by [`MemorySessionStore::cleanup_expired`].
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
    ttl: Duration,
}

impl MemorySessionStore {
    /// Create an empty store whose sessions expire after `ttl` of inactivity.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Idle lifetime of sessions.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored sessions, including expired ones not yet cleaned up.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop expired sessions. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen.elapsed() < self.ttl);
        before - sessions.len()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> SessionState {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) if session.last_seen.elapsed() < self.ttl => {
                session.last_seen = Instant::now();
                session.state
            }
            Some(_) => {
                sessions.remove(session_id);
                SessionState::default()
            }
            None => SessionState::default(),
        }
    }

    async fn set(&self, session_id: &str, state: SessionState) {
        self.sessions.write().await.insert(
            session_id.to_string(),
            StoredSession {
                state,
                last_seen: Instant::now(),
            },
        );
    }

    async fn remove(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }
}
