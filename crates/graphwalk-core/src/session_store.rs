//! In-memory session store (C4): session id -> [`TraverseSession`].
//!
//! Process-local by contract; the wire protocol does not depend on
//! in-memory semantics, so a durable backend is a drop-in replacement
//! behind [`SessionStore`]'s async methods. Expired sessions are evicted
//! lazily on access rather than via a background sweep, keeping the store
//! a single `RwLock<HashMap<...>>` with no extra task lifecycle to manage.

use crate::session::TraverseSession;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory mapping of session id to traversal state.
///
/// Cloning a `SessionStore` shares the underlying map (it wraps an `Arc`),
/// matching the single process-wide store the wrapper expects to hold.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, TraverseSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn save(&self, session_id: impl Into<String>, session: TraverseSession) {
        let mut guard = self.sessions.write().await;
        guard.insert(session_id.into(), session);
    }

    /// Load a session, evicting it first if its `expires_at` has passed.
    pub async fn load(&self, session_id: &str) -> Option<TraverseSession> {
        let now = Utc::now();
        let mut guard = self.sessions.write().await;
        if let Some(sess) = guard.get(session_id) {
            if sess.expires_at < now {
                guard.remove(session_id);
                return None;
            }
        }
        guard.get(session_id).cloned()
    }

    pub async fn delete(&self, session_id: &str) {
        let mut guard = self.sessions.write().await;
        guard.remove(session_id);
    }

    pub async fn clear_all(&self) {
        let mut guard = self.sessions.write().await;
        guard.clear();
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
