//! In-memory session store.
//!
//! Sessions are short-lived interactive state; the mobile client owns
//! durable storage, so nothing here survives a restart. Idle sessions are
//! purged lazily and the store is capacity-capped.

use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use service_core::error::AppError;

use crate::models::SplitSession;
use crate::services::metrics::SESSIONS_ACTIVE;

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Arc<Mutex<SplitSession>>>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, idle_ttl_minutes: i64) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            max_sessions,
            idle_ttl: Duration::minutes(idle_ttl_minutes),
        }
    }

    pub fn insert(&self, session: SplitSession) -> Result<Uuid, AppError> {
        self.purge_expired();
        if self.sessions.len() >= self.max_sessions {
            return Err(AppError::ServiceUnavailable(
                "Too many open splits. Please try again later.".to_string(),
            ));
        }

        let id = session.id;
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        SESSIONS_ACTIVE.set(self.sessions.len() as i64);
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Mutex<SplitSession>>> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        SESSIONS_ACTIVE.set(self.sessions.len() as i64);
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn purge_expired(&self) {
        let cutoff = chrono::Utc::now() - self.idle_ttl;
        self.sessions.retain(|_, entry| {
            match entry.try_lock() {
                Ok(session) => session.updated_utc > cutoff,
                // locked means someone is using it right now
                Err(_) => true,
            }
        });
        SESSIONS_ACTIVE.set(self.sessions.len() as i64);
    }
}
