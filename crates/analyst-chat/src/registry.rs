//! Process-wide session registry.
//!
//! Each session sits behind its own async mutex so that only one action cycle
//! runs against it at a time. Idle sessions are evicted lazily on access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::ChatError;
use crate::session::Session;

pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

struct Entry {
    session: SharedSession,
    last_access: Instant,
}

pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self::new(Duration::from_secs(u64::from(minutes) * 60))
    }

    /// Register `session` and return its id.
    pub fn insert(&self, session: Session) -> Result<Uuid, ChatError> {
        let id = session.id;
        let mut sessions = self.lock()?;
        self.evict_idle(&mut sessions);
        sessions.insert(
            id,
            Entry {
                session: Arc::new(tokio::sync::Mutex::new(session)),
                last_access: Instant::now(),
            },
        );
        tracing::info!(session_id = %id, active = sessions.len(), "Session registered");
        Ok(id)
    }

    /// Look up a live session and refresh its idle clock.
    pub fn get(&self, id: Uuid) -> Result<SharedSession, ChatError> {
        let mut sessions = self.lock()?;
        self.evict_idle(&mut sessions);
        let entry = sessions.get_mut(&id).ok_or(ChatError::SessionNotFound(id))?;
        entry.last_access = Instant::now();
        Ok(entry.session.clone())
    }

    pub fn remove(&self, id: Uuid) -> Result<(), ChatError> {
        let mut sessions = self.lock()?;
        if sessions.remove(&id).is_none() {
            return Err(ChatError::SessionNotFound(id));
        }
        tracing::info!(session_id = %id, "Session removed");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Entry>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::Internal(format!("session registry lock poisoned: {}", e)))
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, Entry>) {
        let timeout = self.idle_timeout;
        sessions.retain(|id, entry| {
            let live = entry.last_access.elapsed() <= timeout;
            if !live {
                tracing::info!(session_id = %id, "Session expired");
            }
            live
        });
    }
}
