//! Registry of connected sessions
//!
//! Each session sits behind its own mutex. Handlers hold that lock for a
//! whole submission, so a session processes one input at a time while other
//! sessions proceed independently.
//!
//! Clients never have to say goodbye: a session nobody has looked up for
//! longer than the idle timeout is treated as disconnected and swept away.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use medchat_common::config::DEFAULT_SESSION_IDLE_SECS;
use medchat_common::{Error, Result};

use crate::domain::session::Session;

pub type SessionHandle = Arc<Mutex<Session>>;

/// Longest wait between two sweeps
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

type SessionMap = HashMap<Uuid, Entry>;

#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<SessionMap>>,
    idle_timeout: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_timeout(Duration::from_secs(DEFAULT_SESSION_IDLE_SECS))
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Start a fresh session for a newly connected client
    pub async fn connect(&self) -> (Uuid, SessionHandle) {
        let session = Session::new();
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));

        self.sessions.write().await.insert(
            id,
            Entry {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(session_id = %id, "Session connected");
        (id, handle)
    }

    /// Look up a session and mark it as seen
    pub async fn get(&self, id: Uuid) -> Result<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Session {} not found", id)))?;
        entry.last_seen = Instant::now();
        Ok(entry.handle.clone())
    }

    /// Drop a session. Returns whether it existed.
    pub async fn disconnect(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Session disconnected");
        }
        removed
    }

    /// Drop every session idle for longer than the timeout. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        sweep(&self.sessions, self.idle_timeout).await
    }

    /// Run `evict_idle` on a timer until the registry is dropped
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let sessions = Arc::downgrade(&self.sessions);
        let idle_timeout = self.idle_timeout;
        let period = idle_timeout
            .min(MAX_SWEEP_PERIOD)
            .max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(sessions) = sessions.upgrade() else {
                    break;
                };
                sweep(&sessions, idle_timeout).await;
            }
            tracing::debug!("Session sweeper stopped");
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// A session whose handle is still held elsewhere is mid-request and stays.
async fn sweep(sessions: &RwLock<SessionMap>, idle_timeout: Duration) -> usize {
    let Some(cutoff) = Instant::now().checked_sub(idle_timeout) else {
        return 0;
    };

    let mut sessions = sessions.write().await;
    let before = sessions.len();
    sessions.retain(|id, entry| {
        let keep = entry.last_seen >= cutoff || Arc::strong_count(&entry.handle) > 1;
        if !keep {
            tracing::info!(session_id = %id, "Idle session evicted");
        }
        keep
    });
    before - sessions.len()
}
