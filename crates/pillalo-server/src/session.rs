//! Per-session carts, keyed by [`SessionId`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pillalo_core::CartState;
use tokio::sync::Mutex;

use crate::middleware::SessionId;

struct SessionEntry {
    cart: CartState,
    last_seen: Instant,
}

/// Carts of every live session. Sessions idle for longer than `idle_ttl`
/// are dropped the next time the store is touched.
#[derive(Clone)]
pub struct SessionStore {
    idle_ttl: Duration,
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            idle_ttl,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Runs `f` against the session's cart, creating an empty one if needed.
    pub async fn with_cart<T>(
        &self,
        session: &SessionId,
        f: impl FnOnce(&mut CartState) -> T,
    ) -> T {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "dropped idle sessions");
        }

        let entry = sessions
            .entry(session.0.clone())
            .or_insert_with(|| SessionEntry {
                cart: CartState::new(),
                last_seen: now,
            });
        entry.last_seen = now;
        f(&mut entry.cart)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
