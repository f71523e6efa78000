use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::interview::session::Session;

/// In-memory registry of interview sessions, one per client.
///
/// The map lock is only held for lookups and inserts. Each session has its
/// own mutex, held for the whole of an operation (including the model call),
/// so operations on one session never overlap.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Arc<Mutex<Session>> {
        let session = Session::new();
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        info!("Session {id} created");
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Session {id} removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions untouched for longer than `max_idle`. Sessions with an
    /// operation in flight are kept. Returns how many were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => now
                .signed_duration_since(session.updated_at())
                .to_std()
                .map(|idle| idle <= max_idle)
                .unwrap_or(true),
            Err(_) => true,
        });
        let evicted = before - sessions.len();

        if evicted > 0 {
            info!("Evicted {evicted} idle sessions ({} remaining)", sessions.len());
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::new();
        let handle = store.create().await;
        let id = handle.lock().await.id();

        assert_eq!(store.len().await, 1);
        assert!(store.get(id).await.is_some());
        assert!(store.get(Uuid::new_v4()).await.is_none());

        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.create().await;
        let b = store.create().await;

        let _held = a.lock().await;
        assert!(b.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_evict_idle_keeps_recent_and_busy() {
        let store = SessionStore::new();
        let idle = store.create().await;
        let busy = store.create().await;
        let idle_id = idle.lock().await.id();
        let busy_id = busy.lock().await.id();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let _guard = busy.lock().await;

        assert_eq!(store.evict_idle(Duration::from_millis(10)).await, 1);
        assert!(store.get(idle_id).await.is_none());
        assert!(store.get(busy_id).await.is_some());

        drop(_guard);
        assert_eq!(store.evict_idle(Duration::from_secs(3600)).await, 0);
    }
}
