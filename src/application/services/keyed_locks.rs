//! Keyed mutual exclusion.
//!
//! Every operation that mutates a session takes its lock, so turns on one
//! session queue behind each other while different sessions run freely.
//! Indexing runs take the lock of their knowledge source the same way.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::{KnowledgeSourceId, SessionId};

/// Lock registry for session mutations.
pub type SessionLocks = KeyedLocks<SessionId>;

/// Lock registry for indexing runs.
pub type SourceLocks = KeyedLocks<KnowledgeSourceId>;

#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self { locks: DashMap::new() }
    }
}

impl<K: Eq + Hash> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is not held across the await.
        let lock = Arc::clone(self.locks.entry(key).or_default().value());
        lock.lock_owned().await
    }

    /// Drops the lock entry of a key nobody is holding or waiting on.
    pub fn release(&self, key: &K) {
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_session_is_serialized() {
        let locks = Arc::new(SessionLocks::new());
        let session_id = SessionId::new();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let in_flight = Arc::clone(&in_flight);
                let max_seen = Arc::clone(&max_seen);
                tokio::spawn(async move {
                    let _guard = locks.acquire(session_id).await;
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_sessions_do_not_block() {
        let locks = SessionLocks::new();
        let _first = locks.acquire(SessionId::new()).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(SessionId::new())).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn release_keeps_entries_that_are_in_use() {
        let locks = SessionLocks::new();
        let session_id = SessionId::new();

        let guard = locks.acquire(session_id).await;
        locks.release(&session_id);
        assert_eq!(locks.len(), 1);

        drop(guard);
        locks.release(&session_id);
        assert!(locks.is_empty());
    }
}
