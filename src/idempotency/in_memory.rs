//! src/idempotency/in_memory.rs

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::IdempotencyCache;

/// Process-local cache. Entries expire lazily on read and are also removed
/// by a periodic sweep, so the map does not grow with stale keys. Markers are
/// not shared across processes.
#[derive(Default)]
pub struct InMemoryIdempotencyCache {
    entries: DashMap<String, Instant>,
}

impl InMemoryIdempotencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = self.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "Swept expired idempotency markers");
                }
            }
        })
    }
}

#[async_trait]
impl IdempotencyCache for InMemoryIdempotencyCache {
    async fn get(&self, key: &str) -> bool {
        let now = Instant::now();
        match self.entries.get(key).map(|expires_at| *expires_at) {
            Some(expires_at) if expires_at > now => true,
            Some(_) => {
                self.entries.remove_if(key, |_, expires_at| *expires_at <= now);
                false
            }
            None => false,
        }
    }

    async fn set(&self, key: &str, ttl: Duration) {
        self.entries.insert(key.to_owned(), Instant::now() + ttl);
    }
}
