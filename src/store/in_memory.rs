//! src/store/in_memory.rs

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{StoreError, SubscriberStore};
use crate::domain::{Subscriber, SubscriberEmail};

/// Process-local subscriber list. The map's entry API locks the shard that
/// holds the key, so creators of the same address are serialized while
/// other addresses proceed.
#[derive(Default)]
pub struct InMemorySubscriberStore {
    subscribers: DashMap<SubscriberEmail, Subscriber>,
    get_or_create_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create_calls(&self) -> usize {
        self.get_or_create_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn get(&self, email: &SubscriberEmail) -> Option<Subscriber> {
        self.subscribers.get(email).map(|entry| entry.value().clone())
    }

    /// Simulates an out-of-band deletion.
    pub fn remove(&self, email: &SubscriberEmail) -> Option<Subscriber> {
        self.subscribers.remove(email).map(|(_, subscriber)| subscriber)
    }

    /// While set, every operation fails with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(anyhow::anyhow!(
                "The in-memory store has been switched off"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    #[tracing::instrument(
        name = "Get or create subscriber",
        skip(self, email),
        fields(subscriber_email = %email)
    )]
    async fn get_or_create(
        &self,
        email: &SubscriberEmail,
    ) -> Result<(Subscriber, bool), StoreError> {
        self.get_or_create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let outcome = match self.subscribers.entry(email.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let subscriber = Subscriber::new(email.clone());
                entry.insert(subscriber.clone());
                (subscriber, true)
            }
        };
        Ok(outcome)
    }

    async fn warm_up(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    async fn count(&self) -> Result<i64, StoreError> {
        self.check_available()?;
        Ok(self.subscribers.len() as i64)
    }
}
