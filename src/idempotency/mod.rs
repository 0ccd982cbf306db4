//! src/idempotency/mod.rs
//!
//! Short-lived markers for addresses that are known to be in the store.
//! The cache only saves a store round-trip for repeated submissions; a miss
//! is always safe.

mod in_memory;

pub use in_memory::InMemoryIdempotencyCache;

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::SubscriberEmail;

#[async_trait]
pub trait IdempotencyCache: Send + Sync {
    async fn get(&self, key: &str) -> bool;

    async fn set(&self, key: &str, ttl: Duration);
}

pub fn cache_key(email: &SubscriberEmail) -> String {
    format!("email_sub_{}", email.as_ref())
}

/// TTL applied to every marker written by the subscribe handler.
#[derive(Debug, Clone, Copy)]
pub struct IdempotencyTtl(pub Duration);
