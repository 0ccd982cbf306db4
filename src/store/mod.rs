//! src/store/mod.rs

mod in_memory;
mod postgres;

pub use in_memory::InMemorySubscriberStore;
pub use postgres::PostgresSubscriberStore;

use async_trait::async_trait;

use crate::domain::{Subscriber, SubscriberEmail};
use crate::routes::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("The subscriber store is unavailable")]
    Unavailable(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Durable list of unique subscriber addresses.
///
/// `get_or_create` must serialize concurrent callers for the same address so
/// that exactly one of them observes `was_created == true`. Callers for
/// different addresses must not wait on each other.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn get_or_create(
        &self,
        email: &SubscriberEmail,
    ) -> Result<(Subscriber, bool), StoreError>;

    /// Connectivity probe. Implementations run it at most once.
    async fn warm_up(&self) -> Result<(), StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;
}
