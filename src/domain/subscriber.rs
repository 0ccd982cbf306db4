//! src/domain/subscriber.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::SubscriberEmail;

/// A row of the subscriber list. Created once per normalized address and
/// never updated afterwards.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: SubscriberEmail,
    pub subscribed_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn new(email: SubscriberEmail) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            subscribed_at: Utc::now(),
        }
    }
}
