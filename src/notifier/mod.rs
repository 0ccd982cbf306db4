//! src/notifier/mod.rs

mod confirmation;

pub use confirmation::{ConfirmationNotifier, ConfirmationTemplate, RenderedEmail};

use async_trait::async_trait;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;

use crate::domain::SubscriberEmail;

/// Best-effort delivery of a message to a new subscriber. Failures are
/// reported through the return value and logs, never as errors.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &SubscriberEmail) -> bool;
}

/// Fires `notifier` on a detached task. The task is never joined and its
/// outcome, including a panic, ends at its own boundary in the logs. It runs
/// under a fresh root span so it does not inherit the request's lifetime.
pub fn dispatch_detached(notifier: Arc<dyn Notifier>, recipient: SubscriberEmail) {
    let span = tracing::info_span!(
        parent: None,
        "Detached confirmation email",
        subscriber_email = %recipient,
    );
    span.follows_from(&tracing::Span::current());

    tokio::spawn(
        async move {
            let outcome = AssertUnwindSafe(notifier.notify(&recipient))
                .catch_unwind()
                .await;
            match outcome {
                Ok(true) => tracing::info!("Confirmation email sent"),
                Ok(false) => tracing::warn!("Confirmation email was not delivered"),
                Err(panic) => tracing::error!(
                    panic = %panic_message(panic.as_ref()),
                    "Confirmation email task panicked"
                ),
            }
        }
        .instrument(span),
    );
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
