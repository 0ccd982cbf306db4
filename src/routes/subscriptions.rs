//! src/routes/subscriptions.rs

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use anyhow::Context;
use std::time::Duration;

use crate::domain::{normalize, SubscriberEmail};
use crate::idempotency::{cache_key, IdempotencyCache, IdempotencyTtl};
use crate::notifier::{dispatch_detached, Notifier};
use crate::store::{StoreError, SubscriberStore};

#[derive(serde::Deserialize)]
pub struct SubscribeBody {
    email: Option<String>,
}

#[derive(serde::Serialize)]
struct SubscribeResponse {
    message: &'static str,
    created: bool,
}

impl TryFrom<SubscribeBody> for SubscriberEmail {
    type Error = String;

    fn try_from(body: SubscribeBody) -> Result<Self, Self::Error> {
        let raw = body.email.unwrap_or_default();
        if normalize(&raw).is_empty() {
            return Err("Email not provided".into());
        }
        SubscriberEmail::parse(raw).map_err(|e| {
            tracing::warn!("Invalid email format: {}", e);
            "Invalid email format".to_string()
        })
    }
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(body, store, cache, notifier, ttl),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    body: web::Json<SubscribeBody>,
    store: web::Data<dyn SubscriberStore>,
    cache: web::Data<dyn IdempotencyCache>,
    notifier: web::Data<dyn Notifier>,
    ttl: web::Data<IdempotencyTtl>,
) -> Result<HttpResponse, SubscribeError> {
    let email: SubscriberEmail = body.into_inner().try_into()?;
    tracing::Span::current().record("subscriber_email", &tracing::field::display(&email));

    let created = register_subscriber(&email, store.get_ref(), cache.get_ref(), ttl.0)
        .await
        .context("Failed to register the subscriber")?;
    tracing::info!(
        created,
        "{}",
        if created {
            "New subscription created"
        } else {
            "Email already subscribed"
        }
    );

    // the store transaction has committed by now
    if created {
        dispatch_detached(notifier.into_inner(), email);
    }

    Ok(HttpResponse::Ok().json(SubscribeResponse {
        message: "Success",
        created,
    }))
}

/// Returns whether a new subscriber row was created. A cache hit answers
/// `false` without consulting the store; a row deleted out-of-band is not
/// noticed until the marker expires.
#[tracing::instrument(name = "Registering subscriber", skip(store, cache, ttl))]
pub async fn register_subscriber(
    email: &SubscriberEmail,
    store: &dyn SubscriberStore,
    cache: &dyn IdempotencyCache,
    ttl: Duration,
) -> Result<bool, StoreError> {
    let key = cache_key(email);
    if cache.get(&key).await {
        tracing::info!("Email found in the idempotency cache");
        return Ok(false);
    }

    let (_subscriber, created) = store.get_or_create(email).await?;
    cache.set(&key, ttl).await;
    Ok(created)
}

pub async fn subscribe_preflight() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({}))
}

pub async fn method_not_allowed(request: HttpRequest) -> HttpResponse {
    tracing::warn!("Invalid method: {}", request.method());
    HttpResponse::MethodNotAllowed().json(serde_json::json!({
        "error": "Invalid request method",
    }))
}

pub fn json_error_handler(err: JsonPayloadError, _request: &HttpRequest) -> actix_web::Error {
    tracing::warn!("JSON decode error: {}", err);
    SubscribeError::ValidationError("Invalid JSON".into()).into()
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            SubscribeError::ValidationError(message) => message.as_str(),
            SubscribeError::UnexpectedError(e) => {
                tracing::error!(error.cause_chain = ?e, "Unexpected error while subscribing");
                "Internal server error"
            }
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

impl From<String> for SubscribeError {
    fn from(value: String) -> Self {
        Self::ValidationError(value)
    }
}
