//! src/lib.rs

pub mod configurations;
pub mod domain;
pub mod email_client;
pub mod idempotency;
pub mod notifier;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
