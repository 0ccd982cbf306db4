//! tests/api/postgres_store.rs
//!
//! Run with `cargo test -- --ignored` against the database described in
//! `configuration/`.

use newsletter_signup::configurations::{get_configuration, DatabaseSettings};
use newsletter_signup::domain::SubscriberEmail;
use newsletter_signup::store::{PostgresSubscriberStore, SubscriberStore};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::sync::Arc;
use uuid::Uuid;

async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");
    connection_pool
}

async fn spawn_store() -> PostgresSubscriberStore {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();
    PostgresSubscriberStore::new(configure_database(&configuration.database).await)
}

fn email(s: &str) -> SubscriberEmail {
    SubscriberEmail::parse(s.to_string()).unwrap()
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn get_or_create_inserts_once_and_then_returns_the_stored_row() {
    let store = spawn_store().await;

    let (created_row, created) = store.get_or_create(&email("a@b.c")).await.unwrap();
    let (existing_row, again) = store.get_or_create(&email(" A@B.C")).await.unwrap();

    assert!(created);
    assert!(!again);
    assert_eq!(created_row.id, existing_row.id);
    assert_eq!(store.count().await.unwrap(), 1);

    let saved = sqlx::query_scalar::<_, String>("SELECT email FROM subscriptions")
        .fetch_one(store.pool())
        .await
        .expect("Failed to fetch saved subscription.");
    assert_eq!(saved, "a@b.c");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a running Postgres instance"]
async fn concurrent_inserts_of_one_address_create_one_row() {
    let store = Arc::new(spawn_store().await);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .get_or_create(&email("race@example.com"))
                    .await
                    .map(|(_, created)| created)
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn warm_up_succeeds_against_a_live_database() {
    let store = spawn_store().await;

    store.warm_up().await.unwrap();
    // a second call is a no-op
    store.warm_up().await.unwrap();
}
