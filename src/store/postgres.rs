//! src/store/postgres.rs

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::{StoreError, SubscriberStore};
use crate::domain::{Subscriber, SubscriberEmail};

pub struct PostgresSubscriberStore {
    pool: PgPool,
    warmed_up: OnceCell<()>,
}

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    email: String,
    subscribed_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = StoreError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(row.email)
            .map_err(|e| anyhow::anyhow!(e))
            .context("A stored subscriber email failed validation")?;
        Ok(Subscriber {
            id: row.id,
            email,
            subscribed_at: row.subscribed_at,
        })
    }
}

impl PostgresSubscriberStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            warmed_up: OnceCell::new(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Connection-level failures mean the store is unreachable; everything else
/// is unexpected.
fn classify(e: sqlx::Error, context: &'static str) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(anyhow::Error::new(e).context(context)),
        other => StoreError::UnexpectedError(anyhow::Error::new(other).context(context)),
    }
}

#[async_trait]
impl SubscriberStore for PostgresSubscriberStore {
    #[tracing::instrument(
        name = "Get or create subscriber",
        skip(self, email),
        fields(subscriber_email = %email)
    )]
    async fn get_or_create(
        &self,
        email: &SubscriberEmail,
    ) -> Result<(Subscriber, bool), StoreError> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| classify(e, "Failed to acquire a Postgres connection from the pool"))?;

        let outcome: (Subscriber, bool) = match insert_subscriber(&mut transaction, email).await? {
            Some(row) => (row.try_into()?, true),
            None => (
                get_subscriber_for_update(&mut transaction, email)
                    .await?
                    .try_into()?,
                false,
            ),
        };

        transaction
            .commit()
            .await
            .map_err(|e| classify(e, "Failed to commit SQL transaction to store a new subscriber"))?;
        Ok(outcome)
    }

    #[tracing::instrument(name = "Warming up database connection", skip(self))]
    async fn warm_up(&self) -> Result<(), StoreError> {
        self.warmed_up
            .get_or_try_init(|| async {
                sqlx::query("SELECT 1")
                    .execute(&self.pool)
                    .await
                    .map_err(|e| classify(e, "Failed to run the warm-up query"))?;
                tracing::info!("Database connection warmed up successfully");
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Counting subscribers", skip(self))]
    async fn count(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, "Failed to count subscribers"))
    }
}

/// Returns `None` when a row for this address already exists. The unique
/// index on `email` makes a concurrent insert of the same address wait for
/// the first transaction to finish.
#[tracing::instrument(name = "Saving new subscriber details into database", skip(transaction))]
async fn insert_subscriber(
    transaction: &mut Transaction<'_, Postgres>,
    email: &SubscriberEmail,
) -> Result<Option<SubscriberRow>, StoreError> {
    sqlx::query_as::<_, SubscriberRow>(
        r#"
        INSERT INTO subscriptions (id, email, subscribed_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        RETURNING id, email, subscribed_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.as_ref())
    .bind(Utc::now())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        classify(e, "Failed to insert new subscriber in the database")
    })
}

#[tracing::instrument(name = "Fetching existing subscriber", skip(transaction))]
async fn get_subscriber_for_update(
    transaction: &mut Transaction<'_, Postgres>,
    email: &SubscriberEmail,
) -> Result<SubscriberRow, StoreError> {
    sqlx::query_as::<_, SubscriberRow>(
        r#"SELECT id, email, subscribed_at FROM subscriptions WHERE email = $1 FOR UPDATE"#,
    )
    .bind(email.as_ref())
    .fetch_one(&mut **transaction)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        classify(e, "Failed to fetch an existing subscriber")
    })
}
