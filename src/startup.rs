//! src/startup.rs

use actix_web::dev::Server;
use actix_web::http::{header, Method};
use actix_web::{middleware, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::TcpListener;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing_actix_web::TracingLogger;

use crate::configurations::{DatabaseSettings, Settings};
use crate::idempotency::{IdempotencyCache, IdempotencyTtl, InMemoryIdempotencyCache};
use crate::notifier::{ConfirmationNotifier, ConfirmationTemplate, Notifier};
use crate::routes::{
    health_check, json_error_handler, method_not_allowed, subscribe, subscribe_preflight,
};
use crate::store::{PostgresSubscriberStore, SubscriberStore};

pub struct Application {
    port: u16,
    server: Server,
    sweeper: JoinHandle<()>,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database);
        let store = Arc::new(PostgresSubscriberStore::new(connection_pool));
        Self::build_with_store(configuration, store).await
    }

    /// Wires the HTTP server around an arbitrary subscriber store.
    pub async fn build_with_store(
        configuration: Settings,
        store: Arc<dyn SubscriberStore>,
    ) -> Result<Self, anyhow::Error> {
        // once, at startup, rather than on the first request
        if let Err(e) = store.warm_up().await {
            tracing::warn!(error.cause_chain = ?e, "Database warmup failed");
        }

        let cache = Arc::new(InMemoryIdempotencyCache::new());
        let sweeper = cache
            .clone()
            .spawn_sweeper(configuration.idempotency.sweep_interval());

        let email_client = configuration.email_client.clone().client()?;
        let notifier = Arc::new(ConfirmationNotifier::new(
            email_client,
            ConfirmationTemplate::new(configuration.branding.clone()),
        ));

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            store,
            cache,
            notifier,
            IdempotencyTtl(configuration.idempotency.ttl()),
        )?;

        Ok(Self {
            port,
            server,
            sweeper,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        let outcome = self.server.await;
        self.sweeper.abort();
        outcome
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(configuration.with_db())
}

pub fn run(
    listener: TcpListener,
    store: Arc<dyn SubscriberStore>,
    cache: Arc<dyn IdempotencyCache>,
    notifier: Arc<dyn Notifier>,
    ttl: IdempotencyTtl,
) -> Result<Server, std::io::Error> {
    let store = web::Data::from(store);
    let cache = web::Data::from(cache);
    let notifier = web::Data::from(notifier);
    let ttl = web::Data::new(ttl);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::NormalizePath::trim())
            .wrap(cors_headers())
            .wrap(TracingLogger::default())
            .app_data(
                web::JsonConfig::default()
                    .content_type_required(false)
                    .error_handler(json_error_handler),
            )
            .configure(routes)
            .service(web::scope("/api").configure(routes))
            .app_data(store.clone())
            .app_data(cache.clone())
            .app_data(notifier.clone())
            .app_data(ttl.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::resource("/subscribe")
            .route(web::post().to(subscribe))
            .route(web::method(Method::OPTIONS).to(subscribe_preflight))
            .default_service(web::to(method_not_allowed)),
    );
}

/// Fully open CORS for a public signup widget, on every response.
fn cors_headers() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"))
        .add((
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            "Content-Type, Authorization, X-Requested-With",
        ))
        .add((header::ACCESS_CONTROL_MAX_AGE, "86400"))
}
