//! tests/api/helpers.rs

use newsletter_signup::configurations::get_configuration;
use newsletter_signup::startup::Application;
use newsletter_signup::store::InMemorySubscriberStore;
use newsletter_signup::telemetry::{get_subscriber, init_subscriber};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{MockServer, Request};

// `init_subscriber` may only run once per test binary
pub static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemorySubscriberStore>,
    pub email_server: MockServer,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_subscribe(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/subscribe", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_subscribe_raw(&self, body: &'static str) -> reqwest::Response {
        self.post_subscribe_as(body, "application/json").await
    }

    pub async fn post_subscribe_as(
        &self,
        body: &'static str,
        content_type: &str,
    ) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/subscribe", &self.address))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn request(&self, method: reqwest::Method, path: &str) -> reqwest::Response {
        self.api_client
            .request(method, &format!("{}{}", &self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Confirmation emails go out on a detached task, so poll the mock
    /// server until `expected` requests arrived or a deadline passes.
    pub async fn wait_for_emails(&self, expected: usize) -> Vec<Request> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let received = self.email_server.received_requests().await.unwrap();
            if received.len() >= expected || tokio::time::Instant::now() >= deadline {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Gives any stray detached task time to reach the email server.
    pub async fn settled_emails(&self) -> Vec<Request> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.email_server.received_requests().await.unwrap()
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.host = "127.0.0.1".into();
        // a random OS port
        c.application.port = 0;
        c.email_client.base_url = email_server.uri();
        c.email_client.timeout_milliseconds = 10_000;
        c
    };

    let store = Arc::new(InMemorySubscriberStore::new());
    let application = Application::build_with_store(configuration, store.clone())
        .await
        .expect("Failed to build application.");
    let port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        email_server,
        api_client,
    }
}

pub fn assert_cors_headers(response: &reqwest::Response) {
    assert_eq!(
        response
            .headers()
            .get("Access-Control-Allow-Origin")
            .expect("Missing Access-Control-Allow-Origin header"),
        "*"
    );
}
