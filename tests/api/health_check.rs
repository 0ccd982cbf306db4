//! tests/api/health_check.rs

use newsletter_signup::configurations::get_configuration;
use newsletter_signup::startup::Application;
use newsletter_signup::store::InMemorySubscriberStore;
use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::helpers::{assert_cors_headers, spawn_app, TRACING};

#[tokio::test]
async fn health_check_works() {
    let test_app = spawn_app().await;

    let response = test_app.request(reqwest::Method::GET, "/health").await;

    assert_eq!(200, response.status().as_u16());
    assert_cors_headers(&response);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn health_check_does_not_touch_the_store() {
    let test_app = spawn_app().await;
    test_app.store.set_unavailable(true);

    let response = test_app.request(reqwest::Method::GET, "/health").await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(test_app.store.get_or_create_calls(), 0);
}

#[tokio::test]
async fn health_check_is_reachable_under_the_api_prefix_with_a_trailing_slash() {
    let test_app = spawn_app().await;

    let response = test_app.request(reqwest::Method::GET, "/api/health/").await;

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn the_default_configuration_builds_a_running_application() {
    Lazy::force(&TRACING);
    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0;
        c
    };

    let application =
        Application::build_with_store(configuration, Arc::new(InMemorySubscriberStore::new()))
            .await
            .expect("Failed to build application from the default configuration.");
    let host = get_configuration().unwrap().application.host;
    let address = format!("http://{}:{}", host, application.port());
    let _ = tokio::spawn(application.run_until_stopped());

    let response = reqwest::Client::new()
        .get(&format!("{}/health", address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}
