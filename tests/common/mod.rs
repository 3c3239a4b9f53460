//! Test helpers for web API tests.
//!
//! Provides a TestServer over an in-memory store with a manual clock, and a
//! key-value store that is always unavailable.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use tempmail::config::Config;
use tempmail::kv::KeyValueStore;
use tempmail::web::create_app;
use tempmail::web::handlers::AppState;
use tempmail::web::middleware::RateLimitState;
use tempmail::{build_service_with, ManualClock, MailboxService, MemoryStore, Result, TempMailError};

/// One hour.
pub const HOUR: Duration = Duration::from_secs(3600);

/// Create a test configuration with generous rate limits.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.api_rate_limit = 10_000;
    config.server.register_rate_limit = 10_000;
    config.store.timeout_ms = 500;
    config
}

/// Test application handles.
pub struct TestApp {
    pub server: TestServer,
    pub service: Arc<MailboxService>,
    pub clock: Arc<ManualClock>,
}

/// Create a test server over an in-memory store.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(create_test_config()).await
}

/// Create a test server from a custom configuration.
pub async fn create_test_app_with(config: Config) -> TestApp {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
    ));
    let kv = Arc::new(MemoryStore::with_timeout(config.store.timeout()));
    let service = build_service_with(&config, kv, clock.clone())
        .await
        .expect("Failed to build service");

    let server = server_for(&config, service.clone());
    TestApp {
        server,
        service,
        clock,
    }
}

/// Create a test server for a prebuilt service.
pub fn server_for(config: &Config, service: Arc<MailboxService>) -> TestServer {
    let app_state = Arc::new(AppState::new(service, config.mail.clone()));
    let rate_limit = Arc::new(RateLimitState::new(
        config.server.register_rate_limit,
        config.server.api_rate_limit,
    ));
    let router = create_app(app_state, rate_limit, &config.server.cors_origins);
    TestServer::new(router).expect("Failed to create test server")
}

/// Register a mailbox through the API and return its address.
pub async fn create_mailbox(server: &TestServer, address: &str) -> String {
    let response = server
        .post("/api/mailboxes")
        .json(&json!({ "address": address }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"]["address"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Deliver a message through the inbound endpoint and return the response body.
pub async fn deliver(server: &TestServer, message: Value) -> Value {
    let response = server.post("/api/inbound").json(&message).await;
    response.assert_status_ok();
    response.json::<Value>()
}

/// Deliver a plain text message to one recipient and return its id.
pub async fn deliver_text(server: &TestServer, to: &str, subject: &str, text: &str) -> String {
    let body = deliver(
        server,
        json!({
            "from": "sender@example.com",
            "to": [to],
            "subject": subject,
            "text": text
        }),
    )
    .await;
    body["data"]["delivered"][0]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

/// A key-value store whose every call fails as unavailable.
pub struct UnavailableStore;

fn down<T>() -> Result<T> {
    Err(TempMailError::StoreUnavailable("connection refused".to_string()))
}

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        down()
    }
    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        down()
    }
    async fn del(&self, _keys: &[&str]) -> Result<usize> {
        down()
    }
    async fn exists(&self, _key: &str) -> Result<bool> {
        down()
    }
    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool> {
        down()
    }
    async fn ttl(&self, _key: &str) -> Result<Option<Duration>> {
        down()
    }
    async fn keys(&self, _pattern: &str) -> Result<Vec<String>> {
        down()
    }
    async fn hset(&self, _key: &str, _fields: &[(&str, &str)]) -> Result<usize> {
        down()
    }
    async fn hget(&self, _key: &str, _field: &str) -> Result<Option<String>> {
        down()
    }
    async fn hgetall(&self, _key: &str) -> Result<HashMap<String, String>> {
        down()
    }
    async fn hdel(&self, _key: &str, _field: &str) -> Result<bool> {
        down()
    }
    async fn sadd(&self, _key: &str, _member: &str) -> Result<bool> {
        down()
    }
    async fn smembers(&self, _key: &str) -> Result<HashSet<String>> {
        down()
    }
    async fn sismember(&self, _key: &str, _member: &str) -> Result<bool> {
        down()
    }
    async fn srem(&self, _key: &str, _member: &str) -> Result<bool> {
        down()
    }
    async fn rpush(&self, _key: &str, _value: &str) -> Result<usize> {
        down()
    }
    async fn lrange(&self, _key: &str, _start: isize, _stop: isize) -> Result<Vec<String>> {
        down()
    }
    async fn lrem(&self, _key: &str, _value: &str) -> Result<usize> {
        down()
    }
}
