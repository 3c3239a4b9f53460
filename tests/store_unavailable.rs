//! Behaviour when the backing store cannot be reached.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{create_test_config, server_for, UnavailableStore};
use tempmail::{
    MailStore, MailboxLocks, MailboxPolicy, MailboxService, SystemClock, TempMailError,
};

fn unavailable_service() -> Arc<MailboxService> {
    let config = create_test_config();
    let store = MailStore::new(
        Arc::new(UnavailableStore),
        MailboxLocks::new(16, Duration::from_millis(100)),
        Arc::new(SystemClock),
    );
    Arc::new(MailboxService::new(store, MailboxPolicy::from(&config.mail)))
}

fn assert_unavailable(response: axum_test::TestResponse) {
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_build_service_fails_without_store() {
    let config = create_test_config();
    let result =
        tempmail::build_service_with(&config, Arc::new(UnavailableStore), Arc::new(SystemClock))
            .await;
    assert!(matches!(result, Err(TempMailError::StoreUnavailable(_))));
}

#[tokio::test]
async fn test_api_reports_store_outage() {
    let config = create_test_config();
    let server = server_for(&config, unavailable_service());

    assert_unavailable(server.get("/api/domains").await);
    assert_unavailable(
        server
            .post("/api/mailboxes")
            .json(&json!({ "address": "a@hide-mail.org" }))
            .await,
    );
    assert_unavailable(server.get("/api/mailboxes/a@hide-mail.org").await);
    assert_unavailable(server.get("/api/mailboxes/a@hide-mail.org/emails").await);
    assert_unavailable(
        server
            .post("/api/inbound")
            .json(&json!({
                "from": "sender@example.com",
                "to": ["a@hide-mail.org"],
                "subject": "Lost"
            }))
            .await,
    );
}

#[tokio::test]
async fn test_outage_is_not_reported_as_inactive() {
    let service = unavailable_service();

    let result = service.is_mailbox_active("a@hide-mail.org").await;
    assert!(matches!(result, Err(TempMailError::StoreUnavailable(_))));

    let result = service.sweep_expired().await;
    assert!(matches!(result, Err(TempMailError::StoreUnavailable(_))));
}

#[tokio::test]
async fn test_health_does_not_touch_store() {
    let config = create_test_config();
    let server = server_for(&config, unavailable_service());

    server.get("/health").await.assert_status_ok();
}
