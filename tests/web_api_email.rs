//! Integration tests for inbound delivery and the email endpoints.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{create_mailbox, create_test_app, deliver, deliver_text};

const IMG_HTML: &str =
    r#"<div>Test HTML content with <img src="test.jpg" alt="test"> image</div>"#;

#[tokio::test]
async fn test_inbound_delivery() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "inbox@hide-mail.org").await;

    let body = deliver(
        &app.server,
        json!({
            "from": "sender@example.com",
            "to": ["Inbox@Hide-Mail.org", "stranger@hide-mail.org"],
            "subject": "Welcome",
            "date": "Mon, 15 Jan 2024 09:30:00 +0000",
            "text": "Hello there",
            "attachments": [{ "filename": "a.pdf", "size": 1024 }]
        }),
    )
    .await;

    let delivered = body["data"]["delivered"].as_array().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0]["recipient"], "Inbox@Hide-Mail.org");

    let rejected = body["data"]["rejected"].as_array().unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0]["recipient"], "stranger@hide-mail.org");
    assert_eq!(rejected[0]["reason"], "unknown mailbox");

    let id = delivered[0]["id"].as_str().unwrap();
    let response = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails/{id}"))
        .await;
    response.assert_status_ok();

    let email: Value = response.json();
    assert_eq!(email["data"]["to"], "inbox@hide-mail.org");
    assert_eq!(email["data"]["from"], "sender@example.com");
    assert_eq!(email["data"]["text"], "Hello there");
    assert_eq!(email["data"]["content_type"], "text");
    assert_eq!(email["data"]["date"], "2024-01-15T09:30:00+00:00");
    assert_eq!(email["data"]["attachments"][0]["filename"], "a.pdf");
    assert_eq!(email["data"]["attachments"][0]["size"], 1024);
}

#[tokio::test]
async fn test_inbound_requires_recipient() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/inbound")
        .json(&json!({
            "from": "sender@example.com",
            "to": [],
            "subject": "Nobody"
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_emails_newest_first() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "list@hide-mail.org").await;

    deliver_text(&app.server, &address, "First", "one").await;
    deliver_text(&app.server, &address, "Second", "two").await;
    deliver_text(&app.server, &address, "Third", "three").await;

    let response = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails"))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let subjects: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["subject"].as_str().unwrap())
        .collect();
    assert_eq!(subjects, vec!["Third", "Second", "First"]);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["page"], 1);
}

#[tokio::test]
async fn test_list_emails_pagination() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "pages@hide-mail.org").await;

    for i in 0..5 {
        deliver_text(&app.server, &address, &format!("Mail {i}"), "body").await;
    }

    let response = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails"))
        .add_query_param("page", 2)
        .add_query_param("per_page", 2)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["subject"], "Mail 2");
    assert_eq!(data[1]["subject"], "Mail 1");
    assert_eq!(body["meta"]["total"], 5);
    assert_eq!(body["meta"]["per_page"], 2);
}

#[tokio::test]
async fn test_list_emails_preview() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "preview@hide-mail.org").await;

    let long_text = "word ".repeat(100);
    deliver_text(&app.server, &address, "Long", &long_text).await;
    deliver(
        &app.server,
        json!({
            "from": "sender@example.com",
            "to": [address],
            "subject": "Html",
            "html": "<p>Hello <b>world</b></p><script>alert(1)</script>"
        }),
    )
    .await;

    let body: Value = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails"))
        .await
        .json();
    let data = body["data"].as_array().unwrap();

    assert_eq!(data[0]["content_type"], "html");
    assert_eq!(data[0]["preview"], "Hello world");

    let preview = data[1]["preview"].as_str().unwrap();
    assert!(preview.ends_with("..."));
    assert_eq!(preview.chars().count(), 200 - 1 + 3);
}

#[tokio::test]
async fn test_get_missing_email() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "missing@hide-mail.org").await;

    let response = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails/no-such-id"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_rendered_email_blocks_images() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "render@hide-mail.org").await;

    let body = deliver(
        &app.server,
        json!({
            "from": "sender@example.com",
            "to": [address],
            "subject": "Pictures",
            "html": IMG_HTML
        }),
    )
    .await;
    let id = body["data"]["delivered"][0]["id"].as_str().unwrap();

    let response = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails/{id}/rendered"))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let content = &body["data"]["content"];
    assert_eq!(body["data"]["show_images"], false);
    assert_eq!(content["kind"], "html");
    assert_eq!(content["images_blocked"], true);

    let markup = content["markup"].as_str().unwrap();
    assert!(!markup.contains("<img"));
    assert!(markup.contains("[image blocked]"));
    assert!(markup.contains("Test HTML content with"));
}

#[tokio::test]
async fn test_rendered_email_shows_images() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "images@hide-mail.org").await;

    let body = deliver(
        &app.server,
        json!({
            "from": "sender@example.com",
            "to": [address],
            "subject": "Pictures",
            "html": IMG_HTML
        }),
    )
    .await;
    let id = body["data"]["delivered"][0]["id"].as_str().unwrap();

    let response = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails/{id}/rendered"))
        .add_query_param("show_images", true)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let content = &body["data"]["content"];
    assert_eq!(body["data"]["show_images"], true);
    assert_eq!(content["images_blocked"], false);
    assert!(content["markup"]
        .as_str()
        .unwrap()
        .contains(r#"<img src="test.jpg""#));
}

#[tokio::test]
async fn test_rendered_multipart_email() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "multi@hide-mail.org").await;

    let raw = "Content-Type: multipart/alternative; boundary=\"b1\"\n\n--b1\nContent-Type: text/plain; charset=utf-8\n\nFirst line\nSecond line\n--b1--\n";
    let body = deliver(
        &app.server,
        json!({
            "from": "sender@example.com",
            "to": [address],
            "subject": "Multipart",
            "body": raw
        }),
    )
    .await;
    let id = body["data"]["delivered"][0]["id"].as_str().unwrap();

    let body: Value = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails/{id}/rendered"))
        .await
        .json();
    let content = &body["data"]["content"];
    assert_eq!(content["kind"], "paragraphs");

    let paragraphs = content["paragraphs"].as_array().unwrap();
    assert!(paragraphs.iter().any(|p| p == "First line"));
    assert!(paragraphs.iter().any(|p| p == "Second line"));
}

#[tokio::test]
async fn test_rendered_empty_email() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "empty@hide-mail.org").await;

    let body = deliver(
        &app.server,
        json!({
            "from": "sender@example.com",
            "to": [address],
            "subject": "Nothing"
        }),
    )
    .await;
    let id = body["data"]["delivered"][0]["id"].as_str().unwrap();

    let body: Value = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails/{id}/rendered"))
        .await
        .json();
    assert_eq!(body["data"]["content"]["kind"], "empty");
    assert_eq!(body["data"]["html"], "<p>No content available</p>");
}

#[tokio::test]
async fn test_delete_email() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "delete@hide-mail.org").await;

    let keep = deliver_text(&app.server, &address, "Keep", "stays").await;
    let drop = deliver_text(&app.server, &address, "Drop", "goes").await;

    let body: Value = app
        .server
        .delete(&format!("/api/mailboxes/{address}/emails/{drop}"))
        .await
        .json();
    assert_eq!(body["data"]["deleted"], true);

    let body: Value = app
        .server
        .delete(&format!("/api/mailboxes/{address}/emails/{drop}"))
        .await
        .json();
    assert_eq!(body["data"]["deleted"], false);

    app.server
        .get(&format!("/api/mailboxes/{address}/emails/{drop}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let body: Value = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails"))
        .await
        .json();
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["id"], keep.as_str());
}

#[tokio::test]
async fn test_delete_all_emails() {
    let app = create_test_app().await;
    let address = create_mailbox(&app.server, "purge@hide-mail.org").await;

    deliver_text(&app.server, &address, "One", "1").await;
    deliver_text(&app.server, &address, "Two", "2").await;

    let body: Value = app
        .server
        .delete(&format!("/api/mailboxes/{address}/emails"))
        .await
        .json();
    assert_eq!(body["data"]["deleted"], true);

    let body: Value = app
        .server
        .get(&format!("/api/mailboxes/{address}/emails"))
        .await
        .json();
    assert_eq!(body["meta"]["total"], 0);

    // The mailbox itself stays live
    app.server
        .get(&format!("/api/mailboxes/{address}"))
        .await
        .assert_status_ok();

    let body: Value = app
        .server
        .delete(&format!("/api/mailboxes/{address}/emails"))
        .await
        .json();
    assert_eq!(body["data"]["deleted"], false);
}

#[tokio::test]
async fn test_emails_of_unknown_mailbox() {
    let app = create_test_app().await;

    app.server
        .get("/api/mailboxes/ghost@hide-mail.org/emails")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .delete("/api/mailboxes/ghost@hide-mail.org/emails")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
