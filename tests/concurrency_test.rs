//! Concurrent access to a single mailbox.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;

use common::create_test_app;
use tempmail::{MessageContent, NewEmail};

fn message(to: &str, n: usize) -> NewEmail {
    NewEmail::new(
        "sender@example.com".to_string(),
        to.to_string(),
        format!("Message {n}"),
        MessageContent::Text(format!("body {n}")),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deliveries_are_all_stored() {
    let app = create_test_app().await;
    let address = "busy@hide-mail.org";
    app.service.register_mailbox(address).await.unwrap();

    let tasks = (0..50).map(|n| {
        let service = Arc::clone(&app.service);
        tokio::spawn(async move { service.deliver(message(address, n)).await })
    });

    let ids: Vec<String> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), 50);

    let emails = app.service.list_emails(address).await.unwrap();
    assert_eq!(emails.len(), 50);

    let subjects: HashSet<String> = emails.into_iter().map(|e| e.subject).collect();
    for n in 0..50 {
        assert!(subjects.contains(&format!("Message {n}")));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_all_races_with_delivery() {
    let app = create_test_app().await;
    let address = "race@hide-mail.org";
    app.service.register_mailbox(address).await.unwrap();

    let deliveries = (0..20).map(|n| {
        let service = Arc::clone(&app.service);
        tokio::spawn(async move { service.deliver(message(address, n)).await })
    });
    let purge = {
        let service = Arc::clone(&app.service);
        tokio::spawn(async move { service.delete_all_emails(address).await })
    };

    let delivered: Vec<String> = join_all(deliveries)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();
    purge.await.unwrap().unwrap();

    // Every listed email resolves, and everything still listed was delivered
    let emails = app.service.list_emails(address).await.unwrap();
    for email in &emails {
        assert!(delivered.contains(&email.id));
        app.service.get_email(address, &email.id).await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deactivate_races_with_delivery() {
    let app = create_test_app().await;
    let address = "closing@hide-mail.org";
    app.service.register_mailbox(address).await.unwrap();

    let deliveries: Vec<_> = (0..20)
        .map(|n| {
            let service = Arc::clone(&app.service);
            tokio::spawn(async move { service.deliver(message(address, n)).await })
        })
        .collect();
    let closed = app.service.deactivate_mailbox(address).await.unwrap();
    assert!(closed);

    for result in join_all(deliveries).await {
        // Deliveries either landed before deactivation or were refused
        if let Err(e) = result.unwrap() {
            assert!(matches!(e, tempmail::TempMailError::UnknownMailbox(_)));
        }
    }

    assert!(!app.service.is_mailbox_active(address).await.unwrap());
    assert!(app.service.list_emails(address).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_of_one_address() {
    let app = create_test_app().await;
    let address = "shared@hide-mail.org";

    let tasks = (0..10).map(|_| {
        let service = Arc::clone(&app.service);
        tokio::spawn(async move { service.register_mailbox(address).await })
    });

    let mailboxes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap())
        .collect();

    let created: HashSet<_> = mailboxes.iter().map(|m| m.created_at).collect();
    assert_eq!(created.len(), 1);
    assert!(app.service.is_mailbox_active(address).await.unwrap());
}
