//! Backend-agnostic conformance checks for [`Database`] implementations.

use burner_core::{Inbox, Message, generate_id};

use crate::database::Database;
use crate::error::StoreError;

fn test_inbox() -> Inbox {
    let mut inbox = Inbox::new();
    inbox.id = generate_id();
    inbox.address = format!("{}@conformance.test", generate_id());
    inbox.ttl = 4_102_444_800;
    inbox
}

fn test_message(inbox: &Inbox, subject: &str, received_at: i64) -> Message {
    Message {
        id: generate_id(),
        inbox_id: inbox.id.clone(),
        email_provider_id: format!("<{subject}@relay.test>"),
        received_at,
        ttl: inbox.ttl,
        sender: "bob@example.com".into(),
        from: "Bobby Tables <bob@example.com>".into(),
        subject: subject.into(),
        body_plain: format!("body of {subject}"),
        body_html: None,
    }
}

/// Run the full database conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
/// Every check uses freshly generated ids, so the suite can run against a
/// shared table.
///
/// # Errors
///
/// Returns an error if any backend call fails unexpectedly.
pub async fn run_database_conformance_tests(db: &dyn Database) -> Result<(), StoreError> {
    test_inbox_round_trip(db).await?;
    test_missing_inbox(db).await?;
    test_set_inbox_created(db).await?;
    test_set_inbox_failed(db).await?;
    test_address_lookup(db).await?;
    test_missing_address(db).await?;
    test_reused_address(db).await?;
    test_empty_messages(db).await?;
    test_message_round_trip(db).await?;
    test_concurrent_messages(db).await?;
    test_missing_message(db).await?;
    test_message_in_missing_inbox(db).await?;
    Ok(())
}

async fn test_inbox_round_trip(db: &dyn Database) -> Result<(), StoreError> {
    let inbox = test_inbox();
    db.save_new_inbox(&inbox).await?;
    let fetched = db.get_inbox_by_id(&inbox.id).await?;
    assert_eq!(fetched, inbox, "fetched inbox should equal the saved one");
    Ok(())
}

async fn test_missing_inbox(db: &dyn Database) -> Result<(), StoreError> {
    let result = db.get_inbox_by_id(&generate_id()).await;
    assert!(
        matches!(result, Err(StoreError::InboxNotFound(_))),
        "missing inbox should yield InboxNotFound, got {result:?}"
    );
    Ok(())
}

async fn test_set_inbox_created(db: &dyn Database) -> Result<(), StoreError> {
    let mut inbox = test_inbox();
    db.save_new_inbox(&inbox).await?;
    let msg = test_message(&inbox, "before-created", 10);
    db.save_new_message(&msg).await?;

    inbox.email_provider_route_id = "R1".into();
    db.set_inbox_created(&inbox).await?;
    // Idempotent.
    db.set_inbox_created(&inbox).await?;

    let fetched = db.get_inbox_by_id(&inbox.id).await?;
    assert!(!fetched.failed_to_create);
    assert_eq!(fetched.email_provider_route_id, "R1");
    assert_eq!(fetched.address, inbox.address, "address must be untouched");
    assert_eq!(fetched.ttl, inbox.ttl, "ttl must be untouched");

    let messages = db.get_messages_by_inbox_id(&inbox.id).await?;
    assert_eq!(messages, vec![msg], "messages must survive the status update");
    Ok(())
}

async fn test_set_inbox_failed(db: &dyn Database) -> Result<(), StoreError> {
    let inbox = test_inbox();
    db.save_new_inbox(&inbox).await?;
    db.set_inbox_failed(&inbox).await?;

    let fetched = db.get_inbox_by_id(&inbox.id).await?;
    assert!(fetched.failed_to_create);
    assert_eq!(fetched.email_provider_route_id, "-");
    assert_eq!(fetched.ttl, inbox.ttl);
    Ok(())
}

async fn test_address_lookup(db: &dyn Database) -> Result<(), StoreError> {
    let inbox = test_inbox();
    assert!(!db.email_address_exists(&inbox.address).await?);

    db.save_new_inbox(&inbox).await?;
    assert!(db.email_address_exists(&inbox.address).await?);

    let fetched = db.get_inbox_by_address(&inbox.address).await?;
    assert_eq!(fetched.id, inbox.id);
    Ok(())
}

async fn test_missing_address(db: &dyn Database) -> Result<(), StoreError> {
    let address = format!("{}@nowhere.test", generate_id());
    let result = db.get_inbox_by_address(&address).await;
    assert!(
        matches!(result, Err(StoreError::AddressNotFound(_))),
        "unknown address should yield AddressNotFound, got {result:?}"
    );
    Ok(())
}

/// An expired inbox stays stored after its address is handed to a new inbox;
/// lookups must resolve to the one expiring last, whatever the insert order.
async fn test_reused_address(db: &dyn Database) -> Result<(), StoreError> {
    let mut expired = test_inbox();
    expired.ttl = 1_000;
    let mut current = test_inbox();
    current.address.clone_from(&expired.address);
    current.ttl = 4_102_444_800;

    db.save_new_inbox(&expired).await?;
    db.save_new_inbox(&current).await?;
    assert!(db.email_address_exists(&current.address).await?);
    let fetched = db.get_inbox_by_address(&current.address).await?;
    assert_eq!(fetched.id, current.id, "reused address must resolve to the live inbox");

    let mut newer = test_inbox();
    newer.ttl = 4_102_444_800;
    let mut older = test_inbox();
    older.address.clone_from(&newer.address);
    older.ttl = 1_000;

    db.save_new_inbox(&newer).await?;
    db.save_new_inbox(&older).await?;
    let fetched = db.get_inbox_by_address(&newer.address).await?;
    assert_eq!(fetched.id, newer.id, "insert order must not decide the lookup");
    Ok(())
}

async fn test_empty_messages(db: &dyn Database) -> Result<(), StoreError> {
    let inbox = test_inbox();
    db.save_new_inbox(&inbox).await?;
    let messages = db.get_messages_by_inbox_id(&inbox.id).await?;
    assert!(messages.is_empty(), "fresh inbox should have no messages");
    Ok(())
}

async fn test_message_round_trip(db: &dyn Database) -> Result<(), StoreError> {
    let inbox = test_inbox();
    db.save_new_inbox(&inbox).await?;

    let mut msg = test_message(&inbox, "round-trip", 42);
    msg.body_html = Some("<a href=\"x\" target=\"_blank\">x</a>".into());
    db.save_new_message(&msg).await?;

    let fetched = db.get_message_by_id(&inbox.id, &msg.id).await?;
    assert_eq!(fetched, msg);
    Ok(())
}

async fn test_concurrent_messages(db: &dyn Database) -> Result<(), StoreError> {
    let inbox = test_inbox();
    db.save_new_inbox(&inbox).await?;

    let first = test_message(&inbox, "first", 1);
    let second = test_message(&inbox, "second", 2);
    let (a, b) = futures::join!(db.save_new_message(&first), db.save_new_message(&second));
    a?;
    b?;

    let mut messages = db.get_messages_by_inbox_id(&inbox.id).await?;
    messages.sort_by_key(|m| m.received_at);
    assert_eq!(
        messages,
        vec![first, second],
        "both concurrent messages must be stored"
    );
    Ok(())
}

async fn test_missing_message(db: &dyn Database) -> Result<(), StoreError> {
    let inbox = test_inbox();
    db.save_new_inbox(&inbox).await?;
    db.save_new_message(&test_message(&inbox, "present", 1)).await?;

    let result = db.get_message_by_id(&inbox.id, "does-not-exist").await;
    assert!(
        matches!(result, Err(StoreError::MessageNotFound { .. })),
        "absent message should yield MessageNotFound, got {result:?}"
    );
    Ok(())
}

async fn test_message_in_missing_inbox(db: &dyn Database) -> Result<(), StoreError> {
    let result = db.get_message_by_id(&generate_id(), "does-not-exist").await;
    assert!(
        matches!(result, Err(StoreError::InboxNotFound(_))),
        "message lookup in an unknown inbox should yield InboxNotFound, got {result:?}"
    );
    Ok(())
}
