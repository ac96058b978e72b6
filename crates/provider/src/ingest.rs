//! Webhook ingestion: turn one relay delivery into one stored message.
//!
//! The pipeline is strictly ordered and stops at the first failure:
//! authenticate, filter the sender, resolve the inbox, normalize, persist,
//! acknowledge. Nothing is written unless every earlier stage passed.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use burner_core::{Inbox, Message, generate_id};
use burner_store::{Database, StoreError};

use crate::html::{ContentError, add_target_blank};
use crate::provider::Blacklist;
use crate::signature::{SignatureError, SignatureVerifier, WebhookSignature};

/// One inbound delivery as posted by the relay (form-encoded).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingMail {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, rename = "body-plain")]
    pub body_plain: String,
    #[serde(default, rename = "body-html")]
    pub body_html: String,
    #[serde(default, rename = "message-id")]
    pub message_id: String,
    #[serde(flatten)]
    pub signature: WebhookSignature,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] SignatureError),

    #[error("sender {0} is blacklisted")]
    Blacklisted(String),

    #[error("failed to resolve inbox: {0}")]
    InboxLookup(#[source] StoreError),

    #[error("failed to normalize message: {0}")]
    ContentTransform(#[from] ContentError),

    #[error("failed to persist message: {0}")]
    Persistence(#[source] StoreError),

    #[error("ingestion did not finish within {0:?}")]
    Timeout(Duration),
}

impl IngestError {
    /// HTTP status reported back to the relay.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Blacklisted(_) => StatusCode::NOT_ACCEPTABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Authenticates, filters, normalizes and stores inbound mail.
pub struct IngestPipeline {
    database: Arc<dyn Database>,
    blacklist: Blacklist,
    verifier: Arc<dyn SignatureVerifier>,
    deadline: Duration,
}

impl IngestPipeline {
    pub fn new(
        database: Arc<dyn Database>,
        blacklist: Blacklist,
        verifier: Arc<dyn SignatureVerifier>,
        deadline: Duration,
    ) -> Self {
        Self {
            database,
            blacklist,
            verifier,
            deadline,
        }
    }

    /// Process one delivery for `inbox_id` and return the inbox id on success.
    ///
    /// The whole pipeline is bounded by the configured deadline.
    #[instrument(skip(self, mail), fields(sender = %mail.sender))]
    pub async fn ingest(&self, inbox_id: &str, mail: IncomingMail) -> Result<String, IngestError> {
        let now = chrono::Utc::now().timestamp();
        tokio::time::timeout(self.deadline, self.ingest_at(inbox_id, mail, now))
            .await
            .map_err(|_| IngestError::Timeout(self.deadline))?
    }

    async fn ingest_at(
        &self,
        inbox_id: &str,
        mail: IncomingMail,
        now: i64,
    ) -> Result<String, IngestError> {
        if let Err(e) = self.verifier.verify(&mail.signature) {
            warn!(error = %e, "rejecting webhook with invalid signature");
            return Err(e.into());
        }

        if (self.blacklist)(&mail.sender) {
            info!("rejecting mail from blacklisted sender");
            return Err(IngestError::Blacklisted(mail.sender));
        }

        let inbox = self
            .database
            .get_inbox_by_id(inbox_id)
            .await
            .map_err(IngestError::InboxLookup)?;

        let message = normalize(&inbox, mail, now)?;

        self.database
            .save_new_message(&message)
            .await
            .map_err(IngestError::Persistence)?;

        info!(message_id = %message.id, "stored incoming message");
        Ok(inbox.id)
    }
}

/// Build the stored message. Only a non-empty HTML part is kept, with its links
/// rewritten; every other field is copied verbatim.
fn normalize(inbox: &Inbox, mail: IncomingMail, now: i64) -> Result<Message, ContentError> {
    let body_html = if mail.body_html.is_empty() {
        None
    } else {
        Some(add_target_blank(&mail.body_html)?)
    };

    Ok(Message {
        id: generate_id(),
        inbox_id: inbox.id.clone(),
        email_provider_id: mail.message_id,
        received_at: now,
        ttl: inbox.ttl,
        sender: mail.sender,
        from: mail.from,
        subject: mail.subject,
        body_plain: mail.body_plain,
        body_html,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use burner_store_memory::MemoryDatabase;

    use super::*;
    use crate::provider::allow_all;

    struct AcceptGood;

    impl SignatureVerifier for AcceptGood {
        fn verify(&self, signature: &WebhookSignature) -> Result<(), SignatureError> {
            if signature.signature == "good" {
                Ok(())
            } else {
                Err(SignatureError::Mismatch)
            }
        }
    }

    /// A database whose writes never complete.
    struct StalledDatabase(MemoryDatabase);

    #[async_trait]
    impl Database for StalledDatabase {
        async fn save_new_inbox(&self, inbox: &Inbox) -> Result<(), StoreError> {
            self.0.save_new_inbox(inbox).await
        }
        async fn get_inbox_by_id(&self, id: &str) -> Result<Inbox, StoreError> {
            self.0.get_inbox_by_id(id).await
        }
        async fn get_inbox_by_address(&self, address: &str) -> Result<Inbox, StoreError> {
            self.0.get_inbox_by_address(address).await
        }
        async fn email_address_exists(&self, address: &str) -> Result<bool, StoreError> {
            self.0.email_address_exists(address).await
        }
        async fn set_inbox_created(&self, inbox: &Inbox) -> Result<(), StoreError> {
            self.0.set_inbox_created(inbox).await
        }
        async fn set_inbox_failed(&self, inbox: &Inbox) -> Result<(), StoreError> {
            self.0.set_inbox_failed(inbox).await
        }
        async fn save_new_message(&self, _message: &Message) -> Result<(), StoreError> {
            std::future::pending().await
        }
        async fn get_messages_by_inbox_id(&self, id: &str) -> Result<Vec<Message>, StoreError> {
            self.0.get_messages_by_inbox_id(id).await
        }
        async fn get_message_by_id(
            &self,
            inbox_id: &str,
            message_id: &str,
        ) -> Result<Message, StoreError> {
            self.0.get_message_by_id(inbox_id, message_id).await
        }
    }

    async fn seeded_db() -> (Arc<MemoryDatabase>, Inbox) {
        let db = Arc::new(MemoryDatabase::new());
        let mut inbox = Inbox::new();
        inbox.id = "inbox-1".into();
        inbox.address = "box@burner.test".into();
        inbox.ttl = 2_000_000_000;
        db.save_new_inbox(&inbox).await.unwrap();
        (db, inbox)
    }

    fn pipeline(db: Arc<dyn Database>, blacklist: Blacklist) -> IngestPipeline {
        IngestPipeline::new(db, blacklist, Arc::new(AcceptGood), Duration::from_secs(5))
    }

    fn mail(signature: &str) -> IncomingMail {
        IncomingMail {
            sender: "bob@example.com".into(),
            from: "Bobby Tables <bob@example.com>".into(),
            subject: "hello".into(),
            body_plain: "Hello there how are you!".into(),
            body_html: String::new(),
            message_id: "<20240101.abc@mail.example.com>".into(),
            signature: WebhookSignature {
                timestamp: "1700000000".into(),
                token: "tok".into(),
                signature: signature.into(),
            },
        }
    }

    #[tokio::test]
    async fn stores_message_and_acknowledges_with_inbox_id() {
        let (db, inbox) = seeded_db().await;
        let p = pipeline(db.clone(), allow_all());

        let ack = p.ingest(&inbox.id, mail("good")).await.unwrap();
        assert_eq!(ack, "inbox-1");

        let stored = db.get_messages_by_inbox_id(&inbox.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        let msg = &stored[0];
        assert_eq!(msg.inbox_id, inbox.id);
        assert_eq!(msg.ttl, inbox.ttl);
        assert_eq!(msg.email_provider_id, "<20240101.abc@mail.example.com>");
        assert_eq!(msg.from, "Bobby Tables <bob@example.com>");
        assert_eq!(msg.body_plain, "Hello there how are you!");
        assert!(msg.body_html.is_none());
    }

    #[tokio::test]
    async fn bad_signature_persists_nothing() {
        let (db, inbox) = seeded_db().await;
        let p = pipeline(db.clone(), allow_all());

        let err = p.ingest(&inbox.id, mail("forged")).await.unwrap_err();
        assert!(matches!(err, IngestError::Unauthorized(SignatureError::Mismatch)));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(db.get_messages_by_inbox_id(&inbox.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blacklisted_sender_persists_nothing() {
        let (db, inbox) = seeded_db().await;
        let p = pipeline(db.clone(), Arc::new(|sender: &str| sender.ends_with("@example.com")));

        let err = p.ingest(&inbox.id, mail("good")).await.unwrap_err();
        assert!(matches!(err, IngestError::Blacklisted(ref s) if s == "bob@example.com"));
        assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
        assert!(db.get_messages_by_inbox_id(&inbox.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_inbox_is_a_server_error() {
        let (db, _) = seeded_db().await;
        let p = pipeline(db, allow_all());

        let err = p.ingest("missing", mail("good")).await.unwrap_err();
        assert!(matches!(err, IngestError::InboxLookup(StoreError::InboxNotFound(_))));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn html_links_are_rewritten() {
        let (db, inbox) = seeded_db().await;
        let p = pipeline(db.clone(), allow_all());

        let mut m = mail("good");
        m.body_html = r#"<p><a href="https://example.com">link</a></p>"#.into();
        p.ingest(&inbox.id, m).await.unwrap();

        let stored = db.get_messages_by_inbox_id(&inbox.id).await.unwrap();
        let html = stored[0].body_html.as_deref().unwrap();
        assert!(html.contains(r#"target="_blank""#));
    }

    #[tokio::test]
    async fn unrewritable_html_persists_nothing() {
        let (db, inbox) = seeded_db().await;
        let p = pipeline(db.clone(), allow_all());

        let mut m = mail("good");
        m.body_html = r#"<select><xmp><script>"use strict";</script></select>"#.into();
        let err = p.ingest(&inbox.id, m).await.unwrap_err();
        assert!(matches!(err, IngestError::ContentTransform(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(db.get_messages_by_inbox_id(&inbox.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn same_delivery_twice_is_stored_twice() {
        let (db, inbox) = seeded_db().await;
        let p = pipeline(db.clone(), allow_all());

        p.ingest(&inbox.id, mail("good")).await.unwrap();
        p.ingest(&inbox.id, mail("good")).await.unwrap();

        assert_eq!(db.get_messages_by_inbox_id(&inbox.id).await.unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_persistence_hits_the_deadline() {
        let stalled = StalledDatabase(MemoryDatabase::new());
        let mut inbox = Inbox::new();
        inbox.id = "slow".into();
        stalled.save_new_inbox(&inbox).await.unwrap();

        let p = pipeline(Arc::new(stalled), allow_all());
        let err = p.ingest("slow", mail("good")).await.unwrap_err();
        assert!(matches!(err, IngestError::Timeout(d) if d == Duration::from_secs(5)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_response_carries_status() {
        let resp = IngestError::Blacklisted("x@y.z".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);
        let resp = IngestError::Unauthorized(SignatureError::Missing).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
