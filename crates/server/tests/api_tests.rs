use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use burner_core::{Inbox, Message, generate_id};
use burner_provider::{EmailProvider, ProviderContext, ProviderError};
use burner_server::api::{AppState, router};
use burner_server::inbox::{CreateInboxRequest, InboxService, InboxSettings};
use burner_store::Database;
use burner_store_memory::MemoryDatabase;

// -- Mock provider ----------------------------------------------------------

struct MockProvider {
    fail: bool,
    registered: AtomicUsize,
}

impl MockProvider {
    fn ok() -> Self {
        Self {
            fail: false,
            registered: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            registered: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmailProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(&self, ctx: ProviderContext) -> Result<Router, ProviderError> {
        Ok(ctx.router)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn register_route(&self, inbox: &Inbox) -> Result<String, ProviderError> {
        if self.fail {
            return Err(ProviderError::Connection("relay unreachable".into()));
        }
        let n = self.registered.fetch_add(1, Ordering::SeqCst);
        Ok(format!("route-{n}-{}", inbox.id))
    }
}

// -- Helpers ----------------------------------------------------------------

struct TestApp {
    router: Router,
    db: Arc<MemoryDatabase>,
    service: Arc<InboxService>,
}

fn app_with(provider: MockProvider) -> TestApp {
    let db = Arc::new(MemoryDatabase::new());
    let database: Arc<dyn Database> = db.clone();
    let provider: Arc<dyn EmailProvider> = Arc::new(provider);
    let service = Arc::new(InboxService::new(
        database,
        provider,
        InboxSettings {
            domains: vec!["burner.test".into(), "alt.test".into()],
            ttl: Duration::from_secs(3600),
            max_address_attempts: 3,
        },
    ));
    let router = router(
        AppState {
            inboxes: Arc::clone(&service),
        },
        Router::new(),
    );
    TestApp {
        router,
        db,
        service,
    }
}

fn app() -> TestApp {
    app_with(MockProvider::ok())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(
        router,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

async fn create(router: &Router, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method("POST").uri("/api/v1/inbox");
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(router, request).await
}

fn message(inbox: &Inbox, received_at: i64, subject: &str) -> Message {
    Message {
        id: generate_id(),
        inbox_id: inbox.id.clone(),
        email_provider_id: format!("<{subject}@relay>"),
        received_at,
        ttl: inbox.ttl,
        sender: "bob@example.com".into(),
        from: "Bob <bob@example.com>".into(),
        subject: subject.into(),
        body_plain: "hi".into(),
        body_html: None,
    }
}

// -- Tests ------------------------------------------------------------------

#[tokio::test]
async fn health_is_ok() {
    let app = app();
    let (status, body) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_generates_address_and_registers_route() {
    let app = app();
    let (status, body) = create(&app.router, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let address = body["email_address"].as_str().unwrap();
    assert!(address.ends_with("@burner.test"));
    assert_eq!(body["status"], "created");
    assert_eq!(body["failed_to_create"], false);
    assert_ne!(body["ep_routeid"], "-");

    let id = body["id"].as_str().unwrap();
    let stored = app.db.get_inbox_by_id(id).await.unwrap();
    assert_eq!(stored.address, address);
    assert!(stored.email_provider_route_id.starts_with("route-"));
    assert!(!stored.failed_to_create);
}

#[tokio::test]
async fn create_with_custom_address() {
    let app = app();
    let (status, body) = create(
        &app.router,
        Some(serde_json::json!({ "local_part": "Alice", "domain": "alt.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email_address"], "alice@alt.test");
}

#[tokio::test]
async fn duplicate_custom_address_conflicts() {
    let app = app();
    let request = serde_json::json!({ "local_part": "taken" });
    let (status, _) = create(&app.router, Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create(&app.router, Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("taken@burner.test"));
}

#[tokio::test]
async fn expired_custom_address_is_reusable() {
    let app = app();
    let request = CreateInboxRequest {
        local_part: Some("recycled".into()),
        domain: None,
    };
    let first = app.service.create_inbox_at(&request, 1_000).await.unwrap();

    // Well past the first inbox's one-hour TTL.
    let second = app.service.create_inbox_at(&request, 100_000).await.unwrap();
    assert_eq!(second.address, first.address);
    assert_ne!(second.id, first.id);

    let current = app.db.get_inbox_by_address(&first.address).await.unwrap();
    assert_eq!(current.id, second.id);
}

#[tokio::test]
async fn provider_failure_marks_inbox_failed() {
    let app = app_with(MockProvider::failing());
    let (status, body) = create(&app.router, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["failed_to_create"], true);
    assert_eq!(body["ep_routeid"], "-");

    let stored = app
        .db
        .get_inbox_by_id(body["id"].as_str().unwrap())
        .await
        .unwrap();
    assert!(stored.failed_to_create);
    assert_eq!(stored.email_provider_route_id, "-");
}

#[tokio::test]
async fn invalid_local_part_is_bad_request() {
    let app = app();
    let (status, body) = create(
        &app.router,
        Some(serde_json::json!({ "local_part": "no spaces allowed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(app.db.inbox_count(), 0);
}

#[tokio::test]
async fn unserved_domain_is_bad_request() {
    let app = app();
    let (status, _) = create(
        &app.router,
        Some(serde_json::json!({ "local_part": "alice", "domain": "gmail.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/inbox")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_inbox_round_trips() {
    let app = app();
    let (_, created) = create(&app.router, None).await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = get(&app.router, &format!("/api/v1/inbox/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);
}

#[tokio::test]
async fn unknown_inbox_is_not_found() {
    let app = app();
    let (status, body) = get(&app.router, "/api/v1/inbox/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = get(&app.router, "/api/v1/inbox/does-not-exist/messages").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn messages_are_listed_newest_first() {
    let app = app();
    let (_, created) = create(&app.router, None).await;
    let inbox = app
        .db
        .get_inbox_by_id(created["id"].as_str().unwrap())
        .await
        .unwrap();

    let now = chrono::Utc::now().timestamp();
    app.db
        .save_new_message(&message(&inbox, now - 7200, "oldest"))
        .await
        .unwrap();
    app.db
        .save_new_message(&message(&inbox, now, "newest"))
        .await
        .unwrap();
    app.db
        .save_new_message(&message(&inbox, now - 1800, "middle"))
        .await
        .unwrap();

    let (status, body) = get(&app.router, &format!("/api/v1/inbox/{}/messages", inbox.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);

    let subjects: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["subject"].as_str().unwrap())
        .collect();
    assert_eq!(subjects, vec!["newest", "middle", "oldest"]);
    assert_eq!(body["messages"][0]["received"], "Less than 30s ago");
    assert!(body["messages"][0].get("body_html").is_none());
}

#[tokio::test]
async fn list_messages_with_fixed_clock() {
    let app = app();
    let inbox = app
        .service
        .create_inbox_at(&CreateInboxRequest::default(), 10_000)
        .await
        .unwrap();
    app.db
        .save_new_message(&message(&inbox, 10_000 - 1800, "half-hour"))
        .await
        .unwrap();
    app.db
        .save_new_message(&message(&inbox, 10_000 - 9010, "two-and-a-half"))
        .await
        .unwrap();

    let summaries = app.service.list_messages_at(&inbox.id, 10_000).await.unwrap();
    let received: Vec<&str> = summaries.iter().map(|s| s.received.as_str()).collect();
    assert_eq!(received, vec!["30m ago", "2h 30m ago"]);
}

#[tokio::test]
async fn get_single_message() {
    let app = app();
    let (_, created) = create(&app.router, None).await;
    let inbox = app
        .db
        .get_inbox_by_id(created["id"].as_str().unwrap())
        .await
        .unwrap();
    let msg = message(&inbox, 1_700_000_000, "hello");
    app.db.save_new_message(&msg).await.unwrap();

    let (status, body) = get(
        &app.router,
        &format!("/api/v1/inbox/{}/messages/{}", inbox.id, msg.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], "hello");
    assert_eq!(body["ep_id"], "<hello@relay>");

    let (status, _) = get(
        &app.router,
        &format!("/api/v1/inbox/{}/messages/missing", inbox.id),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
