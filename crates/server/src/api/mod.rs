pub mod health;
pub mod inboxes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::inbox::InboxService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Inbox lifecycle operations.
    pub inboxes: Arc<InboxService>,
}

/// Build the REST router.
///
/// `base` carries routes registered elsewhere, typically the provider's
/// inbound webhook as returned by `EmailProvider::start`.
pub fn router(state: AppState, base: Router) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/inbox", post(inboxes::create_inbox))
        .route("/api/v1/inbox/{inbox_id}", get(inboxes::get_inbox))
        .route(
            "/api/v1/inbox/{inbox_id}/messages",
            get(inboxes::list_messages),
        )
        .route(
            "/api/v1/inbox/{inbox_id}/messages/{message_id}",
            get(inboxes::get_message),
        )
        .with_state(state);

    base.merge(api).layer(TraceLayer::new_for_http())
}
