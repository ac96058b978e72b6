//! Inbox and message endpoints.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use burner_core::{Inbox, InboxStatus, Message};

use crate::error::ServerError;
use crate::inbox::{CreateInboxRequest, MessageSummary};

use super::AppState;

/// An inbox together with its derived lifecycle state.
#[derive(Debug, Serialize)]
pub struct InboxView {
    #[serde(flatten)]
    pub inbox: Inbox,
    pub status: InboxStatus,
}

impl From<Inbox> for InboxView {
    fn from(inbox: Inbox) -> Self {
        let status = inbox.status();
        Self { inbox, status }
    }
}

#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    pub inbox_id: String,
    pub messages: Vec<MessageSummary>,
    pub total: usize,
}

/// `POST /api/v1/inbox` -- create an inbox.
///
/// The body is optional; an empty body asks for a generated address.
pub async fn create_inbox(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ServerError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateInboxRequest::default()
    } else {
        serde_json::from_slice::<CreateInboxRequest>(&body)
            .map_err(|e| ServerError::InvalidRequest(format!("invalid JSON body: {e}")))?
    };

    let inbox = state.inboxes.create_inbox(&request).await?;
    Ok((StatusCode::CREATED, Json(InboxView::from(inbox))))
}

/// `GET /api/v1/inbox/{inbox_id}`
pub async fn get_inbox(
    State(state): State<AppState>,
    Path(inbox_id): Path<String>,
) -> Result<Json<InboxView>, ServerError> {
    let inbox = state.inboxes.get_inbox(&inbox_id).await?;
    Ok(Json(inbox.into()))
}

/// `GET /api/v1/inbox/{inbox_id}/messages` -- newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(inbox_id): Path<String>,
) -> Result<Json<ListMessagesResponse>, ServerError> {
    let messages = state.inboxes.list_messages(&inbox_id).await?;
    Ok(Json(ListMessagesResponse {
        inbox_id,
        total: messages.len(),
        messages,
    }))
}

/// `GET /api/v1/inbox/{inbox_id}/messages/{message_id}`
pub async fn get_message(
    State(state): State<AppState>,
    Path((inbox_id, message_id)): Path<(String, String)>,
) -> Result<Json<Message>, ServerError> {
    let message = state.inboxes.get_message(&inbox_id, &message_id).await?;
    Ok(Json(message))
}
