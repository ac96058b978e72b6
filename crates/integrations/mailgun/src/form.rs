//! Body extractor for Mailgun's `forward()` webhook.
//!
//! Mailgun posts `application/x-www-form-urlencoded` for plain messages and
//! switches to `multipart/form-data` once a message carries attachments. Both
//! encodings yield the same [`IncomingMail`]; attachment parts are skipped.

use axum::extract::{Form, FromRequest, Multipart, Request};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use burner_provider::IncomingMail;
use serde::Deserialize;
use serde::de::value::{Error as ValueError, MapDeserializer};
use tracing::debug;

/// Largest delivery accepted on the webhook. Mailgun caps messages at 25 MB.
pub(crate) const MAX_INCOMING_BYTES: usize = 32 * 1024 * 1024;

/// An inbound delivery in either form encoding.
#[derive(Debug)]
pub(crate) struct IncomingForm(pub IncomingMail);

impl<S> FromRequest<S> for IncomingForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Form(mail) = Form::<IncomingMail>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Self(mail));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let mut fields = Vec::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(IntoResponse::into_response)?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if field.file_name().is_some() {
                debug!(part = %name, "skipping attachment");
                continue;
            }
            let value = field.text().await.map_err(IntoResponse::into_response)?;
            fields.push((name, value));
        }

        mail_from_fields(fields)
            .map(Self)
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

/// Decode text parts with the same field mapping the urlencoded body uses.
fn mail_from_fields(fields: Vec<(String, String)>) -> Result<IncomingMail, ValueError> {
    IncomingMail::deserialize(MapDeserializer::<_, ValueError>::new(fields.into_iter()))
}
