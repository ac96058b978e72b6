use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use burner_store::StoreError;
use thiserror::Error;

/// Errors that can occur when running the burner server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was malformed (bad local part, unknown domain).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requested inbox or message does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A custom address is held by an unexpired inbox.
    #[error("address already in use: {0}")]
    AddressTaken(String),

    /// No free random address was found within the attempt budget.
    #[error("could not allocate a free address after {0} attempts")]
    AddressExhausted(u32),

    /// A storage failure surfaced through the API.
    #[error("storage error: {0}")]
    Store(StoreError),

    /// The email provider could not be started or stopped.
    #[error("provider error: {0}")]
    Provider(#[from] burner_provider::ProviderError),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else {
            Self::Store(err)
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AddressTaken(_) => StatusCode::CONFLICT,
            Self::AddressExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Io(_) | Self::Store(_) | Self::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
