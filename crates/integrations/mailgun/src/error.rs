use std::time::Duration;

use burner_provider::ProviderError;
use thiserror::Error;

/// Errors specific to the Mailgun provider.
///
/// These are internal errors that get converted into [`ProviderError`] at the
/// public API boundary.
#[derive(Debug, Error)]
pub enum MailgunError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The API returned an unexpected status code.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The API answered 2xx with a body we could not decode.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<MailgunError> for ProviderError {
    fn from(err: MailgunError) -> Self {
        match err {
            MailgunError::Http(e) => ProviderError::Connection(e.to_string()),
            MailgunError::Timeout(d) => ProviderError::Timeout(d),
            MailgunError::UnexpectedStatus { status, body } => {
                if status == 429 {
                    ProviderError::RateLimited
                } else if (500..600).contains(&status) {
                    // Server errors are retryable
                    ProviderError::Connection(format!("HTTP {status}: {body}"))
                } else {
                    ProviderError::Api { status, body }
                }
            }
            MailgunError::InvalidResponse(msg) => ProviderError::Serialization(msg),
        }
    }
}
