use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to an email provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The provider did not respond within the allowed duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The provider rejected the request due to rate limiting.
    #[error("rate limited")]
    RateLimited,

    /// The provider answered with a non-success status.
    #[error("provider API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The provider was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("provider already started")]
    AlreadyStarted,

    #[error("provider not started")]
    NotStarted,
}

impl ProviderError {
    /// Returns `true` if the error is transient and the operation may succeed
    /// on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Connection(_) | Self::RateLimited
        )
    }
}
