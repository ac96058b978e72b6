use thiserror::Error;

/// Errors from [`Database`](crate::Database) operations.
///
/// The three not-found variants are distinct from persistence failures so
/// callers can pick a different recovery path (for example reusing an address
/// that no longer has an inbox).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("inbox not found: {0}")]
    InboxNotFound(String),

    #[error("no inbox with address: {0}")]
    AddressNotFound(String),

    #[error("message {message_id} does not exist in inbox {inbox_id}")]
    MessageNotFound { inbox_id: String, message_id: String },

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl StoreError {
    /// Returns `true` for the not-found family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InboxNotFound(_) | Self::AddressNotFound(_) | Self::MessageNotFound { .. }
        )
    }
}
