use serde::Deserialize;
use thiserror::Error;

/// Authentication material the relay attaches to each webhook delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookSignature {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub signature: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature fields missing")]
    Missing,

    #[error("signature is not valid hex")]
    Malformed,

    #[error("signature mismatch")]
    Mismatch,

    #[error("signing key rejected")]
    InvalidKey,
}

/// Checks that a webhook delivery really came from the relay.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, signature: &WebhookSignature) -> Result<(), SignatureError>;
}
