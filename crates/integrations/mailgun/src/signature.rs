use burner_provider::{SignatureError, SignatureVerifier, WebhookSignature};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies Mailgun webhook signatures.
///
/// Mailgun signs each delivery with
/// `hex(HMAC-SHA256(signing_key, timestamp ++ token))`. The comparison is done
/// in constant time.
pub struct MailgunVerifier {
    signing_key: String,
}

impl MailgunVerifier {
    pub fn new(signing_key: impl Into<String>) -> Self {
        Self {
            signing_key: signing_key.into(),
        }
    }

    fn mac(&self, timestamp: &str, token: &str) -> Result<HmacSha256, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_key.as_bytes())
            .map_err(|_| SignatureError::InvalidKey)?;
        mac.update(timestamp.as_bytes());
        mac.update(token.as_bytes());
        Ok(mac)
    }

    /// Produce the hex signature Mailgun would send for `timestamp` and `token`.
    pub fn sign(&self, timestamp: &str, token: &str) -> Result<String, SignatureError> {
        Ok(hex::encode(self.mac(timestamp, token)?.finalize().into_bytes()))
    }
}

impl SignatureVerifier for MailgunVerifier {
    fn verify(&self, signature: &WebhookSignature) -> Result<(), SignatureError> {
        if signature.timestamp.is_empty()
            || signature.token.is_empty()
            || signature.signature.is_empty()
        {
            return Err(SignatureError::Missing);
        }
        let expected = hex::decode(&signature.signature).map_err(|_| SignatureError::Malformed)?;
        self.mac(&signature.timestamp, &signature.token)?
            .verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}

impl std::fmt::Debug for MailgunVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailgunVerifier")
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}
