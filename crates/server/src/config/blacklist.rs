use serde::Deserialize;

/// Senders whose mail is refused at ingestion.
///
/// ```toml
/// [blacklist]
/// domains = ["spam.example"]
/// addresses = ["noreply@marketing.example"]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct BlacklistConfig {
    /// Sender domains to refuse (matched case-insensitively).
    #[serde(default)]
    pub domains: Vec<String>,
    /// Full sender addresses to refuse (matched case-insensitively).
    #[serde(default)]
    pub addresses: Vec<String>,
}
