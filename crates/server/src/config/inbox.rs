use serde::Deserialize;

/// Inbox creation settings.
#[derive(Debug, Deserialize)]
pub struct InboxConfig {
    /// Domains inboxes may be created on. The first one is used for
    /// generated addresses. When empty, the provider domain is used.
    #[serde(default)]
    pub domains: Vec<String>,
    /// Lifetime of a new inbox, in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// How many random addresses to try before giving up.
    #[serde(default = "default_max_address_attempts")]
    pub max_address_attempts: u32,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            ttl_seconds: default_ttl(),
            max_address_attempts: default_max_address_attempts(),
        }
    }
}

fn default_ttl() -> u64 {
    24 * 60 * 60
}

fn default_max_address_attempts() -> u32 {
    5
}
