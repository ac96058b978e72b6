mod blacklist;
mod inbox;
mod provider;
mod server;
mod store;
mod telemetry;

#[cfg(test)]
mod tests;

pub use blacklist::*;
pub use inbox::*;
pub use provider::*;
pub use server::*;
pub use store::*;
pub use telemetry::*;

use serde::Deserialize;

/// Domain used for generated addresses when neither `[inbox] domains` nor a
/// provider domain is configured.
pub const FALLBACK_DOMAIN: &str = "localhost";

/// Top-level configuration for the burner server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct BurnerConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Inbox database configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Email provider configuration.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Inbox creation settings.
    #[serde(default)]
    pub inbox: InboxConfig,
    /// Refused senders.
    #[serde(default)]
    pub blacklist: BlacklistConfig,
    /// OpenTelemetry distributed tracing configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl BurnerConfig {
    /// Domains inboxes may be created on, falling back to the provider
    /// domain and then to [`FALLBACK_DOMAIN`].
    pub fn inbox_domains(&self) -> Vec<String> {
        if !self.inbox.domains.is_empty() {
            return self
                .inbox
                .domains
                .iter()
                .map(|d| d.to_ascii_lowercase())
                .collect();
        }
        match &self.provider.domain {
            Some(domain) => vec![domain.to_ascii_lowercase()],
            None => vec![FALLBACK_DOMAIN.to_owned()],
        }
    }
}
