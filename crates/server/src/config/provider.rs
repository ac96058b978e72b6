use serde::Deserialize;

/// Environment variable overriding [`ProviderConfig::api_key`].
pub const API_KEY_ENV: &str = "BURNER_MAILGUN_API_KEY";

/// Environment variable overriding [`ProviderConfig::webhook_signing_key`].
pub const SIGNING_KEY_ENV: &str = "BURNER_MAILGUN_SIGNING_KEY";

/// Configuration for the email provider.
///
/// # Example
///
/// ```toml
/// [provider]
/// backend = "mailgun"
/// domain = "mg.example.com"
/// sweep_interval_seconds = 3600
/// ```
///
/// Secrets are best supplied through `BURNER_MAILGUN_API_KEY` and
/// `BURNER_MAILGUN_SIGNING_KEY`, which take precedence over the file.
#[derive(Deserialize)]
pub struct ProviderConfig {
    /// Which provider to use: `"log"` or `"mailgun"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Mailgun sending domain.
    pub domain: Option<String>,
    /// Mailgun private API key.
    pub api_key: Option<String>,
    /// Mailgun HTTP webhook signing key.
    pub webhook_signing_key: Option<String>,
    /// API base override (EU region, tests).
    pub api_base: Option<String>,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Priority of created routes.
    #[serde(default = "default_route_priority")]
    pub route_priority: u32,
    /// Seconds between two route-expiry sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Routes fetched per list call during a sweep.
    #[serde(default = "default_sweep_page_size")]
    pub sweep_page_size: usize,
    /// Upper bound for one sweeper call, in seconds.
    #[serde(default = "default_timeout")]
    pub sweep_call_timeout_seconds: u64,
    /// Upper bound for processing one inbound delivery, in seconds.
    #[serde(default = "default_ingest_deadline")]
    pub ingest_deadline_seconds: u64,
}

impl ProviderConfig {
    /// Overlay secrets from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(key) = lookup(SIGNING_KEY_ENV).filter(|v| !v.is_empty()) {
            self.webhook_signing_key = Some(key);
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            domain: None,
            api_key: None,
            webhook_signing_key: None,
            api_base: None,
            timeout_seconds: default_timeout(),
            route_priority: default_route_priority(),
            sweep_interval_seconds: default_sweep_interval(),
            sweep_page_size: default_sweep_page_size(),
            sweep_call_timeout_seconds: default_timeout(),
            ingest_deadline_seconds: default_ingest_deadline(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ProviderConfig")
            .field("backend", &self.backend)
            .field("domain", &self.domain)
            .field("api_key", &redact(&self.api_key))
            .field("webhook_signing_key", &redact(&self.webhook_signing_key))
            .field("api_base", &self.api_base)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("route_priority", &self.route_priority)
            .field("sweep_interval_seconds", &self.sweep_interval_seconds)
            .field("sweep_page_size", &self.sweep_page_size)
            .field("sweep_call_timeout_seconds", &self.sweep_call_timeout_seconds)
            .field("ingest_deadline_seconds", &self.ingest_deadline_seconds)
            .finish()
    }
}

fn default_backend() -> String {
    "log".to_owned()
}

fn default_timeout() -> u64 {
    30
}

fn default_route_priority() -> u32 {
    1
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_sweep_page_size() -> usize {
    1000
}

fn default_ingest_deadline() -> u64 {
    20
}
