use std::time::Duration;

use burner_provider::SweeperConfig;

/// Default Mailgun API base (US region).
pub const DEFAULT_API_BASE: &str = "https://api.mailgun.net/v3";

/// Configuration for the Mailgun provider.
#[derive(Clone)]
pub struct MailgunConfig {
    /// Sending domain the inbox addresses live on.
    pub domain: String,

    /// Private API key, used as the basic-auth password for user `api`.
    pub api_key: String,

    /// HTTP webhook signing key used to authenticate inbound deliveries.
    pub webhook_signing_key: String,

    /// API base URL. Override for the EU region or for tests.
    pub api_base: String,

    /// Per-request HTTP timeout.
    pub timeout: Duration,

    /// Priority assigned to every created route.
    pub route_priority: u32,

    /// Route-expiry sweeper settings.
    pub sweeper: SweeperConfig,

    /// Upper bound for processing one inbound delivery.
    pub ingest_deadline: Duration,
}

impl MailgunConfig {
    /// Create a configuration with default API base, a 30-second timeout,
    /// route priority 1, an hourly sweep and a 20-second ingest deadline.
    pub fn new(
        domain: impl Into<String>,
        api_key: impl Into<String>,
        webhook_signing_key: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            api_key: api_key.into(),
            webhook_signing_key: webhook_signing_key.into(),
            api_base: DEFAULT_API_BASE.to_owned(),
            timeout: Duration::from_secs(30),
            route_priority: 1,
            sweeper: SweeperConfig::default(),
            ingest_deadline: Duration::from_secs(20),
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_route_priority(mut self, priority: u32) -> Self {
        self.route_priority = priority;
        self
    }

    #[must_use]
    pub fn with_sweeper(mut self, sweeper: SweeperConfig) -> Self {
        self.sweeper = sweeper;
        self
    }

    #[must_use]
    pub fn with_ingest_deadline(mut self, deadline: Duration) -> Self {
        self.ingest_deadline = deadline;
        self
    }
}

impl std::fmt::Debug for MailgunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailgunConfig")
            .field("domain", &self.domain)
            .field("api_key", &"[REDACTED]")
            .field("webhook_signing_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("route_priority", &self.route_priority)
            .field("sweeper", &self.sweeper)
            .field("ingest_deadline", &self.ingest_deadline)
            .finish()
    }
}
