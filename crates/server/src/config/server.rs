use serde::Deserialize;

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL the mail provider forwards inbound mail to
    /// (e.g. `https://burner.example.com`).
    ///
    /// If not set, defaults to `http://localhost:{port}`.
    pub website_addr: Option<String>,
    /// Graceful shutdown timeout in seconds.
    ///
    /// Upper bound for stopping the email provider (and its route sweeper)
    /// once the listener has drained.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl ServerConfig {
    /// The configured website address, or the local fallback.
    pub fn website_addr(&self) -> String {
        self.website_addr
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            website_addr: None,
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}
