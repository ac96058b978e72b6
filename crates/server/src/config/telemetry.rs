use serde::Deserialize;

/// Log filtering and optional OTLP span export.
///
/// `RUST_LOG`, when set, takes precedence over `log_filter`. With export
/// enabled, the spans around inbox creation, route registration, webhook
/// ingestion and route sweeps are shipped to a collector.
///
/// ```toml
/// [telemetry]
/// log_filter = "info,burner_provider=debug"
/// enabled = true
/// endpoint = "http://localhost:4317"
/// protocol = "grpc"
/// sample_ratio = 0.25
/// environment = "staging"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Export spans over OTLP.
    pub enabled: bool,
    /// Collector endpoint.
    pub endpoint: String,
    pub protocol: OtlpProtocol,
    /// Reported as `service.name`.
    pub service_name: String,
    /// Fraction of traces kept, clamped to `0.0..=1.0`.
    pub sample_ratio: f64,
    /// Exporter timeout in seconds.
    pub timeout_seconds: u64,
    /// Reported as `deployment.environment` when set.
    pub environment: Option<String>,
}

/// OTLP transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    Http,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_owned(),
            enabled: false,
            endpoint: "http://localhost:4317".to_owned(),
            protocol: OtlpProtocol::Grpc,
            service_name: "burner".to_owned(),
            sample_ratio: 1.0,
            timeout_seconds: 10,
            environment: None,
        }
    }
}
