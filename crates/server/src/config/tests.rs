use super::*;

#[test]
fn empty_file_uses_defaults() {
    let config: BurnerConfig = toml::from_str("").unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.shutdown_timeout_seconds, 30);
    assert_eq!(config.server.website_addr(), "http://localhost:8080");
    assert_eq!(config.store.backend, "memory");
    assert!(!config.store.create_table);
    assert_eq!(config.store.operation_timeout_seconds, 10);
    assert_eq!(config.provider.backend, "log");
    assert_eq!(config.provider.sweep_interval_seconds, 3600);
    assert_eq!(config.provider.sweep_page_size, 1000);
    assert_eq!(config.provider.ingest_deadline_seconds, 20);
    assert_eq!(config.inbox.ttl_seconds, 86_400);
    assert_eq!(config.inbox.max_address_attempts, 5);
    assert!(config.blacklist.domains.is_empty());
    assert!(!config.telemetry.enabled);
}

#[test]
fn full_file() {
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000
        website_addr = "https://burner.example.com"

        [store]
        backend = "dynamodb"
        table_name = "inboxes"
        region = "eu-west-1"
        endpoint_url = "http://localhost:8000"
        create_table = true

        [provider]
        backend = "mailgun"
        domain = "mg.example.com"
        api_key = "key-1"
        webhook_signing_key = "sign-1"
        route_priority = 3
        sweep_interval_seconds = 600

        [inbox]
        domains = ["mg.example.com", "alt.example.com"]
        ttl_seconds = 3600

        [blacklist]
        domains = ["spam.example"]
        addresses = ["bad@example.com"]
    "#;

    let config: BurnerConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.website_addr(), "https://burner.example.com");
    assert_eq!(config.store.backend, "dynamodb");
    assert_eq!(config.store.table_name.as_deref(), Some("inboxes"));
    assert!(config.store.create_table);
    assert_eq!(config.provider.backend, "mailgun");
    assert_eq!(config.provider.route_priority, 3);
    assert_eq!(config.provider.sweep_interval_seconds, 600);
    assert_eq!(config.inbox.ttl_seconds, 3600);
    assert_eq!(
        config.inbox_domains(),
        vec!["mg.example.com".to_owned(), "alt.example.com".to_owned()]
    );
    assert_eq!(config.blacklist.addresses, vec!["bad@example.com"]);
}

#[test]
fn inbox_domains_fall_back_to_provider_domain() {
    let config: BurnerConfig = toml::from_str(
        r#"
        [provider]
        domain = "MG.Example.com"
        "#,
    )
    .unwrap();
    assert_eq!(config.inbox_domains(), vec!["mg.example.com".to_owned()]);

    let config = BurnerConfig::default();
    assert_eq!(config.inbox_domains(), vec![FALLBACK_DOMAIN.to_owned()]);
}

#[test]
fn unknown_section_fields_are_ignored() {
    let config: BurnerConfig = toml::from_str(
        r#"
        [server]
        port = 8081
        legacy_flag = true
        "#,
    )
    .unwrap();
    assert_eq!(config.server.port, 8081);
}

#[test]
fn telemetry_defaults() {
    let config: TelemetryConfig = toml::from_str("").unwrap();
    assert_eq!(config.log_filter, "info");
    assert!(!config.enabled);
    assert_eq!(config.endpoint, "http://localhost:4317");
    assert_eq!(config.protocol, OtlpProtocol::Grpc);
    assert_eq!(config.service_name, "burner");
    assert!((config.sample_ratio - 1.0).abs() < f64::EPSILON);
    assert_eq!(config.timeout_seconds, 10);
    assert!(config.environment.is_none());
}

#[test]
fn telemetry_custom_config() {
    let toml = r#"
        log_filter = "warn,burner_provider=debug"
        enabled = true
        endpoint = "http://collector:4318"
        protocol = "http"
        sample_ratio = 0.25
        environment = "staging"
    "#;

    let config: TelemetryConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.log_filter, "warn,burner_provider=debug");
    assert!(config.enabled);
    assert_eq!(config.endpoint, "http://collector:4318");
    assert_eq!(config.protocol, OtlpProtocol::Http);
    assert_eq!(config.service_name, "burner");
    assert!((config.sample_ratio - 0.25).abs() < f64::EPSILON);
    assert_eq!(config.environment.as_deref(), Some("staging"));
}

#[test]
fn unknown_telemetry_protocol_is_rejected() {
    let result: Result<TelemetryConfig, _> = toml::from_str(r#"protocol = "udp""#);
    assert!(result.is_err());
}
