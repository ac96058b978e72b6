use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use tracing::{info, warn};

use burner_provider::ProviderContext;
use burner_server::api::AppState;
use burner_server::config::BurnerConfig;
use burner_server::inbox::{InboxService, InboxSettings};

/// Burner disposable inbox server.
#[derive(Parser, Debug)]
#[command(name = "burner-server", about = "HTTP server for disposable email inboxes")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "burner.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let mut config: BurnerConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        toml::from_str("")?
    };
    config.provider.apply_env();
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let telemetry_guard = burner_server::telemetry::init(&config.telemetry);

    if !Path::new(&cli.config).exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    let database = burner_server::store_factory::create_database(&config.store).await?;
    let provider = burner_server::provider_factory::create_provider(&config.provider)?;
    let blacklist = burner_server::blacklist::build_blacklist(&config.blacklist);

    let website_addr = config.server.website_addr();
    let webhook_routes = provider
        .start(ProviderContext {
            website_addr: website_addr.clone(),
            database: Arc::clone(&database),
            router: Router::new(),
            blacklist,
        })
        .await?;
    info!(provider = %provider.name(), website_addr = %website_addr, "email provider started");

    let inboxes = InboxService::new(
        database,
        Arc::clone(&provider),
        InboxSettings {
            domains: config.inbox_domains(),
            ttl: Duration::from_secs(config.inbox.ttl_seconds),
            max_address_attempts: config.inbox.max_address_attempts,
        },
    );
    let app = burner_server::api::router(
        AppState {
            inboxes: Arc::new(inboxes),
        },
        webhook_routes,
    );

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let addr = format!("{host}:{}", config.server.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "burner-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the provider (and its route sweeper) within the shutdown budget.
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    match tokio::time::timeout(shutdown_timeout, provider.stop()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "email provider did not stop cleanly"),
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded while stopping the email provider"
        ),
    }

    telemetry_guard.shutdown();

    info!("burner-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
