use std::sync::Arc;
use std::time::Duration;

use burner_mailgun::{MailgunConfig, MailgunProvider};
use burner_provider::{EmailProvider, LogEmailProvider, SweeperConfig};

use crate::config::{API_KEY_ENV, ProviderConfig, SIGNING_KEY_ENV};
use crate::error::ServerError;

/// Create the email provider from the given configuration.
///
/// The provider is returned unstarted; the caller starts it with the shared
/// database and router.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn EmailProvider>, ServerError> {
    let provider: Arc<dyn EmailProvider> = match config.backend.as_str() {
        "log" => Arc::new(LogEmailProvider::new("log")),
        "mailgun" => Arc::new(
            MailgunProvider::new("mailgun", mailgun_config(config)?)
                .map_err(|e| ServerError::Config(format!("mailgun client: {e}")))?,
        ),
        other => {
            return Err(ServerError::Config(format!(
                "unknown provider backend: {other}"
            )));
        }
    };
    Ok(provider)
}

fn mailgun_config(config: &ProviderConfig) -> Result<MailgunConfig, ServerError> {
    let domain = config.domain.as_deref().ok_or_else(|| {
        ServerError::Config("mailgun provider requires [provider] domain".into())
    })?;
    let api_key = config.api_key.as_deref().ok_or_else(|| {
        ServerError::Config(format!(
            "mailgun provider requires [provider] api_key or {API_KEY_ENV}"
        ))
    })?;
    let signing_key = config.webhook_signing_key.as_deref().ok_or_else(|| {
        ServerError::Config(format!(
            "mailgun provider requires [provider] webhook_signing_key or {SIGNING_KEY_ENV}"
        ))
    })?;

    let mut mailgun = MailgunConfig::new(domain, api_key, signing_key)
        .with_timeout(Duration::from_secs(config.timeout_seconds))
        .with_route_priority(config.route_priority)
        .with_sweeper(SweeperConfig {
            interval: Duration::from_secs(config.sweep_interval_seconds),
            page_size: config.sweep_page_size,
            call_timeout: Duration::from_secs(config.sweep_call_timeout_seconds),
        })
        .with_ingest_deadline(Duration::from_secs(config.ingest_deadline_seconds));
    if let Some(api_base) = &config.api_base {
        mailgun = mailgun.with_api_base(api_base);
    }
    Ok(mailgun)
}
