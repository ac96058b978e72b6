use std::sync::OnceLock;

use async_trait::async_trait;
use axum::Router;
use tracing::info;

use burner_core::Inbox;

use crate::error::ProviderError;
use crate::provider::{EmailProvider, ProviderContext};
use crate::route::encode_route_ttl;

/// A provider that logs route registrations without performing any external
/// I/O.
///
/// Useful for local development and tests where no relay is available. It
/// mounts no webhook endpoint and runs no sweeper.
pub struct LogEmailProvider {
    name: String,
    website_addr: OnceLock<String>,
}

impl LogEmailProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website_addr: OnceLock::new(),
        }
    }
}

#[async_trait]
impl EmailProvider for LogEmailProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, ctx: ProviderContext) -> Result<Router, ProviderError> {
        self.website_addr
            .set(ctx.website_addr)
            .map_err(|_| ProviderError::AlreadyStarted)?;
        info!(provider = %self.name, "log provider started");
        Ok(ctx.router)
    }

    #[allow(clippy::unused_async)]
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn register_route(&self, inbox: &Inbox) -> Result<String, ProviderError> {
        let website = self.website_addr.get().ok_or(ProviderError::NotStarted)?;
        let route_id = format!("log-{}", uuid::Uuid::new_v4());
        info!(
            provider = %self.name,
            route_id = %route_id,
            address = %inbox.address,
            forward_to = %format!("{website}/mg/incoming/{}/", inbox.id),
            description = %encode_route_ttl(inbox.ttl),
            "log provider registered route"
        );
        Ok(route_id)
    }
}
