use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

use burner_core::Inbox;
use burner_store::Database;

use crate::error::ProviderError;

/// Sender filter: returns `true` when mail from the given sender address must
/// be rejected.
pub type Blacklist = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A [`Blacklist`] that rejects nobody.
pub fn allow_all() -> Blacklist {
    Arc::new(|_| false)
}

/// Everything a provider needs to wire itself into the running service.
pub struct ProviderContext {
    /// Public base URL that the relay forwards inbound mail to.
    pub website_addr: String,
    pub database: Arc<dyn Database>,
    /// Router to extend with the provider's inbound webhook endpoint.
    pub router: Router,
    pub blacklist: Blacklist,
}

/// An external mail relay that owns forwarding rules for inbox addresses.
///
/// Implementations are shared behind `Arc<dyn EmailProvider>` between request
/// handlers and the shutdown path, so every method takes `&self`.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Returns the unique name of this provider.
    fn name(&self) -> &str;

    /// Register the inbound webhook endpoint on `ctx.router` and start any
    /// background maintenance.
    ///
    /// Returns the extended router. Calling `start` twice fails with
    /// [`ProviderError::AlreadyStarted`].
    async fn start(&self, ctx: ProviderContext) -> Result<Router, ProviderError>;

    /// Stop background maintenance and wait for it to finish.
    async fn stop(&self) -> Result<(), ProviderError>;

    /// Create the forwarding rule for `inbox.address` and return its
    /// provider-assigned id.
    ///
    /// The rule forwards to `{website_addr}/mg/incoming/{inbox.id}/` and is
    /// tagged with the inbox TTL so the sweeper can expire it later.
    async fn register_route(&self, inbox: &Inbox) -> Result<String, ProviderError>;
}
