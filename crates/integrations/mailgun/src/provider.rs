use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use async_trait::async_trait;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::routing::post;
use burner_core::Inbox;
use burner_provider::{
    EmailProvider, IngestError, IngestPipeline, ProviderContext, ProviderError,
    RouteClient, RouteSweeper, encode_route_ttl,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::client::{MailgunClient, NewRoute};
use crate::config::MailgunConfig;
use crate::error::MailgunError;
use crate::form::{IncomingForm, MAX_INCOMING_BYTES};
use crate::signature::MailgunVerifier;

/// Path Mailgun forwards inbound mail to, relative to the website address.
pub const INCOMING_PATH: &str = "/mg/incoming/{inbox_id}/";

struct Sweeper {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// Mailgun implementation of [`EmailProvider`].
///
/// Each inbox gets one Mailgun route matching its address that forwards to
/// this service, stores, and stops further routing. The route description
/// carries the inbox TTL; a background [`RouteSweeper`] started by
/// [`start`](EmailProvider::start) deletes routes whose TTL has passed.
pub struct MailgunProvider {
    provider_name: String,
    config: MailgunConfig,
    client: Arc<MailgunClient>,
    website_addr: OnceLock<String>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl MailgunProvider {
    pub fn new(name: impl Into<String>, config: MailgunConfig) -> Result<Self, MailgunError> {
        let client = MailgunClient::new(&config)?;
        Ok(Self::with_client(name, config, client))
    }

    /// Create a provider around an existing client.
    pub fn with_client(name: impl Into<String>, config: MailgunConfig, client: MailgunClient) -> Self {
        Self {
            provider_name: name.into(),
            config,
            client: Arc::new(client),
            website_addr: OnceLock::new(),
            sweeper: Mutex::new(None),
        }
    }

    fn route_for(&self, website_addr: &str, inbox: &Inbox) -> NewRoute {
        NewRoute {
            priority: self.config.route_priority,
            description: encode_route_ttl(inbox.ttl),
            expression: format!("match_recipient(\"{}\")", inbox.address),
            actions: vec![
                format!("forward(\"{website_addr}/mg/incoming/{}/\")", inbox.id),
                "store()".to_owned(),
                "stop()".to_owned(),
            ],
        }
    }
}

/// Router serving the inbound webhook for `pipeline`.
fn incoming_router(pipeline: Arc<IngestPipeline>) -> Router {
    Router::new()
        .route(INCOMING_PATH, post(incoming))
        .layer(DefaultBodyLimit::max(MAX_INCOMING_BYTES))
        .with_state(pipeline)
}

async fn incoming(
    State(pipeline): State<Arc<IngestPipeline>>,
    Path(inbox_id): Path<String>,
    IncomingForm(mail): IncomingForm,
) -> Result<String, IngestError> {
    pipeline.ingest(&inbox_id, mail).await
}

#[async_trait]
impl EmailProvider for MailgunProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn start(&self, ctx: ProviderContext) -> Result<Router, ProviderError> {
        self.website_addr
            .set(ctx.website_addr.trim_end_matches('/').to_owned())
            .map_err(|_| ProviderError::AlreadyStarted)?;

        let verifier = Arc::new(MailgunVerifier::new(&self.config.webhook_signing_key));
        let pipeline = Arc::new(IngestPipeline::new(
            ctx.database,
            ctx.blacklist,
            verifier,
            self.config.ingest_deadline,
        ));

        let shutdown = CancellationToken::new();
        let routes: Arc<dyn RouteClient> = self.client.clone();
        let handle = RouteSweeper::new(routes, self.config.sweeper.clone()).spawn(shutdown.clone());
        {
            let mut slot = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
            *slot = Some(Sweeper { shutdown, handle });
        }

        info!(
            provider = %self.provider_name,
            domain = %self.config.domain,
            "mailgun provider started"
        );
        Ok(ctx.router.merge(incoming_router(pipeline)))
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ProviderError::NotStarted)?;

        sweeper.shutdown.cancel();
        if let Err(e) = sweeper.handle.await {
            error!(error = %e, "route sweeper task failed");
        }
        info!(provider = %self.provider_name, "mailgun provider stopped");
        Ok(())
    }

    #[instrument(skip(self, inbox), fields(provider = %self.provider_name, inbox_id = %inbox.id))]
    async fn register_route(&self, inbox: &Inbox) -> Result<String, ProviderError> {
        let website_addr = self.website_addr.get().ok_or(ProviderError::NotStarted)?;
        let record = self
            .client
            .create_route(&self.route_for(website_addr, inbox))
            .await?;
        Ok(record.id)
    }
}
