//! Reclamation of expired provider forwarding rules.
//!
//! Local storage and the relay share no transaction, so inbox expiry on the
//! storage side says nothing about the relay's routes. The sweeper closes that
//! gap: it periodically lists every route, decodes the TTL tagged into its
//! description, and deletes the routes whose TTL has passed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ProviderError;
use crate::route::decode_route_ttl;

/// A forwarding rule as listed by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Route {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

/// Minimal route management surface the sweeper needs.
#[async_trait]
pub trait RouteClient: Send + Sync {
    /// One page of routes, starting at offset `skip`.
    async fn list_routes(&self, limit: usize, skip: usize) -> Result<Vec<Route>, ProviderError>;

    async fn delete_route(&self, id: &str) -> Result<(), ProviderError>;
}

/// Timing and paging knobs for [`RouteSweeper`].
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Time between sweeps.
    pub interval: Duration,
    /// Routes requested per list call.
    pub page_size: usize,
    /// Upper bound for each individual remote call.
    pub call_timeout: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            page_size: 1000,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: usize,
    pub malformed: usize,
    pub failed: usize,
    pub retained: usize,
}

/// Periodically deletes forwarding rules whose tagged TTL has passed.
pub struct RouteSweeper {
    client: Arc<dyn RouteClient>,
    config: SweeperConfig,
}

impl RouteSweeper {
    pub fn new(client: Arc<dyn RouteClient>, config: SweeperConfig) -> Self {
        Self { client, config }
    }

    /// Run a single pass against the clock value `now` (epoch seconds).
    ///
    /// All pages are collected before anything is deleted so deletions cannot
    /// shift later pages. A failed list call aborts the pass; a malformed
    /// description or a failed delete only affects that route.
    pub async fn sweep_once(&self, now: i64) -> Result<SweepReport, ProviderError> {
        let routes = self.list_all().await?;
        let mut report = SweepReport::default();

        for route in &routes {
            let ttl = match decode_route_ttl(&route.description) {
                Ok(ttl) => ttl,
                Err(e) => {
                    warn!(
                        route_id = %route.id,
                        description = %route.description,
                        error = %e,
                        "skipping route with undecodable ttl"
                    );
                    report.malformed += 1;
                    continue;
                }
            };

            if ttl >= now {
                report.retained += 1;
                continue;
            }

            match self.bounded(self.client.delete_route(&route.id)).await {
                Ok(()) => {
                    debug!(route_id = %route.id, ttl, "deleted expired route");
                    report.deleted += 1;
                }
                Err(e) => {
                    error!(route_id = %route.id, error = %e, "error deleting expired route");
                    report.failed += 1;
                }
            }
        }

        info!(
            listed = routes.len(),
            deleted = report.deleted,
            malformed = report.malformed,
            failed = report.failed,
            retained = report.retained,
            "route sweep complete"
        );
        Ok(report)
    }

    /// Sweep every `interval` until `shutdown` is cancelled.
    ///
    /// The first sweep runs immediately. Errors are logged, never returned.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "route sweeper starting"
        );
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("route sweeper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let now = chrono::Utc::now().timestamp();
                    tokio::select! {
                        () = shutdown.cancelled() => {
                            info!("route sweeper interrupted mid-pass");
                            break;
                        }
                        result = self.sweep_once(now) => {
                            if let Err(e) = result {
                                error!(error = %e, "error listing routes, sweep aborted");
                            }
                        }
                    }
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn list_all(&self) -> Result<Vec<Route>, ProviderError> {
        let page_size = self.config.page_size;
        let mut routes = Vec::new();
        loop {
            let page = self
                .bounded(self.client.list_routes(page_size, routes.len()))
                .await?;
            let last = page.is_empty() || page.len() < page_size;
            routes.extend(page);
            if last {
                return Ok(routes);
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        let limit = self.config.call_timeout;
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| ProviderError::Timeout(limit))?
    }
}
