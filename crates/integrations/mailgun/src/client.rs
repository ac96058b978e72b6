use std::time::Duration;

use async_trait::async_trait;
use burner_provider::{ProviderError, Route, RouteClient};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::MailgunConfig;
use crate::error::MailgunError;

/// A route to create, as sent to `POST /routes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoute {
    pub priority: u32,
    pub description: String,
    pub expression: String,
    pub actions: Vec<String>,
}

/// A route as returned by the Mailgun API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteRecord {
    pub id: String,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Deserialize)]
struct CreateRouteResponse {
    route: RouteRecord,
}

#[derive(Deserialize)]
struct ListRoutesResponse {
    #[serde(default)]
    items: Vec<RouteRecord>,
}

/// Thin client for the Mailgun routes API.
///
/// Authenticates with HTTP basic auth (`api:{api_key}`) and treats any
/// non-2xx answer as a [`MailgunError::UnexpectedStatus`].
pub struct MailgunClient {
    client: Client,
    api_base: String,
    api_key: String,
    timeout: Duration,
}

impl MailgunClient {
    /// Create a client with a `reqwest::Client` carrying the configured
    /// timeout.
    pub fn new(config: &MailgunConfig) -> Result<Self, MailgunError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(config: &MailgunConfig, client: Client) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, MailgunError> {
        let response = request
            .basic_auth("api", Some(&self.api_key))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!("mailgun request timed out");
                    MailgunError::Timeout(self.timeout)
                } else {
                    MailgunError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailgunError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Create a route and return the stored record.
    #[instrument(skip(self, route), fields(expression = %route.expression))]
    pub async fn create_route(&self, route: &NewRoute) -> Result<RouteRecord, MailgunError> {
        let mut form: Vec<(&str, String)> = vec![
            ("priority", route.priority.to_string()),
            ("description", route.description.clone()),
            ("expression", route.expression.clone()),
        ];
        form.extend(route.actions.iter().map(|a| ("action", a.clone())));

        let response = self
            .send(self.client.post(self.url("routes")).form(&form))
            .await?;
        let body: CreateRouteResponse = response
            .json()
            .await
            .map_err(|e| MailgunError::InvalidResponse(e.to_string()))?;

        debug!(route_id = %body.route.id, "created mailgun route");
        Ok(body.route)
    }

    async fn fetch_routes(&self, limit: usize, skip: usize) -> Result<Vec<RouteRecord>, MailgunError> {
        let response = self
            .send(
                self.client
                    .get(self.url("routes"))
                    .query(&[("limit", limit), ("skip", skip)]),
            )
            .await?;
        let body: ListRoutesResponse = response
            .json()
            .await
            .map_err(|e| MailgunError::InvalidResponse(e.to_string()))?;
        Ok(body.items)
    }

    async fn remove_route(&self, id: &str) -> Result<(), MailgunError> {
        self.send(self.client.delete(self.url(&format!("routes/{id}"))))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RouteClient for MailgunClient {
    async fn list_routes(&self, limit: usize, skip: usize) -> Result<Vec<Route>, ProviderError> {
        let records = self.fetch_routes(limit, skip).await?;
        Ok(records
            .into_iter()
            .map(|r| Route {
                id: r.id,
                description: r.description,
            })
            .collect())
    }

    async fn delete_route(&self, id: &str) -> Result<(), ProviderError> {
        self.remove_route(id).await?;
        Ok(())
    }
}
