//! Inbox creation and read access.
//!
//! Creation persists the inbox in its pending shape, registers the
//! provider-side forwarding route, and records exactly one of the two
//! outcomes. A registration failure is not an API error: the caller gets the
//! inbox back marked failed.

use std::sync::Arc;
use std::time::Duration;

use burner_core::{Inbox, Message, generate_id, received_details_at};
use burner_provider::EmailProvider;
use burner_store::{Database, StoreError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::error::ServerError;

const MAX_LOCAL_PART_LEN: usize = 64;
const GENERATED_LOCAL_PART_LEN: usize = 12;

/// Optional address requested by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateInboxRequest {
    /// Local part of a custom address, e.g. `"alice"`.
    pub local_part: Option<String>,
    /// Domain of a custom address; must be one of the configured domains.
    pub domain: Option<String>,
}

/// A message together with its relative receipt time.
#[derive(Debug, Clone, Serialize)]
pub struct MessageSummary {
    #[serde(flatten)]
    pub message: Message,
    /// Human-readable age such as `"5m ago"`.
    pub received: String,
}

/// Settings for [`InboxService`].
#[derive(Debug, Clone)]
pub struct InboxSettings {
    /// Allowed domains; the first is used for generated addresses.
    pub domains: Vec<String>,
    /// Lifetime of a new inbox.
    pub ttl: Duration,
    /// Random address attempts before giving up.
    pub max_address_attempts: u32,
}

/// Inbox lifecycle operations backed by a [`Database`] and an
/// [`EmailProvider`].
pub struct InboxService {
    database: Arc<dyn Database>,
    provider: Arc<dyn EmailProvider>,
    settings: InboxSettings,
}

impl InboxService {
    pub fn new(
        database: Arc<dyn Database>,
        provider: Arc<dyn EmailProvider>,
        settings: InboxSettings,
    ) -> Self {
        Self {
            database,
            provider,
            settings,
        }
    }

    /// Create an inbox and register its forwarding route.
    #[instrument(skip(self, request), fields(provider = %self.provider.name()))]
    pub async fn create_inbox(&self, request: &CreateInboxRequest) -> Result<Inbox, ServerError> {
        self.create_inbox_at(request, chrono::Utc::now().timestamp())
            .await
    }

    /// [`create_inbox`](Self::create_inbox) with a fixed clock.
    pub async fn create_inbox_at(
        &self,
        request: &CreateInboxRequest,
        now: i64,
    ) -> Result<Inbox, ServerError> {
        let address = match &request.local_part {
            Some(local_part) => {
                let address = self.custom_address(local_part, request.domain.as_deref())?;
                self.ensure_reusable(&address, now).await?;
                address
            }
            None => self.random_address().await?,
        };

        let mut inbox = Inbox::new();
        inbox.id = generate_id();
        inbox.address = address;
        let ttl = i64::try_from(self.settings.ttl.as_secs()).unwrap_or(i64::MAX);
        inbox.ttl = now.saturating_add(ttl);
        self.database.save_new_inbox(&inbox).await?;

        match self.provider.register_route(&inbox).await {
            Ok(route_id) => {
                inbox.email_provider_route_id = route_id;
                self.database.set_inbox_created(&inbox).await?;
                info!(
                    inbox_id = %inbox.id,
                    address = %inbox.address,
                    route_id = %inbox.email_provider_route_id,
                    "inbox created"
                );
            }
            Err(e) => {
                error!(
                    inbox_id = %inbox.id,
                    address = %inbox.address,
                    error = %e,
                    "route registration failed, marking inbox failed"
                );
                inbox.failed_to_create = true;
                self.database.set_inbox_failed(&inbox).await?;
            }
        }
        Ok(inbox)
    }

    pub async fn get_inbox(&self, id: &str) -> Result<Inbox, ServerError> {
        Ok(self.database.get_inbox_by_id(id).await?)
    }

    /// Messages of an inbox, newest first, each with its relative age.
    pub async fn list_messages(&self, inbox_id: &str) -> Result<Vec<MessageSummary>, ServerError> {
        self.list_messages_at(inbox_id, chrono::Utc::now().timestamp())
            .await
    }

    /// [`list_messages`](Self::list_messages) with a fixed clock.
    pub async fn list_messages_at(
        &self,
        inbox_id: &str,
        now: i64,
    ) -> Result<Vec<MessageSummary>, ServerError> {
        // Resolve the inbox first so an unknown id is a 404, not an empty list.
        self.database.get_inbox_by_id(inbox_id).await?;

        let mut messages = self.database.get_messages_by_inbox_id(inbox_id).await?;
        messages.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        let received = received_details_at(&messages, now);

        Ok(messages
            .into_iter()
            .zip(received)
            .map(|(message, received)| MessageSummary { message, received })
            .collect())
    }

    pub async fn get_message(&self, inbox_id: &str, message_id: &str) -> Result<Message, ServerError> {
        Ok(self.database.get_message_by_id(inbox_id, message_id).await?)
    }

    fn custom_address(&self, local_part: &str, domain: Option<&str>) -> Result<String, ServerError> {
        let local_part = local_part.trim().to_ascii_lowercase();
        if !is_valid_local_part(&local_part) {
            return Err(ServerError::InvalidRequest(format!(
                "local part must be 1-{MAX_LOCAL_PART_LEN} characters of a-z, 0-9, '.', '_' or '-'"
            )));
        }

        let domain = match domain {
            Some(domain) => {
                let domain = domain.trim().to_ascii_lowercase();
                if !self.settings.domains.contains(&domain) {
                    return Err(ServerError::InvalidRequest(format!(
                        "domain not served: {domain}"
                    )));
                }
                domain
            }
            None => self.default_domain()?.to_owned(),
        };
        Ok(format!("{local_part}@{domain}"))
    }

    /// A custom address may be taken over once its previous inbox expired.
    async fn ensure_reusable(&self, address: &str, now: i64) -> Result<(), ServerError> {
        match self.database.get_inbox_by_address(address).await {
            Ok(existing) if existing.is_expired(now) => {
                info!(address, previous_inbox = %existing.id, "reusing expired address");
                Ok(())
            }
            Ok(_) => Err(ServerError::AddressTaken(address.to_owned())),
            Err(StoreError::AddressNotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn random_address(&self) -> Result<String, ServerError> {
        let domain = self.default_domain()?;
        for attempt in 1..=self.settings.max_address_attempts {
            let address = format!("{}@{domain}", random_local_part());
            if !self.database.email_address_exists(&address).await? {
                return Ok(address);
            }
            warn!(attempt, address = %address, "generated address already in use");
        }
        Err(ServerError::AddressExhausted(
            self.settings.max_address_attempts,
        ))
    }

    fn default_domain(&self) -> Result<&str, ServerError> {
        self.settings
            .domains
            .first()
            .map(String::as_str)
            .ok_or_else(|| ServerError::Config("no inbox domain configured".into()))
    }
}

fn random_local_part() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(GENERATED_LOCAL_PART_LEN);
    id
}

fn is_valid_local_part(local_part: &str) -> bool {
    (1..=MAX_LOCAL_PART_LEN).contains(&local_part.len())
        && local_part
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'.' | b'_' | b'-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_part_validation() {
        assert!(is_valid_local_part("alice"));
        assert!(is_valid_local_part("a.b_c-9"));
        assert!(!is_valid_local_part(""));
        assert!(!is_valid_local_part("Alice"));
        assert!(!is_valid_local_part("a b"));
        assert!(!is_valid_local_part("a@b"));
        assert!(!is_valid_local_part(&"a".repeat(65)));
        assert!(is_valid_local_part(&"a".repeat(64)));
    }

    #[test]
    fn random_local_part_shape() {
        let local = random_local_part();
        assert_eq!(local.len(), GENERATED_LOCAL_PART_LEN);
        assert!(is_valid_local_part(&local));
        assert_ne!(random_local_part(), local);
    }
}
