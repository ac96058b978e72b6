use serde::{Deserialize, Serialize};

/// Route id placeholder for an inbox whose forwarding rule has not been
/// registered with the mail provider yet.
pub const UNREGISTERED_ROUTE_ID: &str = "-";

/// A disposable inbox.
///
/// Inboxes are persisted once in their pending shape, then transitioned
/// exactly once to either created (the provider route id is known) or failed.
/// After that the record is only touched by message insertion until the
/// storage engine reclaims it past its TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbox {
    /// Unique inbox identifier (UUID-v4, assigned on creation).
    pub id: String,

    /// Email address served by this inbox.
    #[serde(rename = "email_address")]
    pub address: String,

    /// Absolute expiry instant in epoch seconds.
    pub ttl: i64,

    /// Identifier of the provider-side forwarding rule, or
    /// [`UNREGISTERED_ROUTE_ID`] while registration is pending.
    #[serde(rename = "ep_routeid")]
    pub email_provider_route_id: String,

    /// Whether route registration with the provider failed.
    pub failed_to_create: bool,
}

/// Coarse lifecycle state of an [`Inbox`], derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxStatus {
    /// Persisted, provider route not registered yet.
    Pending,
    /// Provider route registered; mail will be delivered.
    Created,
    /// Provider route registration failed; no mail will arrive.
    Failed,
}

impl Inbox {
    /// Create an inbox in its pending shape.
    ///
    /// `id`, `address` and `ttl` are left empty for the caller to fill in
    /// before the inbox is persisted.
    pub fn new() -> Self {
        Self {
            id: String::new(),
            address: String::new(),
            ttl: 0,
            email_provider_route_id: UNREGISTERED_ROUTE_ID.to_owned(),
            failed_to_create: false,
        }
    }

    /// Returns `true` once `now` (epoch seconds) has reached the inbox TTL.
    pub fn is_expired(&self, now: i64) -> bool {
        self.ttl <= now
    }

    /// Current lifecycle state.
    pub fn status(&self) -> InboxStatus {
        if self.failed_to_create {
            InboxStatus::Failed
        } else if self.email_provider_route_id == UNREGISTERED_ROUTE_ID {
            InboxStatus::Pending
        } else {
            InboxStatus::Created
        }
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Create an inbox in its pending shape. See [`Inbox::new`].
pub fn new_inbox() -> Inbox {
    Inbox::new()
}
