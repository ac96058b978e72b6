use async_trait::async_trait;

use burner_core::{Inbox, Message};

use crate::error::StoreError;

/// Trait for persisting inboxes and their messages.
///
/// Implementations must be `Send + Sync` and safe for concurrent access from
/// any number of request handlers plus the background sweeper.
///
/// Status transitions and message inserts are partial updates: they must never
/// read a whole inbox, mutate it in memory, and write it back. Two messages
/// arriving for the same inbox at the same time must both survive.
#[async_trait]
pub trait Database: Send + Sync {
    /// Persist a new inbox together with an empty message collection.
    ///
    /// Address uniqueness is not checked here; see
    /// [`email_address_exists`](Self::email_address_exists).
    async fn save_new_inbox(&self, inbox: &Inbox) -> Result<(), StoreError>;

    /// Point lookup by inbox id.
    ///
    /// Returns [`StoreError::InboxNotFound`] when no such inbox exists.
    async fn get_inbox_by_id(&self, id: &str) -> Result<Inbox, StoreError>;

    /// Resolve an address through the secondary lookup, then fetch the inbox.
    ///
    /// Returns [`StoreError::AddressNotFound`] when the lookup yields no match.
    async fn get_inbox_by_address(&self, address: &str) -> Result<Inbox, StoreError>;

    /// Whether any inbox is currently assigned the given address.
    async fn email_address_exists(&self, address: &str) -> Result<bool, StoreError>;

    /// Mark the inbox as created with its current provider route id.
    ///
    /// Only `failed_to_create` and the route id are written; idempotent.
    async fn set_inbox_created(&self, inbox: &Inbox) -> Result<(), StoreError>;

    /// Mark the inbox as failed. Only `failed_to_create` is written.
    async fn set_inbox_failed(&self, inbox: &Inbox) -> Result<(), StoreError>;

    /// Insert a message into its owning inbox's collection, keyed by message id.
    async fn save_new_message(&self, message: &Message) -> Result<(), StoreError>;

    /// All messages of an inbox, in no particular order. Empty when there are none.
    async fn get_messages_by_inbox_id(&self, inbox_id: &str) -> Result<Vec<Message>, StoreError>;

    /// Point lookup of a single message.
    ///
    /// Returns [`StoreError::MessageNotFound`] when the inbox has no message
    /// with this id.
    async fn get_message_by_id(
        &self,
        inbox_id: &str,
        message_id: &str,
    ) -> Result<Message, StoreError>;
}
