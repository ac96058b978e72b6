use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use dashmap::DashMap;

use burner_core::{Inbox, Message};
use burner_store::{Database, StoreError};

/// A stored inbox and its nested message map.
#[derive(Debug, Clone)]
struct InboxRecord {
    inbox: Inbox,
    messages: HashMap<String, Message>,
}

/// In-memory [`Database`] backed by [`DashMap`]s.
///
/// Every write happens under the shard guard of the inbox entry it touches, so
/// status transitions and message inserts are point updates and concurrent
/// writers never overwrite each other. Records are kept for the lifetime of
/// the process.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    inboxes: DashMap<String, InboxRecord>,
    /// Secondary index: address -> inbox ids.
    addresses: DashMap<String, BTreeSet<String>>,
}

impl MemoryDatabase {
    /// Create a new, empty in-memory database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored inboxes.
    pub fn inbox_count(&self) -> usize {
        self.inboxes.len()
    }

    /// The inbox currently holding `address`: the one expiring last when an
    /// expired inbox's address has been reassigned.
    fn lookup_address(&self, address: &str) -> Option<String> {
        let ids = self.addresses.get(address)?;
        ids.iter()
            .max_by_key(|id| {
                self.inboxes
                    .get(id.as_str())
                    .map_or(i64::MIN, |record| record.inbox.ttl)
            })
            .cloned()
    }

    fn unindex(&self, address: &str, id: &str) {
        if let Some(mut ids) = self.addresses.get_mut(address) {
            ids.remove(id);
        }
        self.addresses.remove_if(address, |_, ids| ids.is_empty());
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn save_new_inbox(&self, inbox: &Inbox) -> Result<(), StoreError> {
        let previous = self.inboxes.insert(
            inbox.id.clone(),
            InboxRecord {
                inbox: inbox.clone(),
                messages: HashMap::new(),
            },
        );

        // A put replaces the whole record; drop the old index entry if the
        // address changed.
        if let Some(prev) = previous
            && prev.inbox.address != inbox.address
        {
            self.unindex(&prev.inbox.address, &inbox.id);
        }

        self.addresses
            .entry(inbox.address.clone())
            .or_default()
            .insert(inbox.id.clone());
        Ok(())
    }

    async fn get_inbox_by_id(&self, id: &str) -> Result<Inbox, StoreError> {
        self.inboxes
            .get(id)
            .map(|record| record.inbox.clone())
            .ok_or_else(|| StoreError::InboxNotFound(id.to_owned()))
    }

    async fn get_inbox_by_address(&self, address: &str) -> Result<Inbox, StoreError> {
        let id = self
            .lookup_address(address)
            .ok_or_else(|| StoreError::AddressNotFound(address.to_owned()))?;
        self.get_inbox_by_id(&id).await
    }

    async fn email_address_exists(&self, address: &str) -> Result<bool, StoreError> {
        Ok(self.lookup_address(address).is_some())
    }

    async fn set_inbox_created(&self, inbox: &Inbox) -> Result<(), StoreError> {
        let mut record = self
            .inboxes
            .get_mut(&inbox.id)
            .ok_or_else(|| StoreError::InboxNotFound(inbox.id.clone()))?;
        record.inbox.failed_to_create = false;
        record
            .inbox
            .email_provider_route_id
            .clone_from(&inbox.email_provider_route_id);
        Ok(())
    }

    async fn set_inbox_failed(&self, inbox: &Inbox) -> Result<(), StoreError> {
        let mut record = self
            .inboxes
            .get_mut(&inbox.id)
            .ok_or_else(|| StoreError::InboxNotFound(inbox.id.clone()))?;
        record.inbox.failed_to_create = true;
        Ok(())
    }

    async fn save_new_message(&self, message: &Message) -> Result<(), StoreError> {
        let mut record = self
            .inboxes
            .get_mut(&message.inbox_id)
            .ok_or_else(|| StoreError::InboxNotFound(message.inbox_id.clone()))?;
        record
            .messages
            .insert(message.id.clone(), message.clone());
        Ok(())
    }

    async fn get_messages_by_inbox_id(&self, inbox_id: &str) -> Result<Vec<Message>, StoreError> {
        let record = self
            .inboxes
            .get(inbox_id)
            .ok_or_else(|| StoreError::InboxNotFound(inbox_id.to_owned()))?;
        Ok(record.messages.values().cloned().collect())
    }

    async fn get_message_by_id(
        &self,
        inbox_id: &str,
        message_id: &str,
    ) -> Result<Message, StoreError> {
        let record = self
            .inboxes
            .get(inbox_id)
            .ok_or_else(|| StoreError::InboxNotFound(inbox_id.to_owned()))?;
        record
            .messages
            .get(message_id)
            .cloned()
            .ok_or_else(|| StoreError::MessageNotFound {
                inbox_id: inbox_id.to_owned(),
                message_id: message_id.to_owned(),
            })
    }
}
