use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::AttributeValue;

use burner_core::{Inbox, Message};
use burner_store::{Database, StoreError};

use crate::config::DynamoConfig;
use crate::item::{
    ADDRESS, FAILED, ID, MESSAGES, ROUTE_ID, TTL, inbox_from_item, inbox_to_item,
    message_from_attr, message_to_attr, messages_from_attr,
};

/// DynamoDB-backed implementation of [`Database`].
///
/// One item per inbox, keyed by `id`, with messages nested in a `messages`
/// map. Every mutation after the initial `PutItem` is an `UpdateItem` on a
/// single attribute path, so concurrent message arrivals and status changes
/// never overwrite each other. Address lookups go through a keys-only global
/// secondary index.
pub struct DynamoDatabase {
    client: Client,
    table_name: String,
    address_index: String,
    operation_timeout: Duration,
}

impl DynamoDatabase {
    /// Create a new `DynamoDatabase` from the provided configuration.
    ///
    /// Loads AWS credentials and configuration from the environment and
    /// optionally overrides the endpoint URL for local development.
    pub async fn new(config: &DynamoConfig) -> Self {
        let client = build_client(config).await;
        Self::from_client(client, config)
    }

    /// Create a new `DynamoDatabase` from an existing `DynamoDB` client.
    pub fn from_client(client: Client, config: &DynamoConfig) -> Self {
        Self {
            client,
            table_name: config.table_name.clone(),
            address_index: config.address_index.clone(),
            operation_timeout: config.operation_timeout,
        }
    }

    /// The underlying SDK client, e.g. for [`create_table`](crate::create_table).
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn sdk_error<E, R>(&self, err: &SdkError<E, R>) -> StoreError
    where
        E: std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        match err {
            SdkError::TimeoutError(_) => StoreError::Timeout(self.operation_timeout),
            SdkError::DispatchFailure(_) => {
                StoreError::Connection(DisplayErrorContext(err).to_string())
            }
            _ => StoreError::Backend(DisplayErrorContext(err).to_string()),
        }
    }

    /// Every inbox id indexed under `address`.
    async fn address_ids(&self, address: &str) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let mut query = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.address_index)
                .key_condition_expression("#A = :a")
                .expression_attribute_names("#A", ADDRESS)
                .expression_attribute_values(":a", AttributeValue::S(address.to_owned()));

            if let Some(key) = exclusive_start_key {
                query = query.set_exclusive_start_key(Some(key));
            }

            let response = query.send().await.map_err(|e| self.sdk_error(&e))?;

            ids.extend(response.items().iter().filter_map(|item| match item.get(ID) {
                Some(AttributeValue::S(id)) => Some(id.clone()),
                _ => None,
            }));

            exclusive_start_key = response.last_evaluated_key().cloned();
            if exclusive_start_key.is_none() {
                break;
            }
        }

        Ok(ids)
    }

    /// The inbox currently holding `address`.
    ///
    /// An expired inbox stays indexed until native TTL reclaims it, so a
    /// reused address can resolve to several items; the one with the latest
    /// TTL wins.
    async fn lookup_address(&self, address: &str) -> Result<Option<Inbox>, StoreError> {
        let mut current: Option<Inbox> = None;
        for id in self.address_ids(address).await? {
            let inbox = match self.get_inbox_by_id(&id).await {
                Ok(inbox) => inbox,
                // Reclaimed between the index query and the read.
                Err(StoreError::InboxNotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            if current.as_ref().is_none_or(|c| inbox.ttl > c.ttl) {
                current = Some(inbox);
            }
        }
        Ok(current)
    }

    /// Conditional partial update that fails with `InboxNotFound` instead of
    /// creating a stray item.
    async fn update_inbox(
        &self,
        inbox_id: &str,
        expression: &str,
        names: &[(&str, &str)],
        values: Vec<(&str, AttributeValue)>,
    ) -> Result<(), StoreError> {
        let mut update = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(ID, AttributeValue::S(inbox_id.to_owned()))
            .update_expression(expression)
            .condition_expression("attribute_exists(#ID)")
            .expression_attribute_names("#ID", ID);
        for (placeholder, name) in names {
            update = update.expression_attribute_names(*placeholder, *name);
        }
        for (placeholder, value) in values {
            update = update.expression_attribute_values(placeholder, value);
        }

        match update.send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                Err(StoreError::InboxNotFound(inbox_id.to_owned()))
            }
            Err(err) => Err(self.sdk_error(&err)),
        }
    }
}

#[async_trait]
impl Database for DynamoDatabase {
    async fn save_new_inbox(&self, inbox: &Inbox) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(inbox_to_item(inbox)))
            .send()
            .await
            .map_err(|e| self.sdk_error(&e))?;
        Ok(())
    }

    async fn get_inbox_by_id(&self, id: &str) -> Result<Inbox, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ID, AttributeValue::S(id.to_owned()))
            .projection_expression("#ID, #A, #T, #R, #F")
            .expression_attribute_names("#ID", ID)
            .expression_attribute_names("#A", ADDRESS)
            .expression_attribute_names("#T", TTL)
            .expression_attribute_names("#R", ROUTE_ID)
            .expression_attribute_names("#F", FAILED)
            .send()
            .await
            .map_err(|e| self.sdk_error(&e))?;

        match output.item() {
            Some(found) if !found.is_empty() => inbox_from_item(found),
            _ => Err(StoreError::InboxNotFound(id.to_owned())),
        }
    }

    async fn get_inbox_by_address(&self, address: &str) -> Result<Inbox, StoreError> {
        self.lookup_address(address)
            .await?
            .ok_or_else(|| StoreError::AddressNotFound(address.to_owned()))
    }

    async fn email_address_exists(&self, address: &str) -> Result<bool, StoreError> {
        Ok(!self.address_ids(address).await?.is_empty())
    }

    async fn set_inbox_created(&self, inbox: &Inbox) -> Result<(), StoreError> {
        self.update_inbox(
            &inbox.id,
            "SET #F = :f, #R = :r",
            &[("#F", FAILED), ("#R", ROUTE_ID)],
            vec![
                (":f", AttributeValue::Bool(false)),
                (
                    ":r",
                    AttributeValue::S(inbox.email_provider_route_id.clone()),
                ),
            ],
        )
        .await
    }

    async fn set_inbox_failed(&self, inbox: &Inbox) -> Result<(), StoreError> {
        self.update_inbox(
            &inbox.id,
            "SET #F = :f",
            &[("#F", FAILED)],
            vec![(":f", AttributeValue::Bool(true))],
        )
        .await
    }

    async fn save_new_message(&self, message: &Message) -> Result<(), StoreError> {
        self.update_inbox(
            &message.inbox_id,
            "SET #M.#MID = :m",
            &[("#M", MESSAGES), ("#MID", message.id.as_str())],
            vec![(":m", message_to_attr(message))],
        )
        .await
    }

    async fn get_messages_by_inbox_id(&self, inbox_id: &str) -> Result<Vec<Message>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ID, AttributeValue::S(inbox_id.to_owned()))
            .projection_expression("#M")
            .expression_attribute_names("#M", MESSAGES)
            .send()
            .await
            .map_err(|e| self.sdk_error(&e))?;

        let found = output
            .item()
            .ok_or_else(|| StoreError::InboxNotFound(inbox_id.to_owned()))?;
        messages_from_attr(found.get(MESSAGES))
    }

    async fn get_message_by_id(
        &self,
        inbox_id: &str,
        message_id: &str,
    ) -> Result<Message, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(ID, AttributeValue::S(inbox_id.to_owned()))
            .projection_expression("#M.#MID")
            .expression_attribute_names("#M", MESSAGES)
            .expression_attribute_names("#MID", message_id)
            .send()
            .await
            .map_err(|e| self.sdk_error(&e))?;

        let not_found = || StoreError::MessageNotFound {
            inbox_id: inbox_id.to_owned(),
            message_id: message_id.to_owned(),
        };
        let found = output
            .item()
            .ok_or_else(|| StoreError::InboxNotFound(inbox_id.to_owned()))?;
        let value = match found.get(MESSAGES) {
            Some(AttributeValue::M(messages)) => messages.get(message_id).ok_or_else(not_found)?,
            _ => return Err(not_found()),
        };
        message_from_attr(value)
    }
}

/// Build an AWS `DynamoDB` [`Client`] from the provided configuration.
///
/// Uses the standard AWS SDK environment credential chain and optionally
/// overrides the endpoint URL for local development.
pub async fn build_client(config: &DynamoConfig) -> Client {
    let mut aws_config = aws_config::from_env()
        .region(aws_config::Region::new(config.region.clone()))
        .timeout_config(
            aws_config::timeout::TimeoutConfig::builder()
                .operation_timeout(config.operation_timeout)
                .build(),
        );

    if let Some(endpoint) = &config.endpoint_url {
        aws_config = aws_config.endpoint_url(endpoint);
    }

    let sdk_config = aws_config.load().await;
    Client::new(&sdk_config)
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;
    use crate::table::create_table;

    fn test_config() -> DynamoConfig {
        DynamoConfig {
            table_name: std::env::var("DYNAMODB_TABLE")
                .unwrap_or_else(|_| format!("burner_test_{}", uuid::Uuid::new_v4().simple())),
            endpoint_url: Some(
                std::env::var("DYNAMODB_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:8000".to_owned()),
            ),
            ..DynamoConfig::default()
        }
    }

    async fn database() -> DynamoDatabase {
        let config = test_config();
        let db = DynamoDatabase::new(&config).await;
        create_table(db.client(), &config)
            .await
            .expect("table creation should succeed");
        db
    }

    #[tokio::test]
    async fn database_conformance() {
        let db = database().await;
        burner_store::testing::run_database_conformance_tests(&db)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn message_for_unknown_inbox_is_rejected() {
        let db = database().await;
        let message = Message {
            id: "m1".into(),
            inbox_id: uuid::Uuid::new_v4().to_string(),
            email_provider_id: "<m1@relay>".into(),
            received_at: 1,
            ttl: 2,
            sender: "a@b.c".into(),
            from: "a@b.c".into(),
            subject: "orphan".into(),
            body_plain: String::new(),
            body_html: None,
        };
        let err = db.save_new_message(&message).await.unwrap_err();
        assert!(matches!(err, StoreError::InboxNotFound(_)));
    }

    #[tokio::test]
    async fn create_table_is_idempotent() {
        let config = test_config();
        let db = DynamoDatabase::new(&config).await;
        create_table(db.client(), &config).await.unwrap();
        create_table(db.client(), &config).await.unwrap();
    }
}
