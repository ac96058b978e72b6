use std::time::Duration;

/// Configuration for the `DynamoDB` database backend.
#[derive(Debug, Clone)]
pub struct DynamoConfig {
    /// `DynamoDB` table name.
    pub table_name: String,

    /// AWS region (e.g. `"us-east-1"`).
    pub region: String,

    /// Optional endpoint URL for local development (e.g. `DynamoDB` Local).
    pub endpoint_url: Option<String>,

    /// Name of the global secondary index on `email_address`.
    pub address_index: String,

    /// Upper bound for a single SDK operation, retries included.
    pub operation_timeout: Duration,
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self {
            table_name: String::from("burner_inboxes"),
            region: String::from("us-east-1"),
            endpoint_url: None,
            address_index: String::from("email_address-index"),
            operation_timeout: Duration::from_secs(10),
        }
    }
}
