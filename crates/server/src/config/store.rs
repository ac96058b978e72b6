use serde::Deserialize;

/// Configuration for the inbox database backend.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Which backend to use: `"memory"` or `"dynamodb"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// `DynamoDB` table name. Defaults to `"burner_inboxes"`.
    pub table_name: Option<String>,

    /// AWS region for the `DynamoDB` backend.
    pub region: Option<String>,

    /// Endpoint override for `DynamoDB` Local.
    pub endpoint_url: Option<String>,

    /// Create the table (and its address index) on startup if missing.
    #[serde(default)]
    pub create_table: bool,

    /// Upper bound for a single storage call, in seconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            table_name: None,
            region: None,
            endpoint_url: None,
            create_table: false,
            operation_timeout_seconds: default_operation_timeout(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_operation_timeout() -> u64 {
    10
}
