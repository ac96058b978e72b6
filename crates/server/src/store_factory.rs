use std::sync::Arc;
use std::time::Duration;

use burner_store::Database;
use burner_store_dynamodb::{DynamoConfig, DynamoDatabase, build_client, create_table};
use burner_store_memory::MemoryDatabase;
use tracing::info;

use crate::config::StoreConfig;
use crate::error::ServerError;

/// Create the inbox database from the given configuration.
pub async fn create_database(config: &StoreConfig) -> Result<Arc<dyn Database>, ServerError> {
    let database: Arc<dyn Database> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryDatabase::new()),
        "dynamodb" => {
            let defaults = DynamoConfig::default();
            let dynamo_config = DynamoConfig {
                table_name: config.table_name.clone().unwrap_or(defaults.table_name),
                region: config.region.clone().unwrap_or(defaults.region),
                endpoint_url: config.endpoint_url.clone(),
                address_index: defaults.address_index,
                operation_timeout: Duration::from_secs(config.operation_timeout_seconds),
            };

            let client = build_client(&dynamo_config).await;
            if config.create_table {
                create_table(&client, &dynamo_config)
                    .await
                    .map_err(|e| ServerError::Config(format!("dynamodb table creation: {e}")))?;
            }

            Arc::new(DynamoDatabase::from_client(client, &dynamo_config))
        }
        other => {
            return Err(ServerError::Config(format!(
                "unknown store backend: {other}"
            )));
        }
    };

    info!(backend = %config.backend, "inbox database ready");
    Ok(database)
}
