use std::time::Duration;

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ProvisionedThroughput, ScalarAttributeType, TableStatus,
    TimeToLiveSpecification,
};
use tracing::{debug, info};

use crate::config::DynamoConfig;
use crate::item::{ADDRESS, ID, TTL};

const ACTIVE_POLL_INTERVAL: Duration = Duration::from_millis(500);
const ACTIVE_POLL_ATTEMPTS: u32 = 60;

fn throughput() -> ProvisionedThroughput {
    ProvisionedThroughput::builder()
        .read_capacity_units(5)
        .write_capacity_units(5)
        .build()
        .expect("valid throughput")
}

fn hash_key(name: &str) -> KeySchemaElement {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(KeyType::Hash)
        .build()
        .expect("valid key schema")
}

fn string_attribute(name: &str) -> AttributeDefinition {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .expect("valid attribute definition")
}

/// Create the inbox table programmatically.
///
/// The table is keyed by `id` (String) and carries a keys-only global
/// secondary index on `email_address`. Once the table is active, native TTL is
/// enabled on the `ttl` attribute so expired inboxes are reclaimed by the
/// storage engine.
///
/// This is intended for tests and local development. In production you would
/// typically provision the table via Infrastructure-as-Code tooling.
///
/// # Errors
///
/// Returns an error if the `CreateTable` call fails for reasons other than
/// the table already existing, or if enabling TTL fails.
pub async fn create_table(
    client: &Client,
    config: &DynamoConfig,
) -> Result<(), aws_sdk_dynamodb::Error> {
    let index = GlobalSecondaryIndex::builder()
        .index_name(&config.address_index)
        .key_schema(hash_key(ADDRESS))
        .projection(
            Projection::builder()
                .projection_type(ProjectionType::KeysOnly)
                .build(),
        )
        .provisioned_throughput(throughput())
        .build()
        .expect("valid index definition");

    let result = client
        .create_table()
        .table_name(&config.table_name)
        .key_schema(hash_key(ID))
        .attribute_definitions(string_attribute(ID))
        .attribute_definitions(string_attribute(ADDRESS))
        .global_secondary_indexes(index)
        .provisioned_throughput(throughput())
        .send()
        .await;

    if let Err(err) = result {
        // Tolerate "table already exists" errors so `create_table` is idempotent.
        let service_err = err.into_service_error();
        if service_err.is_resource_in_use_exception() {
            debug!(table = %config.table_name, "table already exists");
            return Ok(());
        }
        return Err(service_err.into());
    }

    wait_until_active(client, &config.table_name).await?;

    client
        .update_time_to_live()
        .table_name(&config.table_name)
        .time_to_live_specification(
            TimeToLiveSpecification::builder()
                .enabled(true)
                .attribute_name(TTL)
                .build()
                .expect("valid ttl specification"),
        )
        .send()
        .await?;

    info!(table = %config.table_name, "created inbox table");
    Ok(())
}

async fn wait_until_active(client: &Client, table_name: &str) -> Result<(), aws_sdk_dynamodb::Error> {
    for _ in 0..ACTIVE_POLL_ATTEMPTS {
        let output = client.describe_table().table_name(table_name).send().await?;
        if output
            .table()
            .and_then(|t| t.table_status())
            .is_some_and(|s| *s == TableStatus::Active)
        {
            return Ok(());
        }
        tokio::time::sleep(ACTIVE_POLL_INTERVAL).await;
    }
    debug!(table = %table_name, "table not active yet, continuing");
    Ok(())
}
