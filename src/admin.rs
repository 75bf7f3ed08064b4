//! Table administration seam.
//!
//! The reconciliation engine talks to a [`TableAdmin`] and does not care
//! whether tables live in this process or behind a DynamoDB endpoint.
//! - `TableRegistry` - direct, in-process calls
//! - `SdkTableAdmin` - the AWS SDK against any DynamoDB-compatible endpoint

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;

use crate::errors::{Error, Result};
use crate::registry::TableRegistry;
use crate::table_operations;
use crate::types::{TableDefinition, TableStatus};

/// Interval between status checks while waiting for a table.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[async_trait]
pub trait TableAdmin: Send + Sync {
    /// Every table name, sorted.
    async fn list_tables(&self) -> Result<Vec<String>>;

    async fn create_table(&self, definition: &TableDefinition) -> Result<TableStatus>;

    async fn describe_table(&self, name: &str) -> Result<TableStatus>;

    async fn delete_table(&self, name: &str) -> Result<TableStatus>;

    /// Poll until the table is ACTIVE, failing with `Timeout` after `timeout`.
    async fn wait_for_active(&self, name: &str, timeout: Duration) -> Result<()> {
        let poll = async {
            loop {
                if self.describe_table(name).await? == TableStatus::Active {
                    return Ok::<(), Error>(());
                }
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| Error::Timeout {
                table_name: name.to_string(),
                after: timeout,
            })?
    }
}

#[async_trait]
impl TableAdmin for TableRegistry {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(TableRegistry::list_tables(self))
    }

    async fn create_table(&self, definition: &TableDefinition) -> Result<TableStatus> {
        TableRegistry::create_table(self, definition.clone()).map(|record| record.status)
    }

    async fn describe_table(&self, name: &str) -> Result<TableStatus> {
        TableRegistry::describe_table(self, name).map(|record| record.status)
    }

    async fn delete_table(&self, name: &str) -> Result<TableStatus> {
        TableRegistry::delete_table(self, name).map(|record| record.status)
    }
}

/// [`TableAdmin`] backed by an AWS SDK DynamoDB client.
#[derive(Debug, Clone)]
pub struct SdkTableAdmin {
    client: Client,
}

impl SdkTableAdmin {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl TableAdmin for SdkTableAdmin {
    async fn list_tables(&self) -> Result<Vec<String>> {
        table_operations::list_table_names(&self.client).await
    }

    async fn create_table(&self, definition: &TableDefinition) -> Result<TableStatus> {
        table_operations::create_table(&self.client, definition).await
    }

    async fn describe_table(&self, name: &str) -> Result<TableStatus> {
        table_operations::describe_table_status(&self.client, name).await
    }

    async fn delete_table(&self, name: &str) -> Result<TableStatus> {
        table_operations::delete_table(&self.client, name).await
    }

    async fn wait_for_active(&self, name: &str, timeout: Duration) -> Result<()> {
        table_operations::wait_for_table_active(&self.client, name, timeout).await
    }
}
