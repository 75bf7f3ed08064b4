//! Table existence and status checks.

use aws_sdk_dynamodb::Client;

use super::status_from_sdk;
use crate::errors::{Error, Result, map_sdk_error};
use crate::types::TableStatus;

pub async fn describe_table_status(client: &Client, table_name: &str) -> Result<TableStatus> {
    let output = client
        .describe_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(|e| map_sdk_error(e, table_name))?;

    status_from_sdk(output.table().and_then(|t| t.table_status()), table_name)
}

/// Check if a table exists. A missing table is `Ok(false)`, not an error.
pub async fn table_exists(client: &Client, table_name: &str) -> Result<bool> {
    match describe_table_status(client, table_name).await {
        Ok(_) => Ok(true),
        Err(Error::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
