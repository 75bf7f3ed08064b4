//! Delete table operation.

use aws_sdk_dynamodb::Client;

use super::status_from_sdk;
use crate::errors::{Result, map_sdk_error};
use crate::types::TableStatus;

/// Delete a table and return the status reported by the endpoint.
pub async fn delete_table(client: &Client, table_name: &str) -> Result<TableStatus> {
    let output = client
        .delete_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(|e| map_sdk_error(e, table_name))?;

    status_from_sdk(
        output
            .table_description()
            .and_then(|desc| desc.table_status()),
        table_name,
    )
}
