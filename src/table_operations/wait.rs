//! Wait for table to become active.

use std::time::Duration;

use aws_sdk_dynamodb::Client;
use tracing::debug;

use super::exists::describe_table_status;
use crate::admin::WAIT_POLL_INTERVAL;
use crate::errors::{Error, Result};
use crate::types::TableStatus;

/// Poll `DescribeTable` until the table is ACTIVE.
///
/// A missing table fails immediately with `NotFound`. Runs out of time with
/// `Timeout`.
pub async fn wait_for_table_active(
    client: &Client,
    table_name: &str,
    timeout: Duration,
) -> Result<()> {
    let poll = async {
        loop {
            let status = describe_table_status(client, table_name).await?;
            if status == TableStatus::Active {
                return Ok::<(), Error>(());
            }
            debug!(table = table_name, status = %status, "waiting for table");
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    };

    tokio::time::timeout(timeout, poll)
        .await
        .map_err(|_| Error::Timeout {
            table_name: table_name.to_string(),
            after: timeout,
        })?
}
