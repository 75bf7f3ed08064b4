//! List tables operation.

use aws_sdk_dynamodb::Client;

use crate::errors::{Result, map_sdk_error};

/// Every table name on the endpoint, following pagination to the end.
pub async fn list_table_names(client: &Client) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut start: Option<String> = None;

    loop {
        let output = client
            .list_tables()
            .set_exclusive_start_table_name(start.take())
            .send()
            .await
            .map_err(|e| map_sdk_error(e, ""))?;

        names.extend(output.table_names().iter().cloned());

        match output.last_evaluated_table_name() {
            Some(last) => start = Some(last.to_string()),
            None => break,
        }
    }

    Ok(names)
}
