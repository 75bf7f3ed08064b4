//! Table management operations through the AWS SDK.
//!
//! These run against any DynamoDB-compatible endpoint, including the local
//! registry server:
//! - `create` - Create a table from a `TableDefinition`
//! - `delete` - Delete a table
//! - `exists` - Describe a table's status / check if it exists
//! - `list` - List every table name, following pagination
//! - `wait` - Wait for a table to become active
//! - `gsi` / `lsi` - Secondary index conversion

mod create;
mod delete;
mod exists;
mod gsi;
mod list;
mod lsi;
mod wait;

pub use create::create_table;
pub use delete::delete_table;
pub use exists::{describe_table_status, table_exists};
pub use list::list_table_names;
pub use wait::wait_for_table_active;

use aws_sdk_dynamodb::types as sdk;

use crate::errors::{Error, Result};
use crate::types::{KeySchemaElement, TableStatus};

/// Convert an SDK table status into the registry's lifecycle state.
///
/// `UPDATING` tables are usable and count as active.
pub(crate) fn status_from_sdk(
    status: Option<&sdk::TableStatus>,
    table: &str,
) -> Result<TableStatus> {
    match status {
        Some(sdk::TableStatus::Creating) => Ok(TableStatus::Creating),
        Some(sdk::TableStatus::Active) | Some(sdk::TableStatus::Updating) => {
            Ok(TableStatus::Active)
        }
        Some(sdk::TableStatus::Deleting) => Ok(TableStatus::Deleting),
        Some(other) => Err(Error::Service {
            code: "UnexpectedTableStatus".to_string(),
            message: format!("Table {} reported status {}", table, other.as_str()),
        }),
        None => Err(Error::Service {
            code: "MissingTableStatus".to_string(),
            message: format!("No status returned for table {}", table),
        }),
    }
}

/// Convert a key schema into SDK key schema elements.
pub(crate) fn key_schema_to_sdk(
    keys: &[KeySchemaElement],
) -> Result<Vec<sdk::KeySchemaElement>> {
    keys.iter()
        .map(|key| {
            sdk::KeySchemaElement::builder()
                .attribute_name(&key.attribute_name)
                .key_type(sdk::KeyType::from(key.key_type.as_str()))
                .build()
                .map_err(|e| Error::Validation(format!("Failed to build key schema: {}", e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_sdk() {
        assert_eq!(
            status_from_sdk(Some(&sdk::TableStatus::Creating), "Users").unwrap(),
            TableStatus::Creating
        );
        assert_eq!(
            status_from_sdk(Some(&sdk::TableStatus::Updating), "Users").unwrap(),
            TableStatus::Active
        );
        assert!(status_from_sdk(Some(&sdk::TableStatus::Archived), "Users").is_err());
        assert!(status_from_sdk(None, "Users").is_err());
    }

    #[test]
    fn test_key_schema_to_sdk() {
        let keys = key_schema_to_sdk(&[
            KeySchemaElement::hash("pk"),
            KeySchemaElement::range("sk"),
        ])
        .unwrap();

        assert_eq!(keys[0].attribute_name(), "pk");
        assert_eq!(keys[0].key_type(), &sdk::KeyType::Hash);
        assert_eq!(keys[1].key_type(), &sdk::KeyType::Range);
    }
}
