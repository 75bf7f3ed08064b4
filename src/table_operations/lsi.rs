//! Local secondary index conversion.

use aws_sdk_dynamodb::types as sdk;

use super::gsi::projection_to_sdk;
use super::key_schema_to_sdk;
use crate::errors::{Error, Result};
use crate::types::LocalSecondaryIndex;

/// Convert LSI definitions into SDK index definitions.
pub(crate) fn lsis_to_sdk(indexes: &[LocalSecondaryIndex]) -> Result<Vec<sdk::LocalSecondaryIndex>> {
    indexes
        .iter()
        .map(|lsi| {
            sdk::LocalSecondaryIndex::builder()
                .index_name(&lsi.index_name)
                .set_key_schema(Some(key_schema_to_sdk(&lsi.key_schema)?))
                .projection(projection_to_sdk(&lsi.projection))
                .build()
                .map_err(|e| {
                    Error::Validation(format!(
                        "Failed to build LSI '{}': {}",
                        lsi.index_name, e
                    ))
                })
        })
        .collect()
}
