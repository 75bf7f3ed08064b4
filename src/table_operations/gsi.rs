//! Global secondary index conversion.

use aws_sdk_dynamodb::types as sdk;

use super::create::throughput_to_sdk;
use super::key_schema_to_sdk;
use crate::errors::{Error, Result};
use crate::types::{GlobalSecondaryIndex, Projection};

pub(crate) fn projection_to_sdk(projection: &Projection) -> sdk::Projection {
    let non_key_attributes = if projection.non_key_attributes.is_empty() {
        None
    } else {
        Some(projection.non_key_attributes.clone())
    };

    sdk::Projection::builder()
        .set_projection_type(
            projection
                .projection_type
                .as_ref()
                .map(|p| sdk::ProjectionType::from(p.as_str())),
        )
        .set_non_key_attributes(non_key_attributes)
        .build()
}

/// Convert GSI definitions into SDK index definitions.
pub(crate) fn gsis_to_sdk(indexes: &[GlobalSecondaryIndex]) -> Result<Vec<sdk::GlobalSecondaryIndex>> {
    indexes
        .iter()
        .map(|gsi| {
            let throughput = match gsi.provisioned_throughput.as_ref() {
                Some(t) => Some(throughput_to_sdk(t)?),
                None => None,
            };
            sdk::GlobalSecondaryIndex::builder()
                .index_name(&gsi.index_name)
                .set_key_schema(Some(key_schema_to_sdk(&gsi.key_schema)?))
                .projection(projection_to_sdk(&gsi.projection))
                .set_provisioned_throughput(throughput)
                .build()
                .map_err(|e| {
                    Error::Validation(format!(
                        "Failed to build GSI '{}': {}",
                        gsi.index_name, e
                    ))
                })
        })
        .collect()
}
