//! Create table operation.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types as sdk;

use super::gsi::gsis_to_sdk;
use super::lsi::lsis_to_sdk;
use super::{key_schema_to_sdk, status_from_sdk};
use crate::errors::{Error, Result, map_sdk_error};
use crate::types::{AttributeDefinition, ProvisionedThroughput, TableDefinition, TableStatus};

/// SDK-ready pieces of a `CreateTable` request.
pub(crate) struct PreparedCreateTable {
    pub table_name: String,
    pub key_schema: Vec<sdk::KeySchemaElement>,
    pub attribute_definitions: Vec<sdk::AttributeDefinition>,
    pub billing_mode: Option<sdk::BillingMode>,
    pub provisioned_throughput: Option<sdk::ProvisionedThroughput>,
    pub global_secondary_indexes: Option<Vec<sdk::GlobalSecondaryIndex>>,
    pub local_secondary_indexes: Option<Vec<sdk::LocalSecondaryIndex>>,
}

pub(crate) fn throughput_to_sdk(
    throughput: &ProvisionedThroughput,
) -> Result<sdk::ProvisionedThroughput> {
    sdk::ProvisionedThroughput::builder()
        .read_capacity_units(throughput.read_capacity_units)
        .write_capacity_units(throughput.write_capacity_units)
        .build()
        .map_err(|e| Error::Validation(format!("Failed to build provisioned throughput: {}", e)))
}

fn attribute_definitions_to_sdk(
    attrs: &[AttributeDefinition],
) -> Result<Vec<sdk::AttributeDefinition>> {
    attrs
        .iter()
        .map(|attr| {
            sdk::AttributeDefinition::builder()
                .attribute_name(&attr.attribute_name)
                .attribute_type(sdk::ScalarAttributeType::from(attr.attribute_type.as_str()))
                .build()
                .map_err(|e| {
                    Error::Validation(format!("Failed to build attribute definition: {}", e))
                })
        })
        .collect()
}

/// Convert a declared table into SDK request parts.
pub(crate) fn prepare_create_table(def: &TableDefinition) -> Result<PreparedCreateTable> {
    let provisioned_throughput = match def.provisioned_throughput.as_ref() {
        Some(t) => Some(throughput_to_sdk(t)?),
        None => None,
    };

    let global_secondary_indexes = if def.global_secondary_indexes.is_empty() {
        None
    } else {
        Some(gsis_to_sdk(&def.global_secondary_indexes)?)
    };

    let local_secondary_indexes = if def.local_secondary_indexes.is_empty() {
        None
    } else {
        Some(lsis_to_sdk(&def.local_secondary_indexes)?)
    };

    Ok(PreparedCreateTable {
        table_name: def.table_name.clone(),
        key_schema: key_schema_to_sdk(&def.key_schema)?,
        attribute_definitions: attribute_definitions_to_sdk(&def.attribute_definitions)?,
        billing_mode: def
            .billing_mode
            .as_ref()
            .map(|mode| sdk::BillingMode::from(mode.as_str())),
        provisioned_throughput,
        global_secondary_indexes,
        local_secondary_indexes,
    })
}

/// Create a table and return the status reported by the endpoint.
pub async fn create_table(client: &Client, def: &TableDefinition) -> Result<TableStatus> {
    let prepared = prepare_create_table(def)?;

    let result = client
        .create_table()
        .table_name(&prepared.table_name)
        .set_key_schema(Some(prepared.key_schema))
        .set_attribute_definitions(Some(prepared.attribute_definitions))
        .set_billing_mode(prepared.billing_mode)
        .set_provisioned_throughput(prepared.provisioned_throughput)
        .set_global_secondary_indexes(prepared.global_secondary_indexes)
        .set_local_secondary_indexes(prepared.local_secondary_indexes)
        .send()
        .await;

    match result {
        Ok(output) => status_from_sdk(
            output
                .table_description()
                .and_then(|desc| desc.table_status()),
            &prepared.table_name,
        ),
        Err(e) => Err(map_sdk_error(e, &prepared.table_name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_on_demand_table() {
        let prepared = prepare_create_table(&TableDefinition::with_hash_key("Users", "id")).unwrap();

        assert_eq!(prepared.table_name, "Users");
        assert_eq!(prepared.key_schema.len(), 1);
        assert_eq!(
            prepared.attribute_definitions[0].attribute_type(),
            &sdk::ScalarAttributeType::S
        );
        assert_eq!(prepared.billing_mode, Some(sdk::BillingMode::PayPerRequest));
        assert!(prepared.provisioned_throughput.is_none());
        assert!(prepared.global_secondary_indexes.is_none());
    }

    #[test]
    fn test_prepare_provisioned_table() {
        let mut def = TableDefinition::with_hash_key("Users", "id");
        def.billing_mode = None;
        def.provisioned_throughput = Some(ProvisionedThroughput {
            read_capacity_units: 3,
            write_capacity_units: 4,
        });
        let prepared = prepare_create_table(&def).unwrap();

        let throughput = prepared.provisioned_throughput.unwrap();
        assert_eq!(throughput.read_capacity_units(), 3);
        assert_eq!(throughput.write_capacity_units(), 4);
        assert_eq!(prepared.billing_mode, None);
    }
}
