//! Registry entries and their wire description.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{
    BillingMode, BillingModeSummary, GlobalSecondaryIndexDescription,
    LocalSecondaryIndexDescription, Projection, ProjectionType, ProvisionedThroughput,
    ProvisionedThroughputDescription, TableDefinition, TableDescription, TableStatus,
};

/// Account id used in every ARN the emulator hands out.
pub const LOCAL_ACCOUNT_ID: &str = "000000000000";

/// One incarnation of a table in the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    pub name: String,
    pub status: TableStatus,
    pub created_at: DateTime<Utc>,
    /// Distinguishes a re-created table from the one it replaced.
    pub table_id: Uuid,
    pub definition: TableDefinition,
}

impl TableRecord {
    pub(crate) fn new(definition: TableDefinition) -> Self {
        Self {
            name: definition.table_name.clone(),
            status: TableStatus::Creating,
            created_at: Utc::now(),
            table_id: Uuid::new_v4(),
            definition,
        }
    }

    pub fn table_arn(&self, region: &str) -> String {
        format!(
            "arn:aws:dynamodb:{}:{}:table/{}",
            region, LOCAL_ACCOUNT_ID, self.name
        )
    }

    /// Build the `TableDescription` DynamoDB would return for this record.
    pub fn describe(&self, region: &str) -> TableDescription {
        let def = &self.definition;
        let table_arn = self.table_arn(region);
        let billing_mode = def.effective_billing_mode();

        let billing_mode_summary = match billing_mode {
            BillingMode::PayPerRequest => Some(BillingModeSummary {
                billing_mode: BillingMode::PayPerRequest,
                last_update_to_pay_per_request_date_time: Some(self.creation_epoch()),
            }),
            _ => None,
        };

        let global_secondary_indexes = def
            .global_secondary_indexes
            .iter()
            .map(|gsi| GlobalSecondaryIndexDescription {
                index_name: gsi.index_name.clone(),
                key_schema: gsi.key_schema.clone(),
                projection: projection_or_all(&gsi.projection),
                index_status: self.status,
                provisioned_throughput: throughput_description(gsi.provisioned_throughput),
                index_size_bytes: 0,
                item_count: 0,
                index_arn: format!("{}/index/{}", table_arn, gsi.index_name),
            })
            .collect();

        let local_secondary_indexes = def
            .local_secondary_indexes
            .iter()
            .map(|lsi| LocalSecondaryIndexDescription {
                index_name: lsi.index_name.clone(),
                key_schema: lsi.key_schema.clone(),
                projection: projection_or_all(&lsi.projection),
                index_size_bytes: 0,
                item_count: 0,
                index_arn: format!("{}/index/{}", table_arn, lsi.index_name),
            })
            .collect();

        TableDescription {
            table_name: self.name.clone(),
            table_status: self.status,
            key_schema: def.key_schema.clone(),
            attribute_definitions: def.attribute_definitions.clone(),
            creation_date_time: self.creation_epoch(),
            item_count: 0,
            table_size_bytes: 0,
            table_arn,
            table_id: self.table_id.to_string(),
            billing_mode_summary,
            provisioned_throughput: throughput_description(def.provisioned_throughput),
            global_secondary_indexes,
            local_secondary_indexes,
        }
    }

    fn creation_epoch(&self) -> f64 {
        self.created_at.timestamp_millis() as f64 / 1000.0
    }
}

fn projection_or_all(projection: &Projection) -> Projection {
    Projection {
        projection_type: Some(
            projection
                .projection_type
                .clone()
                .unwrap_or(ProjectionType::All),
        ),
        non_key_attributes: projection.non_key_attributes.clone(),
    }
}

// On-demand tables report 0/0, as DynamoDB does.
fn throughput_description(
    throughput: Option<ProvisionedThroughput>,
) -> ProvisionedThroughputDescription {
    let throughput = throughput.unwrap_or_default();
    ProvisionedThroughputDescription {
        number_of_decreases_today: 0,
        read_capacity_units: throughput.read_capacity_units,
        write_capacity_units: throughput.write_capacity_units,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GlobalSecondaryIndex, KeySchemaElement};

    #[test]
    fn test_describe_on_demand_table() {
        let record = TableRecord::new(TableDefinition::with_hash_key("Users", "id"));
        let desc = record.describe("localhost");

        assert_eq!(desc.table_name, "Users");
        assert_eq!(desc.table_status, TableStatus::Creating);
        assert_eq!(desc.table_arn, "arn:aws:dynamodb:localhost:000000000000:table/Users");
        assert_eq!(desc.table_id, record.table_id.to_string());
        assert_eq!(desc.provisioned_throughput.read_capacity_units, 0);
        assert_eq!(
            desc.billing_mode_summary.map(|s| s.billing_mode),
            Some(BillingMode::PayPerRequest)
        );
    }

    #[test]
    fn test_describe_includes_indexes() {
        let mut def = TableDefinition::with_hash_key("Users", "id");
        def.global_secondary_indexes.push(GlobalSecondaryIndex {
            index_name: "by-email".into(),
            key_schema: vec![KeySchemaElement::hash("email")],
            projection: Projection::default(),
            provisioned_throughput: None,
        });
        let desc = TableRecord::new(def).describe("us-east-1");

        let gsi = &desc.global_secondary_indexes[0];
        assert_eq!(gsi.projection.projection_type, Some(ProjectionType::All));
        assert!(gsi.index_arn.ends_with("table/Users/index/by-email"));
    }

    #[test]
    fn test_description_wire_shape() {
        let record = TableRecord::new(TableDefinition::with_hash_key("Users", "id"));
        let value = serde_json::to_value(record.describe("localhost")).unwrap();

        assert_eq!(value["TableName"], "Users");
        assert_eq!(value["TableStatus"], "CREATING");
        assert_eq!(value["KeySchema"][0]["KeyType"], "HASH");
        assert!(value["CreationDateTime"].is_number());
        assert!(value.get("GlobalSecondaryIndexes").is_none());
    }
}
