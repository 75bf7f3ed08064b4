//! DynamoDB wire types for table management.
//!
//! All structs follow the DynamoDB JSON wire format with `PascalCase` field
//! names. The same shapes are used for `CreateTable` requests and for the
//! `Properties` block of an `AWS::DynamoDB::Table` template resource.
//!
//! Enums that come from user input (`KeyType`, `ScalarAttributeType`,
//! `BillingMode`, `ProjectionType`) keep unknown values in an `Unknown`
//! variant so validation can reject them with a `ValidationException`
//! instead of a decoding error.

use serde::{Deserialize, Serialize};

/// Generates `as_str`, `Display`, `Serialize` and a lenient `Deserialize`
/// for a wire enum with an `Unknown(String)` fallback.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the DynamoDB wire-format string representation.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown(s) => s.as_str(),
                }
            }

            /// Returns `true` unless this value came from an unrecognized wire string.
            #[must_use]
            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($wire => Self::$variant,)+
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ========== ENUMS ==========

/// Role of an attribute within a key schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// Partition key.
    Hash,
    /// Sort key.
    Range,
    /// Unrecognized value received from the client.
    Unknown(String),
}

wire_enum!(KeyType { Hash => "HASH", Range => "RANGE" });

/// Scalar attribute types allowed in attribute definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarAttributeType {
    /// String.
    S,
    /// Number.
    N,
    /// Binary.
    B,
    /// Unrecognized value received from the client.
    Unknown(String),
}

wire_enum!(ScalarAttributeType { S => "S", N => "N", B => "B" });

/// Billing mode of a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BillingMode {
    /// Explicit read/write capacity units.
    Provisioned,
    /// On-demand.
    PayPerRequest,
    /// Unrecognized value received from the client.
    Unknown(String),
}

wire_enum!(BillingMode {
    Provisioned => "PROVISIONED",
    PayPerRequest => "PAY_PER_REQUEST",
});

/// Attributes copied into a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectionType {
    /// Every attribute.
    All,
    /// Index and table keys only.
    KeysOnly,
    /// Keys plus `NonKeyAttributes`.
    Include,
    /// Unrecognized value received from the client.
    Unknown(String),
}

wire_enum!(ProjectionType {
    All => "ALL",
    KeysOnly => "KEYS_ONLY",
    Include => "INCLUDE",
});

/// Lifecycle state of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableStatus {
    /// Accepted, provisioning in progress.
    #[serde(rename = "CREATING")]
    Creating,
    /// Ready for use.
    #[serde(rename = "ACTIVE")]
    Active,
    /// Delete accepted, removal pending.
    #[serde(rename = "DELETING")]
    Deleting,
}

impl TableStatus {
    /// Returns the DynamoDB wire-format string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "CREATING",
            Self::Active => "ACTIVE",
            Self::Deleting => "DELETING",
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ========== DEFINITION SHAPES ==========

/// One element of a key schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

impl KeySchemaElement {
    pub fn hash(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Hash,
        }
    }

    pub fn range(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Range,
        }
    }
}

/// Declared type of an attribute used by a key schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: ScalarAttributeType,
}

impl AttributeDefinition {
    pub fn new(attribute_name: impl Into<String>, attribute_type: ScalarAttributeType) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            attribute_type,
        }
    }
}

/// Provisioned read/write capacity (input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

/// Projection settings for a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Projection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection_type: Option<ProjectionType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_key_attributes: Vec<String>,
}

/// Global secondary index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalSecondaryIndex {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    #[serde(default)]
    pub projection: Projection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
}

/// Local secondary index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalSecondaryIndex {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    #[serde(default)]
    pub projection: Projection,
}

/// A declared table: the body of a `CreateTable` request.
///
/// Fields the emulator does not model (tags, streams, TTL, ...) are ignored
/// on input so template `Properties` blocks can be passed through as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDefinition {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub key_schema: Vec<KeySchemaElement>,
    #[serde(default)]
    pub attribute_definitions: Vec<AttributeDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_mode: Option<BillingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_secondary_indexes: Vec<GlobalSecondaryIndex>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_secondary_indexes: Vec<LocalSecondaryIndex>,
}

impl TableDefinition {
    /// On-demand table keyed by a single string partition key.
    pub fn with_hash_key(table_name: impl Into<String>, hash_key: impl Into<String>) -> Self {
        let hash_key = hash_key.into();
        Self {
            table_name: table_name.into(),
            key_schema: vec![KeySchemaElement::hash(hash_key.clone())],
            attribute_definitions: vec![AttributeDefinition::new(
                hash_key,
                ScalarAttributeType::S,
            )],
            billing_mode: Some(BillingMode::PayPerRequest),
            ..Self::default()
        }
    }

    /// Billing mode in effect; DynamoDB defaults to `PROVISIONED`.
    #[must_use]
    pub fn effective_billing_mode(&self) -> BillingMode {
        self.billing_mode.clone().unwrap_or(BillingMode::Provisioned)
    }
}

// ========== DESCRIPTION SHAPES ==========

/// Summary of a table's billing mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillingModeSummary {
    pub billing_mode: BillingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_to_pay_per_request_date_time: Option<f64>,
}

/// Provisioned throughput as reported by `DescribeTable`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughputDescription {
    pub number_of_decreases_today: i64,
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

/// Global secondary index as reported by `DescribeTable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalSecondaryIndexDescription {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
    pub index_status: TableStatus,
    pub provisioned_throughput: ProvisionedThroughputDescription,
    pub index_size_bytes: i64,
    pub item_count: i64,
    pub index_arn: String,
}

/// Local secondary index as reported by `DescribeTable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalSecondaryIndexDescription {
    pub index_name: String,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
    pub index_size_bytes: i64,
    pub item_count: i64,
    pub index_arn: String,
}

/// Full description of a table, returned by `CreateTable`, `DescribeTable`
/// and `DeleteTable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDescription {
    pub table_name: String,
    pub table_status: TableStatus,
    pub key_schema: Vec<KeySchemaElement>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// Epoch seconds.
    pub creation_date_time: f64,
    pub item_count: i64,
    pub table_size_bytes: i64,
    pub table_arn: String,
    pub table_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_mode_summary: Option<BillingModeSummary>,
    pub provisioned_throughput: ProvisionedThroughputDescription,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_secondary_indexes: Vec<GlobalSecondaryIndexDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_secondary_indexes: Vec<LocalSecondaryIndexDescription>,
}

// ========== REQUEST / RESPONSE ENVELOPES ==========

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTablesInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_start_table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTablesOutput {
    pub table_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_table_name: Option<String>,
}

/// Body of `DescribeTable` and `DeleteTable` requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableNameInput {
    #[serde(default)]
    pub table_name: String,
}

/// `CreateTable` / `DeleteTable` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDescriptionOutput {
    pub table_description: TableDescription,
}

/// `DescribeTable` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeTableOutput {
    pub table: TableDescription,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_from_template_properties() {
        let props = json!({
            "TableName": "Users",
            "AttributeDefinitions": [{"AttributeName": "id", "AttributeType": "S"}],
            "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}],
            "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 1},
            "TimeToLiveSpecification": {"AttributeName": "ttl", "Enabled": true}
        });

        let def: TableDefinition = serde_json::from_value(props).unwrap();

        assert_eq!(def.table_name, "Users");
        assert_eq!(def.key_schema, vec![KeySchemaElement::hash("id")]);
        assert_eq!(
            def.provisioned_throughput,
            Some(ProvisionedThroughput {
                read_capacity_units: 1,
                write_capacity_units: 1
            })
        );
        assert_eq!(def.effective_billing_mode(), BillingMode::Provisioned);
    }

    #[test]
    fn test_unknown_enum_values_are_kept() {
        let def: TableDefinition = serde_json::from_value(json!({
            "TableName": "Users",
            "KeySchema": [{"AttributeName": "id", "KeyType": "PARTITION"}],
            "AttributeDefinitions": [{"AttributeName": "id", "AttributeType": "BOOL"}],
            "BillingMode": "FREE"
        }))
        .unwrap();

        assert_eq!(
            def.key_schema[0].key_type,
            KeyType::Unknown("PARTITION".to_string())
        );
        assert!(!def.attribute_definitions[0].attribute_type.is_known());
        assert_eq!(def.billing_mode.unwrap().as_str(), "FREE");
    }

    #[test]
    fn test_status_serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_value(TableStatus::Creating).unwrap(),
            json!("CREATING")
        );
        assert_eq!(TableStatus::Deleting.to_string(), "DELETING");
    }
}
