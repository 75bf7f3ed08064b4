//! Table definition validation.
//!
//! Mirrors the checks DynamoDB runs on `CreateTable` before accepting a
//! request. Every failure is a `ValidationException`.

use std::collections::HashSet;

use crate::errors::{Error, Result};
use crate::types::{BillingMode, KeySchemaElement, KeyType, ProvisionedThroughput, TableDefinition};

const TABLE_NAME_MIN: usize = 3;
const TABLE_NAME_MAX: usize = 255;

/// Validate a table or index name: 3..=255 chars of `[A-Za-z0-9_.-]`.
pub fn validate_name(field: &str, name: &str) -> Result<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if name.len() < TABLE_NAME_MIN || name.len() > TABLE_NAME_MAX || !valid_chars {
        return Err(Error::Validation(format!(
            "1 validation error detected: Value '{}' at '{}' failed to satisfy constraint: \
             Member must have length between {} and {} and match [a-zA-Z0-9_.-]+",
            name, field, TABLE_NAME_MIN, TABLE_NAME_MAX
        )));
    }
    Ok(())
}

/// Validate a key schema: one HASH element, optionally followed by one RANGE element.
fn validate_key_schema(field: &str, key_schema: &[KeySchemaElement]) -> Result<()> {
    if key_schema.is_empty() || key_schema.len() > 2 {
        return Err(Error::Validation(format!(
            "1 validation error detected: Value at '{}' failed to satisfy constraint: \
             Member must have length between 1 and 2",
            field
        )));
    }
    if let Some(unknown) = key_schema.iter().find(|k| !k.key_type.is_known()) {
        return Err(Error::Validation(format!(
            "1 validation error detected: Value '{}' at '{}' failed to satisfy constraint: \
             Member must satisfy enum value set: [HASH, RANGE]",
            unknown.key_type, field
        )));
    }
    if key_schema[0].key_type != KeyType::Hash {
        return Err(Error::Validation(format!(
            "Invalid KeySchema: The first KeySchemaElement is not a HASH key type in {}",
            field
        )));
    }
    if let Some(second) = key_schema.get(1) {
        if second.key_type != KeyType::Range {
            return Err(Error::Validation(format!(
                "Invalid KeySchema: The second KeySchemaElement is not a RANGE key type in {}",
                field
            )));
        }
        if second.attribute_name == key_schema[0].attribute_name {
            return Err(Error::Validation(
                "Both the Hash Key and the Range Key element in the KeySchema have the same name"
                    .to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_throughput(throughput: &ProvisionedThroughput) -> Result<()> {
    if throughput.read_capacity_units < 1 || throughput.write_capacity_units < 1 {
        return Err(Error::Validation(
            "One or more parameter values were invalid: \
             ReadCapacityUnits and WriteCapacityUnits must both be at least 1"
                .to_string(),
        ));
    }
    Ok(())
}

/// Run every `CreateTable` check against a definition.
pub fn validate_definition(def: &TableDefinition) -> Result<()> {
    validate_name("tableName", &def.table_name)?;
    validate_key_schema("keySchema", &def.key_schema)?;

    let mut defined: HashSet<&str> = HashSet::new();
    for attr in &def.attribute_definitions {
        if !attr.attribute_type.is_known() {
            return Err(Error::Validation(format!(
                "1 validation error detected: Value '{}' at 'attributeDefinitions' failed to \
                 satisfy constraint: Member must satisfy enum value set: [B, N, S]",
                attr.attribute_type
            )));
        }
        if !defined.insert(attr.attribute_name.as_str()) {
            return Err(Error::Validation(format!(
                "Cannot have two attributes with the same name: {}",
                attr.attribute_name
            )));
        }
    }

    // Every attribute referenced by a key schema must be defined, and every
    // definition must be referenced by some key schema.
    let mut used: HashSet<&str> = HashSet::new();
    let check_keys = |keys: &[KeySchemaElement]| -> Result<()> {
        for key in keys {
            if !defined.contains(key.attribute_name.as_str()) {
                return Err(Error::Validation(
                    "One or more parameter values were invalid: Some index key attributes are \
                     not defined in AttributeDefinitions"
                        .to_string(),
                ));
            }
        }
        Ok(())
    };
    check_keys(&def.key_schema)?;
    used.extend(def.key_schema.iter().map(|k| k.attribute_name.as_str()));

    let mut index_names: HashSet<&str> = HashSet::new();
    for gsi in &def.global_secondary_indexes {
        validate_name("globalSecondaryIndexes.indexName", &gsi.index_name)?;
        validate_key_schema("globalSecondaryIndexes.keySchema", &gsi.key_schema)?;
        check_keys(&gsi.key_schema)?;
        used.extend(gsi.key_schema.iter().map(|k| k.attribute_name.as_str()));
        if !index_names.insert(gsi.index_name.as_str()) {
            return Err(Error::Validation(format!(
                "One or more parameter values were invalid: Duplicate index name: {}",
                gsi.index_name
            )));
        }
    }
    for lsi in &def.local_secondary_indexes {
        validate_name("localSecondaryIndexes.indexName", &lsi.index_name)?;
        validate_key_schema("localSecondaryIndexes.keySchema", &lsi.key_schema)?;
        check_keys(&lsi.key_schema)?;
        let same_hash = lsi.key_schema[0].attribute_name == def.key_schema[0].attribute_name;
        if lsi.key_schema.len() != 2 || !same_hash {
            return Err(Error::Validation(format!(
                "One or more parameter values were invalid: Index KeySchema does not have the \
                 same leading hash key as table KeySchema for index: {}",
                lsi.index_name
            )));
        }
        used.extend(lsi.key_schema.iter().map(|k| k.attribute_name.as_str()));
        if !index_names.insert(lsi.index_name.as_str()) {
            return Err(Error::Validation(format!(
                "One or more parameter values were invalid: Duplicate index name: {}",
                lsi.index_name
            )));
        }
    }

    if let Some(unused) = def
        .attribute_definitions
        .iter()
        .find(|a| !used.contains(a.attribute_name.as_str()))
    {
        return Err(Error::Validation(format!(
            "One or more parameter values were invalid: Number of attributes in KeySchema does \
             not exactly match number of attributes defined in AttributeDefinitions \
             (unused: {})",
            unused.attribute_name
        )));
    }

    match def.effective_billing_mode() {
        BillingMode::Provisioned => {
            let Some(throughput) = def.provisioned_throughput.as_ref() else {
                return Err(Error::Validation(
                    "One or more parameter values were invalid: ReadCapacityUnits and \
                     WriteCapacityUnits must both be specified when BillingMode is PROVISIONED"
                        .to_string(),
                ));
            };
            validate_throughput(throughput)?;
            for gsi in &def.global_secondary_indexes {
                match gsi.provisioned_throughput.as_ref() {
                    Some(t) => validate_throughput(t)?,
                    None => {
                        return Err(Error::Validation(format!(
                            "One or more parameter values were invalid: ProvisionedThroughput \
                             must be specified for index: {}",
                            gsi.index_name
                        )));
                    }
                }
            }
        }
        BillingMode::PayPerRequest => {
            if def.provisioned_throughput.is_some()
                || def
                    .global_secondary_indexes
                    .iter()
                    .any(|g| g.provisioned_throughput.is_some())
            {
                return Err(Error::Validation(
                    "One or more parameter values were invalid: Neither ReadCapacityUnits nor \
                     WriteCapacityUnits can be specified when BillingMode is PAY_PER_REQUEST"
                        .to_string(),
                ));
            }
        }
        BillingMode::Unknown(mode) => {
            return Err(Error::Validation(format!(
                "1 validation error detected: Value '{}' at 'billingMode' failed to satisfy \
                 constraint: Member must satisfy enum value set: [PROVISIONED, PAY_PER_REQUEST]",
                mode
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AttributeDefinition, GlobalSecondaryIndex, LocalSecondaryIndex, Projection,
        ScalarAttributeType,
    };

    fn users() -> TableDefinition {
        TableDefinition::with_hash_key("Users", "id")
    }

    #[test]
    fn test_valid_on_demand_table() {
        assert!(validate_definition(&users()).is_ok());
    }

    #[test]
    fn test_valid_provisioned_table_with_range_key() {
        let def = TableDefinition {
            table_name: "Orders".into(),
            key_schema: vec![
                KeySchemaElement::hash("customer"),
                KeySchemaElement::range("placed_at"),
            ],
            attribute_definitions: vec![
                AttributeDefinition::new("customer", ScalarAttributeType::S),
                AttributeDefinition::new("placed_at", ScalarAttributeType::N),
            ],
            billing_mode: None,
            provisioned_throughput: Some(ProvisionedThroughput {
                read_capacity_units: 5,
                write_capacity_units: 5,
            }),
            ..TableDefinition::default()
        };
        assert!(validate_definition(&def).is_ok());
    }

    #[test]
    fn test_rejects_bad_names() {
        let mut def = users();
        def.table_name = "ab".into();
        assert!(matches!(validate_definition(&def), Err(Error::Validation(_))));

        def.table_name = "has space".into();
        assert!(matches!(validate_definition(&def), Err(Error::Validation(_))));

        def.table_name = String::new();
        assert!(matches!(validate_definition(&def), Err(Error::Validation(_))));
    }

    #[test]
    fn test_rejects_bad_key_schemas() {
        let mut def = users();
        def.key_schema.clear();
        assert!(validate_definition(&def).is_err());

        let mut def = users();
        def.key_schema = vec![KeySchemaElement::range("id")];
        assert!(validate_definition(&def).is_err());

        let mut def = users();
        def.key_schema[0].key_type = KeyType::Unknown("PARTITION".into());
        assert!(validate_definition(&def).is_err());
    }

    #[test]
    fn test_rejects_undefined_and_unused_attributes() {
        let mut def = users();
        def.attribute_definitions.clear();
        assert!(validate_definition(&def).is_err());

        let mut def = users();
        def.attribute_definitions
            .push(AttributeDefinition::new("email", ScalarAttributeType::S));
        assert!(validate_definition(&def).is_err());

        let mut def = users();
        def.attribute_definitions[0].attribute_type = ScalarAttributeType::Unknown("BOOL".into());
        assert!(validate_definition(&def).is_err());
    }

    #[test]
    fn test_billing_mode_rules() {
        let mut def = users();
        def.provisioned_throughput = Some(ProvisionedThroughput {
            read_capacity_units: 1,
            write_capacity_units: 1,
        });
        assert!(validate_definition(&def).is_err(), "on-demand with throughput");

        let mut def = users();
        def.billing_mode = None;
        assert!(validate_definition(&def).is_err(), "provisioned without throughput");

        def.provisioned_throughput = Some(ProvisionedThroughput {
            read_capacity_units: 0,
            write_capacity_units: 1,
        });
        assert!(validate_definition(&def).is_err(), "zero capacity");

        let mut def = users();
        def.billing_mode = Some(BillingMode::Unknown("FREE".into()));
        assert!(validate_definition(&def).is_err());
    }

    #[test]
    fn test_indexes() {
        let mut def = users();
        def.key_schema.push(KeySchemaElement::range("created"));
        def.attribute_definitions.extend([
            AttributeDefinition::new("created", ScalarAttributeType::N),
            AttributeDefinition::new("email", ScalarAttributeType::S),
            AttributeDefinition::new("score", ScalarAttributeType::N),
        ]);
        def.global_secondary_indexes.push(GlobalSecondaryIndex {
            index_name: "by-email".into(),
            key_schema: vec![KeySchemaElement::hash("email")],
            projection: Projection::default(),
            provisioned_throughput: None,
        });
        def.local_secondary_indexes.push(LocalSecondaryIndex {
            index_name: "by-score".into(),
            key_schema: vec![KeySchemaElement::hash("id"), KeySchemaElement::range("score")],
            projection: Projection::default(),
        });
        assert!(validate_definition(&def).is_ok());

        let mut dup = def.clone();
        dup.local_secondary_indexes[0].index_name = "by-email".into();
        assert!(validate_definition(&dup).is_err());

        let mut wrong_hash = def.clone();
        wrong_hash.local_secondary_indexes[0].key_schema[0] = KeySchemaElement::hash("email");
        assert!(validate_definition(&wrong_hash).is_err());
    }
}
