//! Conversions between schema types and DynamoDB request/response types.

use std::collections::BTreeMap;

use aws_sdk_dynamodb::types::{
    self as ddb, AttributeDefinition, GlobalSecondaryIndex, KeySchemaElement, KeyType,
    LocalSecondaryIndex, Projection, ProvisionedThroughput, ProvisionedThroughputDescription,
    ScalarAttributeType, TableDescription,
};

use tablesync_core::schema::{
    AttributeType, IndexDefinition, KeyRole, KeySchema, ProjectionType, Throughput,
};
use tablesync_core::service::{
    IndexStatus, RemoteIndex, RemoteKey, RemoteTable, ServiceResult, TableStatus,
};

use super::error::map_build_error;

pub fn scalar_type(attribute_type: AttributeType) -> ScalarAttributeType {
    match attribute_type {
        AttributeType::Number => ScalarAttributeType::N,
        AttributeType::String => ScalarAttributeType::S,
        AttributeType::Binary => ScalarAttributeType::B,
    }
}

fn attribute_type(scalar: &ScalarAttributeType) -> Option<AttributeType> {
    match scalar {
        ScalarAttributeType::N => Some(AttributeType::Number),
        ScalarAttributeType::S => Some(AttributeType::String),
        ScalarAttributeType::B => Some(AttributeType::Binary),
        _ => None,
    }
}

fn key_type(role: KeyRole) -> KeyType {
    match role {
        KeyRole::Hash => KeyType::Hash,
        KeyRole::Range => KeyType::Range,
    }
}

pub fn key_schema(keys: &KeySchema) -> ServiceResult<Vec<KeySchemaElement>> {
    keys.keys()
        .into_iter()
        .map(|key| {
            KeySchemaElement::builder()
                .attribute_name(&key.name)
                .key_type(key_type(key.role))
                .build()
                .map_err(map_build_error)
        })
        .collect()
}

pub fn attribute_definitions(
    attributes: &BTreeMap<String, AttributeType>,
) -> ServiceResult<Vec<AttributeDefinition>> {
    attributes
        .iter()
        .map(|(name, attribute_type)| {
            AttributeDefinition::builder()
                .attribute_name(name)
                .attribute_type(scalar_type(*attribute_type))
                .build()
                .map_err(map_build_error)
        })
        .collect()
}

/// Definitions for the key attributes of one index.
pub fn index_attribute_definitions(
    index: &IndexDefinition,
) -> ServiceResult<Vec<AttributeDefinition>> {
    let attributes = index
        .keys
        .keys()
        .into_iter()
        .map(|key| (key.name.clone(), key.attribute_type))
        .collect();
    attribute_definitions(&attributes)
}

pub fn provisioned_throughput(throughput: Throughput) -> ServiceResult<ProvisionedThroughput> {
    ProvisionedThroughput::builder()
        .read_capacity_units(throughput.read)
        .write_capacity_units(throughput.write)
        .build()
        .map_err(map_build_error)
}

pub fn projection(index: &IndexDefinition) -> Projection {
    let projection_type = match index.projection {
        ProjectionType::All => ddb::ProjectionType::All,
        ProjectionType::KeysOnly => ddb::ProjectionType::KeysOnly,
        ProjectionType::Include => ddb::ProjectionType::Include,
    };
    let non_key_attributes = match index.projection {
        ProjectionType::Include => Some(index.non_key_attributes.clone()),
        _ => None,
    };
    Projection::builder()
        .projection_type(projection_type)
        .set_non_key_attributes(non_key_attributes)
        .build()
}

pub fn local_index(index: &IndexDefinition) -> ServiceResult<LocalSecondaryIndex> {
    LocalSecondaryIndex::builder()
        .index_name(&index.name)
        .set_key_schema(Some(key_schema(&index.keys)?))
        .projection(projection(index))
        .build()
        .map_err(map_build_error)
}

pub fn global_index(
    index: &IndexDefinition,
    throughput: Throughput,
) -> ServiceResult<GlobalSecondaryIndex> {
    GlobalSecondaryIndex::builder()
        .index_name(&index.name)
        .set_key_schema(Some(key_schema(&index.keys)?))
        .projection(projection(index))
        .provisioned_throughput(provisioned_throughput(throughput)?)
        .build()
        .map_err(map_build_error)
}

fn remote_keys(elements: &[KeySchemaElement]) -> Vec<RemoteKey> {
    elements
        .iter()
        .map(|element| {
            let role = match element.key_type() {
                KeyType::Range => KeyRole::Range,
                _ => KeyRole::Hash,
            };
            RemoteKey::new(element.attribute_name(), role)
        })
        .collect()
}

fn remote_throughput(description: Option<&ProvisionedThroughputDescription>) -> Option<Throughput> {
    let description = description?;
    Some(Throughput::new(
        description.read_capacity_units()?,
        description.write_capacity_units()?,
    ))
}

fn table_status(status: Option<&ddb::TableStatus>) -> TableStatus {
    match status {
        Some(ddb::TableStatus::Creating) => TableStatus::Creating,
        Some(ddb::TableStatus::Updating) => TableStatus::Updating,
        Some(ddb::TableStatus::Deleting) => TableStatus::Deleting,
        _ => TableStatus::Active,
    }
}

fn index_status(status: Option<&ddb::IndexStatus>) -> IndexStatus {
    match status {
        Some(ddb::IndexStatus::Creating) => IndexStatus::Creating,
        Some(ddb::IndexStatus::Updating) => IndexStatus::Updating,
        Some(ddb::IndexStatus::Deleting) => IndexStatus::Deleting,
        _ => IndexStatus::Active,
    }
}

/// Converts a table description into the service-neutral [`RemoteTable`].
pub fn remote_table(table: &TableDescription) -> RemoteTable {
    let attribute_definitions = table
        .attribute_definitions()
        .iter()
        .filter_map(|definition| {
            let attribute_type = attribute_type(definition.attribute_type())?;
            Some((definition.attribute_name().to_string(), attribute_type))
        })
        .collect();

    let global_indexes = table
        .global_secondary_indexes()
        .iter()
        .map(|index| RemoteIndex {
            name: index.index_name().unwrap_or_default().to_string(),
            key_schema: remote_keys(index.key_schema()),
            throughput: remote_throughput(index.provisioned_throughput()),
            status: index_status(index.index_status()),
        })
        .collect();

    RemoteTable {
        name: table.table_name().unwrap_or_default().to_string(),
        status: table_status(table.table_status()),
        key_schema: remote_keys(table.key_schema()),
        attribute_definitions,
        throughput: remote_throughput(table.provisioned_throughput()),
        local_indexes: table
            .local_secondary_indexes()
            .iter()
            .filter_map(|index| index.index_name().map(str::to_string))
            .collect(),
        global_indexes,
    }
}
