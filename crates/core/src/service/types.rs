use std::collections::BTreeMap;

use crate::schema::{AttributeType, IndexDefinition, KeyDefinition, KeyRole, TableSchema, Throughput};

/// Lifecycle state of a remote table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Lifecycle state of a remote global index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// One element of a remote key schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteKey {
    pub name: String,
    pub role: KeyRole,
}

impl RemoteKey {
    pub fn new(name: impl Into<String>, role: KeyRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// Live state of a global index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIndex {
    pub name: String,
    pub key_schema: Vec<RemoteKey>,
    pub throughput: Option<Throughput>,
    pub status: IndexStatus,
}

/// Live state of a remote table, as returned by `describe_table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTable {
    /// Physical table name.
    pub name: String,
    pub status: TableStatus,
    pub key_schema: Vec<RemoteKey>,
    pub attribute_definitions: BTreeMap<String, AttributeType>,
    pub throughput: Option<Throughput>,
    pub local_indexes: Vec<String>,
    pub global_indexes: Vec<RemoteIndex>,
}

impl RemoteTable {
    /// The state a freshly created table would report.
    pub fn from_schema(name: impl Into<String>, schema: &TableSchema, throughput: Throughput) -> Self {
        Self {
            name: name.into(),
            status: TableStatus::Active,
            key_schema: remote_keys(&schema.primary.keys()),
            attribute_definitions: schema.key_attributes(),
            throughput: Some(throughput),
            local_indexes: schema.indexes.iter().map(|index| index.name.clone()).collect(),
            global_indexes: schema
                .global_indexes
                .iter()
                .map(|index| RemoteIndex::from_definition(index, index.throughput.unwrap_or(throughput)))
                .collect(),
        }
    }

    pub fn global_index(&self, name: &str) -> Option<&RemoteIndex> {
        self.global_indexes.iter().find(|index| index.name == name)
    }
}

impl RemoteIndex {
    pub fn from_definition(index: &IndexDefinition, throughput: Throughput) -> Self {
        Self {
            name: index.name.clone(),
            key_schema: remote_keys(&index.keys.keys()),
            throughput: Some(throughput),
            status: IndexStatus::Active,
        }
    }
}

fn remote_keys(keys: &[&KeyDefinition]) -> Vec<RemoteKey> {
    keys.iter()
        .map(|key| RemoteKey::new(key.name.clone(), key.role))
        .collect()
}
