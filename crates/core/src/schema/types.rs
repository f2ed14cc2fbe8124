use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::naming::IndexType;
use crate::error::SyncError;

/// Capacity units used when a table declares no throughput.
pub const DEFAULT_CAPACITY_UNITS: i64 = 5;

/// Scalar type of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeType {
    Number,
    String,
    Binary,
}

impl AttributeType {
    /// Wire code used by the remote service (`N`, `S`, `B`).
    pub fn code(&self) -> &'static str {
        match self {
            AttributeType::Number => "N",
            AttributeType::String => "S",
            AttributeType::Binary => "B",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AttributeType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "n" | "number" => Ok(AttributeType::Number),
            "s" | "string" => Ok(AttributeType::String),
            "b" | "binary" => Ok(AttributeType::Binary),
            other => Err(SyncError::Schema(format!(
                "Unsupported attribute type '{}'",
                other
            ))),
        }
    }
}

/// Role of a key inside a key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyRole {
    Hash,
    Range,
}

impl KeyRole {
    /// Key type as spelled by the remote service.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRole::Hash => "HASH",
            KeyRole::Range => "RANGE",
        }
    }

    /// Key field type identifier (`HashKey`, `RangeKey`).
    pub fn type_name(&self) -> &'static str {
        match self {
            KeyRole::Hash => "HashKey",
            KeyRole::Range => "RangeKey",
        }
    }
}

/// A named key with its role and resolved attribute type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyDefinition {
    pub name: String,
    pub role: KeyRole,
    pub attribute_type: AttributeType,
}

impl KeyDefinition {
    pub fn hash(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            role: KeyRole::Hash,
            attribute_type,
        }
    }

    pub fn range(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            role: KeyRole::Range,
            attribute_type,
        }
    }
}

impl fmt::Display for KeyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.name,
            self.role.as_str(),
            self.attribute_type
        )
    }
}

/// Hash key plus optional range key. Hash always comes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchema {
    pub hash: KeyDefinition,
    pub range: Option<KeyDefinition>,
}

impl KeySchema {
    pub fn new(hash: KeyDefinition, range: Option<KeyDefinition>) -> Self {
        Self { hash, range }
    }

    /// Keys in schema order.
    pub fn keys(&self) -> Vec<&KeyDefinition> {
        let mut keys = vec![&self.hash];
        if let Some(range) = &self.range {
            keys.push(range);
        }
        keys
    }
}

impl fmt::Display for KeySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.keys().iter().map(|k| k.to_string()).collect();
        write!(f, "[{}]", keys.join(", "))
    }
}

/// Provisioned read/write capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throughput {
    pub read: i64,
    pub write: i64,
}

impl Throughput {
    pub fn new(read: i64, write: i64) -> Self {
        Self { read, write }
    }
}

impl Default for Throughput {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_UNITS, DEFAULT_CAPACITY_UNITS)
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "read={}, write={}", self.read, self.write)
    }
}

/// Whether an index shares the table's partition (local) or not (global).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Local,
    Global,
}

/// Which attributes an index projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionType {
    All,
    KeysOnly,
    Include,
}

impl ProjectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionType::All => "ALL",
            ProjectionType::KeysOnly => "KEYS_ONLY",
            ProjectionType::Include => "INCLUDE",
        }
    }
}

/// A secondary index. Only global indexes carry their own throughput.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub kind: IndexKind,
    pub projection: ProjectionType,
    pub non_key_attributes: Vec<String>,
    pub keys: KeySchema,
    pub throughput: Option<Throughput>,
}

impl IndexDefinition {
    /// The closed index type this definition corresponds to.
    pub fn index_type(&self) -> IndexType {
        IndexType::from_parts(self.kind, self.projection)
    }
}

/// Normalized schema of one declared table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Logical (namespace-free) table name.
    pub name: String,
    pub attributes: BTreeMap<String, AttributeType>,
    pub primary: KeySchema,
    pub indexes: Vec<IndexDefinition>,
    pub global_indexes: Vec<IndexDefinition>,
    pub throughput: Throughput,
}

impl TableSchema {
    /// Finds a global index by name.
    pub fn global_index(&self, name: &str) -> Option<&IndexDefinition> {
        self.global_indexes.iter().find(|index| index.name == name)
    }

    /// Finds a local or global index by name.
    pub fn index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes
            .iter()
            .chain(self.global_indexes.iter())
            .find(|index| index.name == name)
    }

    /// Attributes referenced by any key of the table or its indexes.
    ///
    /// The remote service only accepts definitions for key attributes, so
    /// this is what gets sent on table creation.
    pub fn key_attributes(&self) -> BTreeMap<String, AttributeType> {
        let mut attributes = BTreeMap::new();
        let index_keys = self
            .indexes
            .iter()
            .chain(self.global_indexes.iter())
            .flat_map(|index| index.keys.keys());
        for key in self.primary.keys().into_iter().chain(index_keys) {
            attributes.insert(key.name.clone(), key.attribute_type);
        }
        attributes
    }
}
