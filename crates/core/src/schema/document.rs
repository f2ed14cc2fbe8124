//! Declarative schema document.
//!
//! The document is the already-parsed infrastructure tree:
//! `resource -> aws_dynamodb_table -> <table name> -> body`. Repeated blocks
//! (attributes, indexes) may show up either as a single object or as a
//! sequence depending on how many were declared, so both shapes are accepted.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::types::DEFAULT_CAPACITY_UNITS;
use crate::error::{Result, SyncError};

/// Resource kind holding table declarations.
pub const TABLE_RESOURCE_KIND: &str = "aws_dynamodb_table";

/// A block declared once (scalar) or several times (sequence).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item),
            OneOrMany::Many(items) => items,
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

/// `attribute { name = ..., type = ... }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttributeDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
}

/// A local or global secondary index block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexDeclaration {
    pub name: String,
    #[serde(default)]
    pub hash_key: Option<String>,
    #[serde(default)]
    pub range_key: Option<String>,
    pub projection_type: String,
    #[serde(default)]
    pub non_key_attributes: OneOrMany<String>,
    #[serde(default, alias = "read_capacity")]
    pub read: Option<i64>,
    #[serde(default, alias = "write_capacity")]
    pub write: Option<i64>,
}

fn default_capacity() -> i64 {
    DEFAULT_CAPACITY_UNITS
}

/// Body of one `aws_dynamodb_table` resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableDeclaration {
    #[serde(default)]
    pub attribute: OneOrMany<AttributeDeclaration>,
    pub hash_key: String,
    #[serde(default)]
    pub range_key: Option<String>,
    #[serde(default = "default_capacity")]
    pub read_capacity: i64,
    #[serde(default = "default_capacity")]
    pub write_capacity: i64,
    #[serde(default)]
    pub local_secondary_index: OneOrMany<IndexDeclaration>,
    #[serde(default)]
    pub global_secondary_index: OneOrMany<IndexDeclaration>,
}

/// Table declarations keyed by logical table name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDocument {
    tables: BTreeMap<String, TableDeclaration>,
}

impl SchemaDocument {
    /// Extracts the table declarations from a parsed document tree.
    ///
    /// Resource kinds other than [`TABLE_RESOURCE_KIND`] are ignored, and a
    /// tree without a `resource` key yields an empty document.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| SyncError::Schema("Schema document must be an object".to_string()))?;

        let mut tables = BTreeMap::new();
        let Some(resources) = root.get("resource") else {
            return Ok(Self { tables });
        };

        for resource in objects(resources, "resource")? {
            let Some(kind) = resource.get(TABLE_RESOURCE_KIND) else {
                continue;
            };
            for declarations in objects(kind, TABLE_RESOURCE_KIND)? {
                for (name, body) in declarations {
                    let declaration: TableDeclaration = serde_json::from_value(body.clone())
                        .map_err(|e| {
                            SyncError::Schema(format!("Invalid declaration for table '{}': {}", name, e))
                        })?;
                    tables.insert(name.clone(), declaration);
                }
            }
        }

        Ok(Self { tables })
    }

    /// Parses a JSON rendering of the document tree.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| SyncError::Schema(format!("Invalid schema document: {}", e)))?;
        Self::from_value(&value)
    }

    /// Adds or replaces a table declaration.
    pub fn with_table(mut self, name: impl Into<String>, declaration: TableDeclaration) -> Self {
        self.tables.insert(name.into(), declaration);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableDeclaration> {
        self.tables.get(name)
    }

    /// Declared logical table names, sorted.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// A block that is either one object or a sequence of objects.
fn objects<'a>(value: &'a Value, block: &str) -> Result<Vec<&'a Map<String, Value>>> {
    match value {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| {
                    SyncError::Schema(format!("Block '{}' must contain objects", block))
                })
            })
            .collect(),
        _ => Err(SyncError::Schema(format!(
            "Block '{}' must be an object or a sequence",
            block
        ))),
    }
}
