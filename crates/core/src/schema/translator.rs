//! Declarative table declarations to normalized [`TableSchema`] values.

use std::collections::{BTreeMap, BTreeSet};

use super::document::{IndexDeclaration, SchemaDocument, TableDeclaration};
use super::naming::{index_type_name, IndexType};
use super::types::{
    AttributeType, IndexDefinition, IndexKind, KeyDefinition, KeyRole, KeySchema, ProjectionType,
    TableSchema, Throughput,
};
use crate::error::{Result, SyncError};

/// Translates tables of a parsed document.
///
/// The parsed document is kept for the translator's lifetime, but every call
/// to [`SchemaTranslator::translate`] builds a fresh schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaTranslator {
    document: SchemaDocument,
}

impl SchemaTranslator {
    pub fn new(document: SchemaDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn translate(&self, table_name: &str) -> Result<TableSchema> {
        translate(table_name, &self.document)
    }

    /// Declared logical table names, without namespace.
    pub fn table_names(&self) -> Vec<String> {
        self.document.table_names()
    }

    /// Looks up one local or global index of a declared table.
    pub fn table_index(&self, table_name: &str, index_name: &str) -> Result<IndexDefinition> {
        let schema = self.translate(table_name)?;
        schema.index(index_name).cloned().ok_or_else(|| {
            SyncError::Schema(format!(
                "Table '{}' declares no index named '{}'",
                table_name, index_name
            ))
        })
    }
}

/// Translates one table of `document`.
pub fn translate(table_name: &str, document: &SchemaDocument) -> Result<TableSchema> {
    let declaration = document
        .table(table_name)
        .ok_or_else(|| SyncError::unknown_table(table_name))?;

    let attributes = build_attributes(declaration)?;
    let primary = build_key_schema(
        table_name,
        &attributes,
        &declaration.hash_key,
        declaration.range_key.as_deref(),
    )?;

    let indexes = declaration
        .local_secondary_index
        .as_slice()
        .iter()
        .map(|index| build_index(table_name, &attributes, &primary, index, IndexKind::Local))
        .collect::<Result<Vec<_>>>()?;

    let global_indexes = declaration
        .global_secondary_index
        .as_slice()
        .iter()
        .map(|index| build_index(table_name, &attributes, &primary, index, IndexKind::Global))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = BTreeSet::new();
    for index in indexes.iter().chain(global_indexes.iter()) {
        if !seen.insert(index.name.as_str()) {
            return Err(SyncError::Schema(format!(
                "Table '{}' declares index '{}' more than once",
                table_name, index.name
            )));
        }
    }

    Ok(TableSchema {
        name: table_name.to_string(),
        attributes,
        primary,
        indexes,
        global_indexes,
        throughput: Throughput::new(declaration.read_capacity, declaration.write_capacity),
    })
}

/// Later declarations of the same attribute name win.
fn build_attributes(declaration: &TableDeclaration) -> Result<BTreeMap<String, AttributeType>> {
    let mut attributes = BTreeMap::new();
    for attribute in declaration.attribute.as_slice() {
        attributes.insert(attribute.name.clone(), attribute.attribute_type.parse()?);
    }
    Ok(attributes)
}

fn resolve_key(
    table_name: &str,
    attributes: &BTreeMap<String, AttributeType>,
    name: &str,
    role: KeyRole,
) -> Result<KeyDefinition> {
    let attribute_type = attributes.get(name).ok_or_else(|| {
        SyncError::Schema(format!(
            "Table '{}' uses '{}' as {} but declares no such attribute",
            table_name,
            name,
            role.type_name()
        ))
    })?;

    Ok(KeyDefinition {
        name: name.to_string(),
        role,
        attribute_type: *attribute_type,
    })
}

fn build_key_schema(
    table_name: &str,
    attributes: &BTreeMap<String, AttributeType>,
    hash_key: &str,
    range_key: Option<&str>,
) -> Result<KeySchema> {
    let hash = resolve_key(table_name, attributes, hash_key, KeyRole::Hash)?;
    let range = range_key
        .map(|name| resolve_key(table_name, attributes, name, KeyRole::Range))
        .transpose()?;
    Ok(KeySchema::new(hash, range))
}

fn build_index(
    table_name: &str,
    attributes: &BTreeMap<String, AttributeType>,
    primary: &KeySchema,
    declaration: &IndexDeclaration,
    kind: IndexKind,
) -> Result<IndexDefinition> {
    let global = kind == IndexKind::Global;
    let type_name = index_type_name(&declaration.projection_type, global);
    let index_type = IndexType::from_name(&type_name).ok_or_else(|| {
        SyncError::Schema(format!(
            "Index '{}' of table '{}' has unsupported projection type '{}'",
            declaration.name, table_name, declaration.projection_type
        ))
    })?;

    // Local indexes always share the table's hash key.
    let hash_key = match (&declaration.hash_key, kind) {
        (Some(hash_key), _) => hash_key.as_str(),
        (None, IndexKind::Local) => primary.hash.name.as_str(),
        (None, IndexKind::Global) => {
            return Err(SyncError::Schema(format!(
                "Global index '{}' of table '{}' has no hash_key",
                declaration.name, table_name
            )))
        }
    };
    let keys = build_key_schema(
        table_name,
        attributes,
        hash_key,
        declaration.range_key.as_deref(),
    )?;

    let projection = index_type.projection();
    let non_key_attributes = match projection {
        ProjectionType::Include => {
            let names = declaration.non_key_attributes.as_slice().to_vec();
            if names.is_empty() {
                return Err(SyncError::Schema(format!(
                    "Index '{}' of table '{}' projects INCLUDE without non_key_attributes",
                    declaration.name, table_name
                )));
            }
            names
        }
        _ => Vec::new(),
    };

    let throughput = match (kind, declaration.read, declaration.write) {
        (IndexKind::Local, _, _) => None,
        (IndexKind::Global, Some(read), Some(write)) => Some(Throughput::new(read, write)),
        (IndexKind::Global, None, None) => None,
        (IndexKind::Global, _, _) => {
            return Err(SyncError::Schema(format!(
                "Global index '{}' of table '{}' must declare both read and write capacity",
                declaration.name, table_name
            )))
        }
    };

    Ok(IndexDefinition {
        name: declaration.name.clone(),
        kind: index_type.kind(),
        projection,
        non_key_attributes,
        keys,
        throughput,
    })
}
