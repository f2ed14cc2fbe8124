//! Pure functions for reconciling a declared schema with a live table.

use std::collections::BTreeSet;

use crate::error::{Result, SyncError};
use crate::schema::{AttributeType, IndexDefinition, KeyRole, TableSchema, Throughput};
use crate::service::RemoteTable;

/// One mutation of a table's global indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexChange {
    /// Declared locally, missing remotely.
    Create(IndexDefinition),
    /// Present on both sides with different declared throughput.
    UpdateThroughput {
        index_name: String,
        from: Option<Throughput>,
        to: Throughput,
    },
    /// Present remotely, no longer declared.
    Delete { index_name: String },
}

impl IndexChange {
    pub fn index_name(&self) -> &str {
        match self {
            IndexChange::Create(index) => &index.name,
            IndexChange::UpdateThroughput { index_name, .. } => index_name,
            IndexChange::Delete { index_name } => index_name,
        }
    }
}

/// Planned changes for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TablePlan {
    /// Table doesn't exist, needs to be created.
    CreateTable {
        table_name: String,
        schema: TableSchema,
        throughput: Throughput,
    },
    /// Table exists with a matching primary schema.
    UpdateTable {
        table_name: String,
        current_throughput: Option<Throughput>,
        throughput: Throughput,
        changes: Vec<IndexChange>,
    },
}

impl TablePlan {
    /// Whether applying the plan would leave the table as it is.
    pub fn is_noop(&self) -> bool {
        match self {
            TablePlan::CreateTable { .. } => false,
            TablePlan::UpdateTable {
                current_throughput,
                throughput,
                changes,
                ..
            } => changes.is_empty() && *current_throughput == Some(*throughput),
        }
    }
}

fn remote_key_set(remote: &RemoteTable) -> BTreeSet<(String, KeyRole, Option<AttributeType>)> {
    remote
        .key_schema
        .iter()
        .map(|key| {
            (
                key.name.clone(),
                key.role,
                remote.attribute_definitions.get(&key.name).copied(),
            )
        })
        .collect()
}

fn describe_remote_keys(remote: &RemoteTable) -> String {
    let keys: Vec<String> = remote
        .key_schema
        .iter()
        .map(|key| {
            let attribute_type = remote
                .attribute_definitions
                .get(&key.name)
                .map(|t| t.code())
                .unwrap_or("?");
            format!("{} {} {}", key.name, key.role.as_str(), attribute_type)
        })
        .collect();
    format!("[{}]", keys.join(", "))
}

/// Checks that the remote primary key matches the declared one.
///
/// Key names, roles and the attribute types of the key attributes are
/// compared as sets. Attribute definitions that only back index keys are
/// not part of the comparison.
pub fn validate_primary_schema(declared: &TableSchema, remote: &RemoteTable) -> Result<()> {
    let declared_keys: BTreeSet<(String, KeyRole, Option<AttributeType>)> = declared
        .primary
        .keys()
        .into_iter()
        .map(|key| (key.name.clone(), key.role, Some(key.attribute_type)))
        .collect();

    if declared_keys != remote_key_set(remote) {
        return Err(SyncError::SchemaMismatch {
            table_name: remote.name.clone(),
            declared: declared.primary.to_string(),
            remote: describe_remote_keys(remote),
        });
    }
    Ok(())
}

/// Diffs declared global indexes against remote ones.
///
/// Creations come first in declaration order, then throughput updates, then
/// deletions in remote order. Indexes without declared throughput are never
/// updated.
pub fn plan_index_changes(declared: &TableSchema, remote: &RemoteTable) -> Vec<IndexChange> {
    let mut creates = Vec::new();
    let mut updates = Vec::new();

    for index in &declared.global_indexes {
        match remote.global_index(&index.name) {
            None => creates.push(IndexChange::Create(index.clone())),
            Some(remote_index) => {
                if let Some(throughput) = index.throughput {
                    if remote_index.throughput != Some(throughput) {
                        updates.push(IndexChange::UpdateThroughput {
                            index_name: index.name.clone(),
                            from: remote_index.throughput,
                            to: throughput,
                        });
                    }
                }
            }
        }
    }

    let deletes = remote
        .global_indexes
        .iter()
        .filter(|index| declared.global_index(&index.name).is_none())
        .map(|index| IndexChange::Delete {
            index_name: index.name.clone(),
        });

    creates.into_iter().chain(updates).chain(deletes).collect()
}

/// Calculates what is needed to bring `current` to `desired`.
///
/// Fails with [`SyncError::SchemaMismatch`] when the table exists with a
/// different primary schema.
pub fn calculate_plan(
    current: Option<&RemoteTable>,
    desired: &TableSchema,
    table_name: &str,
    throughput: Throughput,
) -> Result<TablePlan> {
    match current {
        None => Ok(TablePlan::CreateTable {
            table_name: table_name.to_string(),
            schema: desired.clone(),
            throughput,
        }),
        Some(remote) => {
            validate_primary_schema(desired, remote)?;
            Ok(TablePlan::UpdateTable {
                table_name: table_name.to_string(),
                current_throughput: remote.throughput,
                throughput,
                changes: plan_index_changes(desired, remote),
            })
        }
    }
}

fn format_keys(lines: &mut Vec<String>, indent: &str, index: &IndexDefinition) {
    for key in index.keys.keys() {
        lines.push(format!(
            "{}{}: {} ({})",
            indent,
            key.role.type_name(),
            key.name,
            key.attribute_type
        ));
    }
}

/// Formats a plan for display.
///
/// Lines start with `+` for additions, `~` for updates, `-` for removals
/// and `=` when nothing changes.
pub fn format_plan(plan: &TablePlan) -> Vec<String> {
    match plan {
        TablePlan::CreateTable {
            table_name,
            schema,
            throughput,
        } => {
            let mut lines = vec![format!("+ Create table: {}", table_name)];
            for key in schema.primary.keys() {
                lines.push(format!(
                    "  {}: {} ({})",
                    key.role.type_name(),
                    key.name,
                    key.attribute_type
                ));
            }
            lines.push(format!("  Throughput: {}", throughput));
            for index in &schema.indexes {
                lines.push(format!("  + {}: {}", index.index_type().name(), index.name));
                format_keys(&mut lines, "    ", index);
            }
            for index in &schema.global_indexes {
                lines.push(format!("  + {}: {}", index.index_type().name(), index.name));
                format_keys(&mut lines, "    ", index);
                if let Some(index_throughput) = index.throughput {
                    lines.push(format!("    Throughput: {}", index_throughput));
                }
            }
            lines
        }
        TablePlan::UpdateTable { table_name, .. } if plan.is_noop() => {
            vec![format!("= Table '{}' is up to date", table_name)]
        }
        TablePlan::UpdateTable {
            table_name,
            current_throughput,
            throughput,
            changes,
        } => {
            let mut lines = vec![format!("~ Update table: {}", table_name)];
            match current_throughput {
                Some(current) if current == throughput => {
                    lines.push(format!("  = Throughput: {}", throughput));
                }
                Some(current) => {
                    lines.push(format!("  ~ Throughput: {} -> {}", current, throughput));
                }
                None => lines.push(format!("  ~ Throughput: {}", throughput)),
            }
            for change in changes {
                match change {
                    IndexChange::Create(index) => {
                        lines.push(format!("  + Add {}: {}", index.index_type().name(), index.name));
                        format_keys(&mut lines, "    ", index);
                    }
                    IndexChange::UpdateThroughput {
                        index_name,
                        from,
                        to,
                    } => match from {
                        Some(from) => lines.push(format!(
                            "  ~ Update GSI throughput: {} ({} -> {})",
                            index_name, from, to
                        )),
                        None => lines.push(format!(
                            "  ~ Update GSI throughput: {} ({})",
                            index_name, to
                        )),
                    },
                    IndexChange::Delete { index_name } => {
                        lines.push(format!("  - Delete GSI: {}", index_name));
                    }
                }
            }
            lines
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::schema::{IndexKind, KeyDefinition, KeySchema, ProjectionType};
    use crate::service::{IndexStatus, RemoteIndex, RemoteKey, TableStatus};

    fn global_index(name: &str, hash: &str, throughput: Option<Throughput>) -> IndexDefinition {
        IndexDefinition {
            name: name.to_string(),
            kind: IndexKind::Global,
            projection: ProjectionType::All,
            non_key_attributes: Vec::new(),
            keys: KeySchema::new(KeyDefinition::hash(hash, AttributeType::Number), None),
            throughput,
        }
    }

    fn declared(global_indexes: Vec<IndexDefinition>) -> TableSchema {
        let mut attributes = BTreeMap::new();
        attributes.insert("carelog_id".to_string(), AttributeType::Number);
        attributes.insert("time".to_string(), AttributeType::Number);
        TableSchema {
            name: "change_in_condition".to_string(),
            attributes,
            primary: KeySchema::new(
                KeyDefinition::hash("carelog_id", AttributeType::Number),
                Some(KeyDefinition::range("time", AttributeType::Number)),
            ),
            indexes: Vec::new(),
            global_indexes,
            throughput: Throughput::new(10, 10),
        }
    }

    fn remote_index(name: &str, throughput: Throughput) -> RemoteIndex {
        RemoteIndex {
            name: name.to_string(),
            key_schema: vec![RemoteKey::new(name.to_lowercase(), KeyRole::Hash)],
            throughput: Some(throughput),
            status: IndexStatus::Active,
        }
    }

    fn remote(keys: Vec<(&str, KeyRole, AttributeType)>, indexes: Vec<RemoteIndex>) -> RemoteTable {
        RemoteTable {
            name: "dev_change_in_condition".to_string(),
            status: TableStatus::Active,
            key_schema: keys
                .iter()
                .map(|(name, role, _)| RemoteKey::new(*name, *role))
                .collect(),
            attribute_definitions: keys
                .iter()
                .map(|(name, _, attribute_type)| (name.to_string(), *attribute_type))
                .collect(),
            throughput: Some(Throughput::new(10, 10)),
            local_indexes: Vec::new(),
            global_indexes: indexes,
        }
    }

    fn matching_remote(indexes: Vec<RemoteIndex>) -> RemoteTable {
        remote(
            vec![
                ("carelog_id", KeyRole::Hash, AttributeType::Number),
                ("time", KeyRole::Range, AttributeType::Number),
            ],
            indexes,
        )
    }

    // ==================== Primary Schema Validation ====================

    #[test]
    fn test_validate_matching_schema() {
        let remote = matching_remote(Vec::new());
        assert!(validate_primary_schema(&declared(Vec::new()), &remote).is_ok());
    }

    #[test]
    fn test_validate_ignores_key_order() {
        let remote = remote(
            vec![
                ("time", KeyRole::Range, AttributeType::Number),
                ("carelog_id", KeyRole::Hash, AttributeType::Number),
            ],
            Vec::new(),
        );
        assert!(validate_primary_schema(&declared(Vec::new()), &remote).is_ok());
    }

    #[test]
    fn test_validate_ignores_index_only_attributes() {
        let mut remote = matching_remote(Vec::new());
        remote
            .attribute_definitions
            .insert("saved_in_rdb".to_string(), AttributeType::Number);
        assert!(validate_primary_schema(&declared(Vec::new()), &remote).is_ok());
    }

    #[test]
    fn test_validate_different_hash_key() {
        let remote = remote(
            vec![
                ("id", KeyRole::Hash, AttributeType::Number),
                ("time", KeyRole::Range, AttributeType::Number),
            ],
            Vec::new(),
        );
        let result = validate_primary_schema(&declared(Vec::new()), &remote);
        match result {
            Err(SyncError::SchemaMismatch {
                table_name,
                declared,
                remote,
            }) => {
                assert_eq!(table_name, "dev_change_in_condition");
                assert_eq!(declared, "[carelog_id HASH N, time RANGE N]");
                assert_eq!(remote, "[id HASH N, time RANGE N]");
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_different_attribute_type() {
        let remote = remote(
            vec![
                ("carelog_id", KeyRole::Hash, AttributeType::String),
                ("time", KeyRole::Range, AttributeType::Number),
            ],
            Vec::new(),
        );
        let result = validate_primary_schema(&declared(Vec::new()), &remote);
        assert!(matches!(result, Err(SyncError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_validate_swapped_roles() {
        let remote = remote(
            vec![
                ("carelog_id", KeyRole::Range, AttributeType::Number),
                ("time", KeyRole::Hash, AttributeType::Number),
            ],
            Vec::new(),
        );
        let result = validate_primary_schema(&declared(Vec::new()), &remote);
        assert!(matches!(result, Err(SyncError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_validate_missing_range_key() {
        let remote = remote(
            vec![("carelog_id", KeyRole::Hash, AttributeType::Number)],
            Vec::new(),
        );
        let result = validate_primary_schema(&declared(Vec::new()), &remote);
        assert!(matches!(result, Err(SyncError::SchemaMismatch { .. })));
    }

    // ==================== Index Diff ====================

    #[test]
    fn test_plan_equal_throughput_is_noop() {
        let schema = declared(vec![global_index(
            "SavedInRDB",
            "saved_in_rdb",
            Some(Throughput::new(15, 15)),
        )]);
        let remote = matching_remote(vec![remote_index("SavedInRDB", Throughput::new(15, 15))]);

        assert!(plan_index_changes(&schema, &remote).is_empty());
    }

    #[test]
    fn test_plan_undeclared_throughput_is_skipped() {
        let schema = declared(vec![global_index("SavedInRDB", "saved_in_rdb", None)]);
        let remote = matching_remote(vec![remote_index("SavedInRDB", Throughput::new(15, 15))]);

        assert!(plan_index_changes(&schema, &remote).is_empty());
    }

    #[test]
    fn test_plan_create_update_delete() {
        let schema = declared(vec![
            global_index("SavedInRDB", "saved_in_rdb", Some(Throughput::new(5, 5))),
            global_index("ByCaregiver", "caregiver_id", Some(Throughput::new(5, 5))),
        ]);
        let remote = matching_remote(vec![
            remote_index("SavedInRDB", Throughput::new(10, 10)),
            remote_index("Obsolete", Throughput::new(10, 10)),
        ]);

        let changes = plan_index_changes(&schema, &remote);
        assert_eq!(changes.len(), 3);
        assert!(matches!(&changes[0], IndexChange::Create(index) if index.name == "ByCaregiver"));
        assert_eq!(
            changes[1],
            IndexChange::UpdateThroughput {
                index_name: "SavedInRDB".to_string(),
                from: Some(Throughput::new(10, 10)),
                to: Throughput::new(5, 5),
            }
        );
        assert_eq!(
            changes[2],
            IndexChange::Delete {
                index_name: "Obsolete".to_string()
            }
        );
    }

    // ==================== Plans ====================

    #[test]
    fn test_calculate_plan_absent_table() {
        let schema = declared(Vec::new());
        let plan = calculate_plan(None, &schema, "dev_change_in_condition", Throughput::new(10, 10))
            .unwrap();
        assert!(matches!(plan, TablePlan::CreateTable { .. }));
        assert!(!plan.is_noop());
    }

    #[test]
    fn test_calculate_plan_rejects_mismatch() {
        let remote = remote(
            vec![("id", KeyRole::Hash, AttributeType::Number)],
            Vec::new(),
        );
        let result = calculate_plan(
            Some(&remote),
            &declared(Vec::new()),
            "dev_change_in_condition",
            Throughput::new(10, 10),
        );
        assert!(matches!(result, Err(SyncError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_format_up_to_date() {
        let remote = matching_remote(Vec::new());
        let plan = calculate_plan(
            Some(&remote),
            &declared(Vec::new()),
            "dev_change_in_condition",
            Throughput::new(10, 10),
        )
        .unwrap();
        assert!(plan.is_noop());
        assert_eq!(
            format_plan(&plan),
            vec!["= Table 'dev_change_in_condition' is up to date"]
        );
    }

    #[test]
    fn test_format_update_plan() {
        let schema = declared(vec![global_index(
            "ByCaregiver",
            "caregiver_id",
            Some(Throughput::new(5, 5)),
        )]);
        let remote = matching_remote(vec![remote_index("Obsolete", Throughput::new(1, 1))]);
        let plan = calculate_plan(
            Some(&remote),
            &schema,
            "dev_change_in_condition",
            Throughput::new(20, 10),
        )
        .unwrap();

        let lines = format_plan(&plan);
        assert_eq!(lines[0], "~ Update table: dev_change_in_condition");
        assert_eq!(
            lines[1],
            "  ~ Throughput: read=10, write=10 -> read=20, write=10"
        );
        assert_eq!(lines[2], "  + Add GlobalAllIndex: ByCaregiver");
        assert_eq!(lines[3], "    HashKey: caregiver_id (N)");
        assert_eq!(lines[4], "  - Delete GSI: Obsolete");
    }

    #[test]
    fn test_format_create_plan() {
        let schema = declared(vec![global_index(
            "ByCaregiver",
            "caregiver_id",
            Some(Throughput::new(5, 5)),
        )]);
        let plan = calculate_plan(None, &schema, "dev_change_in_condition", Throughput::new(10, 10))
            .unwrap();

        let lines = format_plan(&plan);
        assert_eq!(lines[0], "+ Create table: dev_change_in_condition");
        assert_eq!(lines[1], "  HashKey: carelog_id (N)");
        assert_eq!(lines[2], "  RangeKey: time (N)");
        assert_eq!(lines[3], "  Throughput: read=10, write=10");
        assert_eq!(lines[4], "  + GlobalAllIndex: ByCaregiver");
        assert_eq!(lines[5], "    HashKey: caregiver_id (N)");
        assert_eq!(lines[6], "    Throughput: read=5, write=5");
    }
}
