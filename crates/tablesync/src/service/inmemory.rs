//! In-memory table service.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use tablesync_core::schema::{IndexDefinition, TableSchema, Throughput};
use tablesync_core::service::{
    RemoteIndex, RemoteTable, ServiceError, ServiceErrorKind, ServiceResult, TableService,
};

/// Operations of the [`TableService`] trait, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOperation {
    DescribeTable,
    CreateTable,
    UpdateThroughput,
    CreateGlobalIndex,
    UpdateGlobalIndex,
    DeleteGlobalIndex,
    ListTables,
}

/// A recorded call against the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    DescribeTable {
        table_name: String,
    },
    CreateTable {
        table_name: String,
        throughput: Throughput,
    },
    UpdateThroughput {
        table_name: String,
        throughput: Throughput,
    },
    CreateGlobalIndex {
        table_name: String,
        index_name: String,
        throughput: Throughput,
    },
    UpdateGlobalIndex {
        table_name: String,
        index_name: String,
        throughput: Throughput,
    },
    DeleteGlobalIndex {
        table_name: String,
        index_name: String,
    },
    ListTables,
}

impl ServiceCall {
    pub fn operation(&self) -> ServiceOperation {
        match self {
            ServiceCall::DescribeTable { .. } => ServiceOperation::DescribeTable,
            ServiceCall::CreateTable { .. } => ServiceOperation::CreateTable,
            ServiceCall::UpdateThroughput { .. } => ServiceOperation::UpdateThroughput,
            ServiceCall::CreateGlobalIndex { .. } => ServiceOperation::CreateGlobalIndex,
            ServiceCall::UpdateGlobalIndex { .. } => ServiceOperation::UpdateGlobalIndex,
            ServiceCall::DeleteGlobalIndex { .. } => ServiceOperation::DeleteGlobalIndex,
            ServiceCall::ListTables => ServiceOperation::ListTables,
        }
    }

    /// Whether the call changes remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            ServiceCall::DescribeTable { .. } | ServiceCall::ListTables
        )
    }
}

/// In-memory stand-in for the remote table service.
///
/// Uses maps wrapped in `Arc<RwLock<_>>` for thread-safe access. Index
/// changes take effect immediately. Every call is recorded, and failures can
/// be queued per operation to simulate the remote's transient errors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableService {
    tables: Arc<RwLock<HashMap<String, RemoteTable>>>,
    calls: Arc<Mutex<Vec<ServiceCall>>>,
    failures: Arc<Mutex<HashMap<ServiceOperation, VecDeque<ServiceError>>>>,
}

impl InMemoryTableService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a table as if it already existed remotely.
    pub async fn insert_table(&self, table: RemoteTable) {
        let mut tables = self.tables.write().await;
        tables.insert(table.name.clone(), table);
    }

    pub async fn table(&self, table_name: &str) -> Option<RemoteTable> {
        let tables = self.tables.read().await;
        tables.get(table_name).cloned()
    }

    /// Makes the next call of `operation` fail with `error`.
    ///
    /// Queued failures are consumed in order, one per call.
    pub async fn fail_next(&self, operation: ServiceOperation, error: ServiceError) {
        let mut failures = self.failures.lock().await;
        failures.entry(operation).or_default().push_back(error);
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().await.clone()
    }

    /// Number of calls made for one operation.
    pub async fn call_count(&self, operation: ServiceOperation) -> usize {
        let calls = self.calls.lock().await;
        calls.iter().filter(|call| call.operation() == operation).count()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, call: ServiceCall) -> ServiceResult<()> {
        let operation = call.operation();
        self.calls.lock().await.push(call);

        let mut failures = self.failures.lock().await;
        match failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn table_not_found(table_name: &str) -> ServiceError {
    ServiceError::not_found(format!(
        "Requested resource not found: Table: {} not found",
        table_name
    ))
}

fn index_not_found(index_name: &str) -> ServiceError {
    ServiceError::not_found(format!(
        "Requested resource not found: Index: {} not found",
        index_name
    ))
}

#[async_trait]
impl TableService for InMemoryTableService {
    async fn describe_table(&self, table_name: &str) -> ServiceResult<Option<RemoteTable>> {
        self.record(ServiceCall::DescribeTable {
            table_name: table_name.to_string(),
        })
        .await?;

        Ok(self.table(table_name).await)
    }

    async fn create_table(
        &self,
        table_name: &str,
        schema: &TableSchema,
        throughput: Throughput,
    ) -> ServiceResult<RemoteTable> {
        self.record(ServiceCall::CreateTable {
            table_name: table_name.to_string(),
            throughput,
        })
        .await?;

        let mut tables = self.tables.write().await;
        if tables.contains_key(table_name) {
            return Err(ServiceError::already_exists(format!(
                "Table already exists: {}",
                table_name
            )));
        }
        let table = RemoteTable::from_schema(table_name, schema, throughput);
        tables.insert(table_name.to_string(), table.clone());
        Ok(table)
    }

    async fn update_throughput(
        &self,
        table_name: &str,
        throughput: Throughput,
    ) -> ServiceResult<()> {
        self.record(ServiceCall::UpdateThroughput {
            table_name: table_name.to_string(),
            throughput,
        })
        .await?;

        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;
        table.throughput = Some(throughput);
        Ok(())
    }

    async fn create_global_index(
        &self,
        table_name: &str,
        index: &IndexDefinition,
        throughput: Throughput,
    ) -> ServiceResult<()> {
        self.record(ServiceCall::CreateGlobalIndex {
            table_name: table_name.to_string(),
            index_name: index.name.clone(),
            throughput,
        })
        .await?;

        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;
        if table.global_index(&index.name).is_some() {
            return Err(ServiceError::new(
                ServiceErrorKind::Validation,
                "Attempting to create an index which already exists",
            ));
        }
        for key in index.keys.keys() {
            table
                .attribute_definitions
                .insert(key.name.clone(), key.attribute_type);
        }
        table
            .global_indexes
            .push(RemoteIndex::from_definition(index, throughput));
        Ok(())
    }

    async fn update_global_index(
        &self,
        table_name: &str,
        index_name: &str,
        throughput: Throughput,
    ) -> ServiceResult<()> {
        self.record(ServiceCall::UpdateGlobalIndex {
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
            throughput,
        })
        .await?;

        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;
        let index = table
            .global_indexes
            .iter_mut()
            .find(|index| index.name == index_name)
            .ok_or_else(|| index_not_found(index_name))?;
        index.throughput = Some(throughput);
        Ok(())
    }

    async fn delete_global_index(&self, table_name: &str, index_name: &str) -> ServiceResult<()> {
        self.record(ServiceCall::DeleteGlobalIndex {
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        })
        .await?;

        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| table_not_found(table_name))?;
        let before = table.global_indexes.len();
        table.global_indexes.retain(|index| index.name != index_name);
        if table.global_indexes.len() == before {
            return Err(index_not_found(index_name));
        }
        Ok(())
    }

    async fn list_tables(&self) -> ServiceResult<Vec<String>> {
        self.record(ServiceCall::ListTables).await?;

        let tables = self.tables.read().await;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tablesync_core::schema::{
        AttributeType, IndexKind, KeyDefinition, KeySchema, ProjectionType,
    };

    use super::*;

    fn schema() -> TableSchema {
        TableSchema {
            name: "users".to_string(),
            attributes: BTreeMap::from([("id".to_string(), AttributeType::String)]),
            primary: KeySchema::new(KeyDefinition::hash("id", AttributeType::String), None),
            indexes: Vec::new(),
            global_indexes: Vec::new(),
            throughput: Throughput::default(),
        }
    }

    fn index(name: &str) -> IndexDefinition {
        IndexDefinition {
            name: name.to_string(),
            kind: IndexKind::Global,
            projection: ProjectionType::KeysOnly,
            non_key_attributes: Vec::new(),
            keys: KeySchema::new(KeyDefinition::hash("email", AttributeType::String), None),
            throughput: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_describe() {
        let service = InMemoryTableService::new();
        service
            .create_table("dev_users", &schema(), Throughput::new(3, 4))
            .await
            .unwrap();

        let table = service.describe_table("dev_users").await.unwrap().unwrap();
        assert_eq!(table.throughput, Some(Throughput::new(3, 4)));
        assert!(service.describe_table("dev_other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_twice_collides() {
        let service = InMemoryTableService::new();
        service
            .create_table("dev_users", &schema(), Throughput::default())
            .await
            .unwrap();
        let err = service
            .create_table("dev_users", &schema(), Throughput::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ServiceErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_global_index_lifecycle() {
        let service = InMemoryTableService::new();
        service
            .create_table("dev_users", &schema(), Throughput::default())
            .await
            .unwrap();

        service
            .create_global_index("dev_users", &index("ByEmail"), Throughput::new(1, 1))
            .await
            .unwrap();
        let duplicate = service
            .create_global_index("dev_users", &index("ByEmail"), Throughput::new(1, 1))
            .await
            .unwrap_err();
        assert!(duplicate.is_already_exists());

        let table = service.table("dev_users").await.unwrap();
        assert_eq!(
            table.attribute_definitions.get("email"),
            Some(&AttributeType::String)
        );

        service
            .update_global_index("dev_users", "ByEmail", Throughput::new(2, 2))
            .await
            .unwrap();
        let table = service.table("dev_users").await.unwrap();
        assert_eq!(
            table.global_index("ByEmail").unwrap().throughput,
            Some(Throughput::new(2, 2))
        );

        service
            .delete_global_index("dev_users", "ByEmail")
            .await
            .unwrap();
        let gone = service
            .delete_global_index("dev_users", "ByEmail")
            .await
            .unwrap_err();
        assert!(gone.is_not_found());
    }

    #[tokio::test]
    async fn test_scripted_failures_are_consumed_in_order() {
        let service = InMemoryTableService::new();
        service
            .fail_next(
                ServiceOperation::ListTables,
                ServiceError::new(ServiceErrorKind::Throttled, "first"),
            )
            .await;

        let err = service.list_tables().await.unwrap_err();
        assert_eq!(err.message, "first");
        assert!(service.list_tables().await.unwrap().is_empty());
        assert_eq!(service.call_count(ServiceOperation::ListTables).await, 2);
    }

    #[tokio::test]
    async fn test_calls_are_recorded() {
        let service = InMemoryTableService::new();
        service.describe_table("dev_users").await.unwrap();
        service.list_tables().await.unwrap();

        let calls = service.calls().await;
        assert_eq!(
            calls,
            vec![
                ServiceCall::DescribeTable {
                    table_name: "dev_users".to_string()
                },
                ServiceCall::ListTables,
            ]
        );
        assert!(calls.iter().all(|call| !call.is_mutation()));

        service.clear_calls().await;
        assert!(service.calls().await.is_empty());
    }
}
