use async_trait::async_trait;

use crate::schema::{IndexDefinition, TableSchema, Throughput};

use super::{RemoteTable, ServiceResult};

/// The remote table-storage service.
///
/// All table names are physical (namespaced) names. Index creation and
/// deletion are asynchronous on the remote side: a call may be rejected
/// while a previous index change is still being applied.
#[async_trait]
pub trait TableService: Send + Sync {
    /// Describes a table, `None` when it does not exist.
    async fn describe_table(&self, table_name: &str) -> ServiceResult<Option<RemoteTable>>;

    /// Creates a table with its key schema, local and global indexes.
    async fn create_table(
        &self,
        table_name: &str,
        schema: &TableSchema,
        throughput: Throughput,
    ) -> ServiceResult<RemoteTable>;

    /// Sets the table's provisioned throughput.
    async fn update_throughput(&self, table_name: &str, throughput: Throughput)
        -> ServiceResult<()>;

    /// Starts building a new global index.
    async fn create_global_index(
        &self,
        table_name: &str,
        index: &IndexDefinition,
        throughput: Throughput,
    ) -> ServiceResult<()>;

    /// Sets the provisioned throughput of one global index.
    async fn update_global_index(
        &self,
        table_name: &str,
        index_name: &str,
        throughput: Throughput,
    ) -> ServiceResult<()>;

    /// Starts deleting a global index.
    async fn delete_global_index(&self, table_name: &str, index_name: &str) -> ServiceResult<()>;

    /// Lists every physical table name visible to the connection.
    async fn list_tables(&self) -> ServiceResult<Vec<String>>;
}
