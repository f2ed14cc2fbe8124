//! Applies declared table schemas to the remote service (Imperative Shell).

use std::sync::Arc;

use tablesync_core::planning::{self, IndexChange, TablePlan};
use tablesync_core::schema::{TableSchema, Throughput};
use tablesync_core::service::{RemoteTable, ServiceError, TableService};
use tablesync_core::{Namespace, Result, RetryPolicy, SyncError};

use super::retry::retry_convergent;

/// Creates tables and reconciles their global indexes and throughput.
///
/// Remote calls are made one at a time. Concurrent reconciliation of the
/// same table is not coordinated here; callers must serialize it.
#[derive(Clone)]
pub struct Reconciler {
    service: Arc<dyn TableService>,
    namespace: Namespace,
    retry: RetryPolicy,
}

impl Reconciler {
    pub fn new(service: Arc<dyn TableService>, namespace: Namespace) -> Self {
        Self {
            service,
            namespace,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry schedule used for index creation and deletion.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Creates the table described by `schema`.
    ///
    /// `throughput` defaults to the declared table throughput. A name
    /// collision fails with [`SyncError::TableAlreadyExists`]; there is no
    /// retry.
    pub async fn create_table(
        &self,
        schema: &TableSchema,
        throughput: Option<Throughput>,
    ) -> Result<RemoteTable> {
        let table_name = self.namespace.physical_name(&schema.name);
        let throughput = throughput.unwrap_or(schema.throughput);

        match self
            .service
            .create_table(&table_name, schema, throughput)
            .await
        {
            Ok(table) => {
                tracing::info!(table = %table_name, %throughput, "Table created");
                Ok(table)
            }
            Err(err) if err.is_already_exists() || err.is_in_use() => {
                tracing::warn!(table = %table_name, error = %err, "Table already exists");
                Err(SyncError::TableAlreadyExists {
                    table_name,
                    message: err.message,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Reconciles an existing table with `schema`.
    ///
    /// The primary schema is validated before anything is changed. Then the
    /// table throughput is set and the global indexes are created, updated
    /// and deleted one by one. The first failing index change aborts the
    /// rest; earlier changes are kept, so the call can simply be repeated.
    pub async fn update_table(
        &self,
        schema: &TableSchema,
        throughput: Option<Throughput>,
    ) -> Result<RemoteTable> {
        let table_name = self.namespace.physical_name(&schema.name);
        let remote = self.describe_existing(&table_name).await?;

        if let Err(err) = planning::validate_primary_schema(schema, &remote) {
            tracing::error!(table = %table_name, error = %err, "Primary schema mismatch");
            return Err(err);
        }

        let throughput = throughput.unwrap_or(schema.throughput);
        self.service
            .update_throughput(&table_name, throughput)
            .await?;
        tracing::info!(table = %table_name, %throughput, "Throughput updated");

        for change in planning::plan_index_changes(schema, &remote) {
            self.apply_change(&table_name, &change, throughput).await?;
        }

        self.describe_existing(&table_name).await
    }

    /// Creates the table when it is absent, otherwise updates it.
    pub async fn sync_table(
        &self,
        schema: &TableSchema,
        throughput: Option<Throughput>,
    ) -> Result<RemoteTable> {
        let table_name = self.namespace.physical_name(&schema.name);
        match self.service.describe_table(&table_name).await? {
            None => self.create_table(schema, throughput).await,
            Some(_) => self.update_table(schema, throughput).await,
        }
    }

    /// Calculates the changes `sync_table` would make, without making them.
    pub async fn plan(
        &self,
        schema: &TableSchema,
        throughput: Option<Throughput>,
    ) -> Result<TablePlan> {
        let table_name = self.namespace.physical_name(&schema.name);
        let current = self.service.describe_table(&table_name).await?;
        planning::calculate_plan(
            current.as_ref(),
            schema,
            &table_name,
            throughput.unwrap_or(schema.throughput),
        )
    }

    /// Every physical table name on the remote.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.service.list_tables().await?)
    }

    /// Logical names of the remote tables that carry this namespace.
    pub async fn list_managed_tables(&self) -> Result<Vec<String>> {
        let tables = self.list_tables().await?;
        Ok(tables
            .iter()
            .filter(|name| self.namespace.owns(name))
            .map(|name| self.namespace.logical_name(name))
            .collect())
    }

    async fn describe_existing(&self, table_name: &str) -> Result<RemoteTable> {
        self.service
            .describe_table(table_name)
            .await?
            .ok_or_else(|| {
                tracing::warn!(table = %table_name, "Table does not exist");
                SyncError::unknown_table(table_name)
            })
    }

    async fn apply_change(
        &self,
        table_name: &str,
        change: &IndexChange,
        table_throughput: Throughput,
    ) -> Result<()> {
        let service = self.service.as_ref();

        match change {
            IndexChange::Create(index) => {
                let throughput = index.throughput.unwrap_or(table_throughput);
                retry_convergent(
                    &self.retry,
                    "create_global_index",
                    ServiceError::is_already_exists,
                    move || service.create_global_index(table_name, index, throughput),
                )
                .await?;
                tracing::info!(table = %table_name, index = %index.name, %throughput, "Global index created");
            }
            IndexChange::UpdateThroughput { index_name, to, .. } => {
                service
                    .update_global_index(table_name, index_name, *to)
                    .await?;
                tracing::info!(table = %table_name, index = %index_name, throughput = %to, "Global index throughput updated");
            }
            IndexChange::Delete { index_name } => {
                retry_convergent(
                    &self.retry,
                    "delete_global_index",
                    ServiceError::is_not_found,
                    move || service.delete_global_index(table_name, index_name),
                )
                .await?;
                tracing::info!(table = %table_name, index = %index_name, "Global index deleted");
            }
        }
        Ok(())
    }
}
