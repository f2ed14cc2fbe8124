//! Bootstrap facade tying configuration, translation and reconciliation together.

use std::sync::Arc;

use tablesync_core::planning::TablePlan;
use tablesync_core::schema::{
    IndexDefinition, SchemaDocument, SchemaTranslator, TableSchema, Throughput,
};
use tablesync_core::service::{RemoteTable, TableService};
use tablesync_core::{Namespace, Result, RetryPolicy};

use crate::config::Config;
use crate::engine::Reconciler;

/// Entry point for host applications.
///
/// Owns the validated [`Config`], the translator over the declarative
/// document and the reconciler bound to one [`TableService`]. Every table
/// operation takes a logical table name; the namespace is applied here.
#[derive(Clone)]
pub struct SchemaSync {
    config: Config,
    translator: SchemaTranslator,
    reconciler: Reconciler,
}

impl SchemaSync {
    pub fn new(config: Config, document: SchemaDocument, service: Arc<dyn TableService>) -> Self {
        let reconciler = Reconciler::new(service, config.namespace.clone());
        Self {
            config,
            translator: SchemaTranslator::new(document),
            reconciler,
        }
    }

    /// Connects to DynamoDB using the endpoint and credentials from `config`.
    #[cfg(feature = "dynamodb")]
    pub async fn connect(config: Config, document: SchemaDocument) -> Self {
        let service = crate::service::DynamoDbService::connect(&config).await;
        Self::new(config, document, Arc::new(service))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.reconciler = self.reconciler.with_retry_policy(retry);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn namespace(&self) -> &Namespace {
        &self.config.namespace
    }

    pub fn translator(&self) -> &SchemaTranslator {
        &self.translator
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Replaces the declarative document. Later calls translate the new one.
    pub fn set_document(&mut self, document: SchemaDocument) {
        tracing::debug!(tables = document.table_names().len(), "Document replaced");
        self.translator = SchemaTranslator::new(document);
    }

    pub fn physical_name(&self, table_name: &str) -> String {
        self.namespace().physical_name(table_name)
    }

    pub fn logical_name(&self, physical_name: &str) -> String {
        self.namespace().logical_name(physical_name)
    }

    pub fn table_schema(&self, table_name: &str) -> Result<TableSchema> {
        self.translator.translate(table_name)
    }

    pub fn table_index(&self, table_name: &str, index_name: &str) -> Result<IndexDefinition> {
        self.translator.table_index(table_name, index_name)
    }

    /// Logical names of the tables declared in the document.
    pub fn list_table_names(&self) -> Vec<String> {
        self.translator.table_names()
    }

    /// Physical names of every remote table.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.reconciler.list_tables().await
    }

    /// Logical names of the remote tables in this namespace.
    pub async fn list_managed_tables(&self) -> Result<Vec<String>> {
        self.reconciler.list_managed_tables().await
    }

    pub async fn create_table(
        &self,
        table_name: &str,
        throughput: Option<Throughput>,
    ) -> Result<RemoteTable> {
        let schema = self.table_schema(table_name)?;
        self.reconciler.create_table(&schema, throughput).await
    }

    pub async fn update_table(
        &self,
        table_name: &str,
        throughput: Option<Throughput>,
    ) -> Result<RemoteTable> {
        let schema = self.table_schema(table_name)?;
        self.reconciler.update_table(&schema, throughput).await
    }

    pub async fn sync_table(
        &self,
        table_name: &str,
        throughput: Option<Throughput>,
    ) -> Result<RemoteTable> {
        let schema = self.table_schema(table_name)?;
        self.reconciler.sync_table(&schema, throughput).await
    }

    pub async fn plan(&self, table_name: &str, throughput: Option<Throughput>) -> Result<TablePlan> {
        let schema = self.table_schema(table_name)?;
        self.reconciler.plan(&schema, throughput).await
    }
}
