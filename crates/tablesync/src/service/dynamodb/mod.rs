//! DynamoDB-backed [`TableService`].

mod client;
mod conversions;
mod error;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    CreateGlobalSecondaryIndexAction, DeleteGlobalSecondaryIndexAction,
    GlobalSecondaryIndexUpdate, UpdateGlobalSecondaryIndexAction,
};
use aws_sdk_dynamodb::Client;

use tablesync_core::schema::{IndexDefinition, TableSchema, Throughput};
use tablesync_core::service::{RemoteTable, ServiceResult, TableService};

use crate::config::Config;

pub use client::create_client;
use error::{is_missing_table, is_unchanged_throughput, map_build_error, map_sdk_error};

/// Table service talking to DynamoDB (or a DynamoDB-compatible endpoint).
#[derive(Debug, Clone)]
pub struct DynamoDbService {
    client: Client,
}

impl DynamoDbService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects with the credentials, region and endpoint from `config`.
    pub async fn connect(config: &Config) -> Self {
        Self::new(create_client(config).await)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn update_index(
        &self,
        table_name: &str,
        update: GlobalSecondaryIndexUpdate,
        attribute_definitions: Option<Vec<aws_sdk_dynamodb::types::AttributeDefinition>>,
    ) -> ServiceResult<()> {
        self.client
            .update_table()
            .table_name(table_name)
            .set_attribute_definitions(attribute_definitions)
            .global_secondary_index_updates(update)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }
}

#[async_trait]
impl TableService for DynamoDbService {
    async fn describe_table(&self, table_name: &str) -> ServiceResult<Option<RemoteTable>> {
        match self.client.describe_table().table_name(table_name).send().await {
            Ok(response) => Ok(response.table().map(conversions::remote_table)),
            Err(err) => {
                let err = map_sdk_error(err);
                if is_missing_table(&err) {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn create_table(
        &self,
        table_name: &str,
        schema: &TableSchema,
        throughput: Throughput,
    ) -> ServiceResult<RemoteTable> {
        let local_indexes = schema
            .indexes
            .iter()
            .map(conversions::local_index)
            .collect::<ServiceResult<Vec<_>>>()?;
        let global_indexes = schema
            .global_indexes
            .iter()
            .map(|index| {
                conversions::global_index(index, index.throughput.unwrap_or(throughput))
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        // Empty index lists are rejected, so they are left out entirely.
        let response = self
            .client
            .create_table()
            .table_name(table_name)
            .set_key_schema(Some(conversions::key_schema(&schema.primary)?))
            .set_attribute_definitions(Some(conversions::attribute_definitions(
                &schema.key_attributes(),
            )?))
            .provisioned_throughput(conversions::provisioned_throughput(throughput)?)
            .set_local_secondary_indexes(Some(local_indexes).filter(|list| !list.is_empty()))
            .set_global_secondary_indexes(Some(global_indexes).filter(|list| !list.is_empty()))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(response
            .table_description()
            .map(conversions::remote_table)
            .unwrap_or_else(|| RemoteTable::from_schema(table_name, schema, throughput)))
    }

    async fn update_throughput(
        &self,
        table_name: &str,
        throughput: Throughput,
    ) -> ServiceResult<()> {
        let result = self
            .client
            .update_table()
            .table_name(table_name)
            .provisioned_throughput(conversions::provisioned_throughput(throughput)?)
            .send()
            .await;

        match result.map_err(map_sdk_error) {
            Ok(_) => Ok(()),
            Err(err) if is_unchanged_throughput(&err) => {
                tracing::debug!(table = %table_name, %throughput, "Throughput already set");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn create_global_index(
        &self,
        table_name: &str,
        index: &IndexDefinition,
        throughput: Throughput,
    ) -> ServiceResult<()> {
        let action = CreateGlobalSecondaryIndexAction::builder()
            .index_name(&index.name)
            .set_key_schema(Some(conversions::key_schema(&index.keys)?))
            .projection(conversions::projection(index))
            .provisioned_throughput(conversions::provisioned_throughput(throughput)?)
            .build()
            .map_err(map_build_error)?;

        self.update_index(
            table_name,
            GlobalSecondaryIndexUpdate::builder().create(action).build(),
            Some(conversions::index_attribute_definitions(index)?),
        )
        .await
    }

    async fn update_global_index(
        &self,
        table_name: &str,
        index_name: &str,
        throughput: Throughput,
    ) -> ServiceResult<()> {
        let action = UpdateGlobalSecondaryIndexAction::builder()
            .index_name(index_name)
            .provisioned_throughput(conversions::provisioned_throughput(throughput)?)
            .build()
            .map_err(map_build_error)?;

        self.update_index(
            table_name,
            GlobalSecondaryIndexUpdate::builder().update(action).build(),
            None,
        )
        .await
    }

    async fn delete_global_index(&self, table_name: &str, index_name: &str) -> ServiceResult<()> {
        let action = DeleteGlobalSecondaryIndexAction::builder()
            .index_name(index_name)
            .build()
            .map_err(map_build_error)?;

        self.update_index(
            table_name,
            GlobalSecondaryIndexUpdate::builder().delete(action).build(),
            None,
        )
        .await
    }

    async fn list_tables(&self) -> ServiceResult<Vec<String>> {
        let mut names = Vec::new();
        let mut start: Option<String> = None;

        loop {
            let response = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start.take())
                .send()
                .await
                .map_err(map_sdk_error)?;

            names.extend(response.table_names().iter().cloned());
            match response.last_evaluated_table_name() {
                Some(last) => start = Some(last.to_string()),
                None => break,
            }
        }

        Ok(names)
    }
}
