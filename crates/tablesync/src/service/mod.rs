//! [`TableService`] implementations.
//!
//! [`TableService`]: tablesync_core::service::TableService

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
mod inmemory;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbService;
#[cfg(feature = "inmemory")]
pub use inmemory::{InMemoryTableService, ServiceCall, ServiceOperation};
