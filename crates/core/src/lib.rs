//! Pure core for tablesync.
//!
//! Everything in this crate is free of I/O: the declarative document model,
//! the schema translator, namespacing, the reconciliation planner and the
//! `TableService` contract that the imperative shell implements.

pub mod error;
pub mod namespace;
pub mod planning;
pub mod retry;
pub mod schema;
pub mod service;

pub use error::{Result, SyncError};
pub use namespace::Namespace;
pub use retry::{RetryPolicy, UPDATE_INDEX_RETRIES};
