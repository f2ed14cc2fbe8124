//! Reconciliation engine: applies translated schemas through a [`TableService`].
//!
//! [`TableService`]: tablesync_core::service::TableService

mod reconciler;
mod retry;

pub use reconciler::Reconciler;
pub use retry::retry_convergent;
