//! Imperative shell for tablesync.
//!
//! Loads configuration, talks to the table service and applies the plans
//! computed by [`tablesync_core`].

pub mod config;
pub mod engine;
pub mod service;
pub mod sync;

pub use config::{Config, ConfigBuilder, Credentials, EndpointOverride};
pub use engine::Reconciler;
pub use sync::SchemaSync;
pub use tablesync_core::{Namespace, Result, RetryPolicy, SyncError};
