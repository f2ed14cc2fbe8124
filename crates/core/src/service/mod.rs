mod error;
mod traits;
mod types;

pub use error::{ServiceError, ServiceErrorKind, ServiceResult};
pub use traits::TableService;
pub use types::{IndexStatus, RemoteIndex, RemoteKey, RemoteTable, TableStatus};
