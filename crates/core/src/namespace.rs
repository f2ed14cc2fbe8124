//! Environment prefixes for physical table names.

use std::fmt;

use crate::error::{Result, SyncError};

/// Non-empty prefix that separates environments sharing one account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(SyncError::Configuration(
                "Namespace must not be empty".to_string(),
            ));
        }
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Physical name of a logical table: the namespace followed by the name.
    pub fn physical_name(&self, logical: &str) -> String {
        format!("{}{}", self.0, logical)
    }

    /// Logical name of a physical table.
    ///
    /// Drops as many leading characters as the namespace has, without checking
    /// that `physical` actually starts with it. Use [`Namespace::owns`] first
    /// when the input is not known to be namespaced.
    pub fn logical_name(&self, physical: &str) -> String {
        physical.chars().skip(self.0.chars().count()).collect()
    }

    /// Whether a physical name carries this namespace.
    pub fn owns(&self, physical: &str) -> bool {
        physical.starts_with(&self.0)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
