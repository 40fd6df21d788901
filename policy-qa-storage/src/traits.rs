//! Storage traits defining the interface for rule sources

use async_trait::async_trait;
use serde_json::Value;

use crate::StorageError;

/// A persisted collection of raw rule entries
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Fetch the raw entries of the rule array, in stored order
    async fn fetch(&self) -> Result<Vec<Value>, StorageError>;

    /// Human-readable location, used in diagnostics
    fn describe(&self) -> String;
}
