//! In-memory rule source for development and testing

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{PoisonError, RwLock};

use crate::{RuleSource, StorageError};

/// Rule entries held in memory; replaceable between reloads
#[derive(Default)]
pub struct InMemoryRuleSource {
    entries: RwLock<Vec<Value>>,
}

impl InMemoryRuleSource {
    pub fn new(entries: Vec<Value>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Build from a JSON array document
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Swap the stored entries; picked up by the next fetch
    pub fn replace(&self, entries: Vec<Value>) {
        let mut current = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        *current = entries;
    }
}

#[async_trait]
impl RuleSource for InMemoryRuleSource {
    async fn fetch(&self) -> Result<Vec<Value>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(entries.clone())
    }

    fn describe(&self) -> String {
        "in-memory rules".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_and_replace() {
        let source = InMemoryRuleSource::from_json(r#"[{"rule_id": "a"}]"#).unwrap();
        assert_eq!(source.fetch().await.unwrap().len(), 1);

        source.replace(vec![json!({"rule_id": "b"}), json!({"rule_id": "c"})]);
        let entries = source.fetch().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["rule_id"], "b");
    }

    #[test]
    fn test_from_json_requires_an_array() {
        assert!(InMemoryRuleSource::from_json(r#"{"rule_id": "a"}"#).is_err());
    }
}
