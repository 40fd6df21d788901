//! JSON file rule source
//!
//! Reads the rule file written by the offline clause-mining job: a single
//! JSON array of rule objects.

use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::validator::json_kind;
use crate::{RuleSource, StorageError};

/// Default location of the extracted rule file
pub const DEFAULT_RULES_PATH: &str = "docs/rules/extracted_rules_llm.json";

pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileSource {
    fn default() -> Self {
        Self::new(DEFAULT_RULES_PATH)
    }
}

#[async_trait]
impl RuleSource for JsonFileSource {
    async fn fetch(&self) -> Result<Vec<Value>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(self.path.display().to_string()))
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        let content = content.trim();
        if content.is_empty() {
            return Err(StorageError::Empty(self.path.display().to_string()));
        }

        match serde_json::from_str::<Value>(content)? {
            Value::Array(entries) => {
                tracing::debug!("Read {} rule entries from {:?}", entries.len(), self.path);
                Ok(entries)
            }
            other => Err(StorageError::InvalidFormat(format!(
                "expected a JSON array of rules in {}, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_reads_rule_array() {
        let file = file_with(r#"[{"rule_id": "r1", "if": {}, "then": {}}, {"rule_id": "r2"}]"#);
        let entries = JsonFileSource::new(file.path()).fetch().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["rule_id"], "r2");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileSource::new(dir.path().join("absent.json"));
        assert!(matches!(source.fetch().await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_blank_file() {
        let file = file_with("  \n\t ");
        let result = JsonFileSource::new(file.path()).fetch().await;
        assert!(matches!(result, Err(StorageError::Empty(_))));
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let file = file_with("[{\"rule_id\": ");
        let result = JsonFileSource::new(file.path()).fetch().await;
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_top_level_object_is_rejected() {
        let file = file_with(r#"{"rule_id": "r1"}"#);
        let result = JsonFileSource::new(file.path()).fetch().await;
        assert!(matches!(result, Err(StorageError::InvalidFormat(_))));
    }
}
