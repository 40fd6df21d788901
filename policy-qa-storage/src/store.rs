//! Process-wide rule store
//!
//! Readers take an `Arc<RuleSet>` snapshot with a single atomic load.
//! Reloads build the complete new set first and publish it with one swap,
//! so a reader never observes a partially updated rule list.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use policy_qa_core::Rule;
use std::sync::Arc;

use crate::loader::{load_rules, LoadReport};
use crate::{RuleSource, StorageError};

/// An immutable, published rule collection
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    rejected: usize,
    loaded_at: DateTime<Utc>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>, rejected: usize) -> Self {
        Self {
            rules,
            rejected,
            loaded_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Rules in priority order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Entries skipped by validation when this set was loaded
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl From<LoadReport> for RuleSet {
    fn from(report: LoadReport) -> Self {
        Self::new(report.rules, report.rejected.len())
    }
}

/// Shared handle to the current rule set and the source it reloads from
#[derive(Clone)]
pub struct RuleStore {
    current: Arc<ArcSwap<RuleSet>>,
    source: Arc<dyn RuleSource>,
}

impl RuleStore {
    /// Load rules from `source` at startup.
    ///
    /// Never fails: when the source is missing, empty or malformed the store
    /// starts empty and every question falls through to the retrieval path.
    pub async fn open(source: Arc<dyn RuleSource>) -> Self {
        let set = match load_rules(source.as_ref()).await {
            Ok(report) => RuleSet::from(report),
            Err(e) => {
                tracing::warn!(
                    "No rules loaded from {}: {}. Rule layer inactive",
                    source.describe(),
                    e
                );
                RuleSet::empty()
            }
        };

        Self {
            current: Arc::new(ArcSwap::from_pointee(set)),
            source,
        }
    }

    /// Current rule set; stays valid across later reloads
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    /// Re-read the source and publish the new set.
    ///
    /// If the source cannot be read the published set is left untouched.
    pub async fn reload(&self) -> Result<Arc<RuleSet>, StorageError> {
        let report = load_rules(self.source.as_ref()).await.map_err(|e| {
            tracing::error!("Rule reload from {} failed: {}", self.source.describe(), e);
            e
        })?;

        let set = Arc::new(RuleSet::from(report));
        self.current.store(set.clone());
        tracing::info!("Published {} rules", set.len());
        Ok(set)
    }

    /// Publish an explicit rule list
    pub fn replace(&self, rules: Vec<Rule>) -> Arc<RuleSet> {
        let set = Arc::new(RuleSet::new(rules, 0));
        self.current.store(set.clone());
        set
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryRuleSource, JsonFileSource};
    use policy_qa_core::Outcome;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn test_missing_source_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(JsonFileSource::new(dir.path().join("rules.json")));

        let store = RuleStore::open(source).await;
        assert!(store.is_empty());
        assert_eq!(store.snapshot().rejected(), 0);
    }

    #[tokio::test]
    async fn test_malformed_source_yields_empty_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();

        let store = RuleStore::open(Arc::new(JsonFileSource::new(file.path()))).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_reload_swaps_whole_set() {
        let source = Arc::new(InMemoryRuleSource::new(vec![
            json!({"rule_id": "old", "if": {}, "then": {}}),
        ]));
        let store = RuleStore::open(source.clone()).await;
        let before = store.snapshot();

        source.replace(vec![
            json!({"rule_id": "new-1", "if": {"age": ">60"}, "then": {}}),
            json!({"rule_id": "new-2", "if": {}, "then": {}}),
            json!({"rule_id": "bad", "if": {}}),
        ]);
        let published = store.reload().await.unwrap();

        assert_eq!(before.rules()[0].rule_id, "old");
        assert_eq!(before.len(), 1);
        assert_eq!(published.len(), 2);
        assert_eq!(published.rejected(), 1);
        assert_eq!(store.snapshot().rules()[0].rule_id, "new-1");
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_set() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"rule_id": "kept", "if": {}, "then": {}}]"#).unwrap();
        let path = file.path().to_path_buf();

        let store = RuleStore::open(Arc::new(JsonFileSource::new(&path))).await;
        assert_eq!(store.len(), 1);

        std::fs::write(&path, "").unwrap();
        assert!(matches!(store.reload().await, Err(StorageError::Empty(_))));
        assert_eq!(store.snapshot().rules()[0].rule_id, "kept");
    }

    #[tokio::test]
    async fn test_replace_publishes_rules() {
        let store = RuleStore::open(Arc::new(InMemoryRuleSource::default())).await;
        assert!(store.is_empty());

        store.replace(vec![Rule::new("manual", vec![], Outcome::default())]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.source_description(), "in-memory rules");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_readers_never_see_a_partial_set() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let old = vec![json!({"rule_id": "old", "if": {}, "then": {}})];
        let new: Vec<_> = (0..50)
            .map(|i| json!({"rule_id": format!("new-{}", i), "if": {"age": ">60"}, "then": {}}))
            .collect();

        let source = Arc::new(InMemoryRuleSource::new(old.clone()));
        let store = RuleStore::open(source.clone()).await;
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let done = done.clone();
                tokio::spawn(async move {
                    let mut seen = 0usize;
                    loop {
                        let finished = done.load(Ordering::Acquire);
                        let set = store.snapshot();
                        let is_old = set.len() == 1 && set.rules()[0].rule_id == "old";
                        let is_new = set.len() == 50
                            && set.rules().iter().all(|r| r.rule_id.starts_with("new-"));
                        assert!(is_old || is_new, "observed a mixed set of {} rules", set.len());
                        seen += 1;
                        if finished {
                            break seen;
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for round in 0..20 {
            let entries = if round % 2 == 0 { new.clone() } else { old.clone() };
            source.replace(entries);
            store.reload().await.unwrap();
            tokio::task::yield_now().await;
        }
        done.store(true, Ordering::Release);

        for reader in readers {
            assert!(reader.await.unwrap() > 0);
        }
        assert_eq!(store.len(), 1);
    }
}
