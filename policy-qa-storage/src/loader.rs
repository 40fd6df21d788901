//! Rule loading with per-entry validation

use policy_qa_core::{CoreError, Rule};
use serde_json::Value;

use crate::validator::validate_rule;
use crate::{RuleSource, StorageError};

/// Result of validating a batch of raw rule entries
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Valid rules, in source order
    pub rules: Vec<Rule>,
    /// One error per rejected entry
    pub rejected: Vec<CoreError>,
}

/// Fetch every entry from `source` and validate it.
///
/// Fails only when the source itself cannot be read. Invalid entries are
/// logged and reported individually; the remaining rules still load.
pub async fn load_rules(source: &dyn RuleSource) -> Result<LoadReport, StorageError> {
    let entries = source.fetch().await?;
    let report = validate_entries(&entries);

    tracing::info!(
        "Loaded {} rules from {} ({} rejected)",
        report.rules.len(),
        source.describe(),
        report.rejected.len()
    );
    Ok(report)
}

/// Validate raw entries, keeping valid rules in order
pub fn validate_entries(entries: &[Value]) -> LoadReport {
    let mut report = LoadReport::default();

    for (index, entry) in entries.iter().enumerate() {
        match validate_rule(index, entry) {
            Ok(rule) => {
                if rule.is_catch_all() {
                    tracing::warn!(
                        "Rule '{}' has no conditions and matches every question",
                        rule.rule_id
                    );
                }
                report.rules.push(rule);
            }
            Err(e) => {
                tracing::warn!("Skipping rule: {}", e);
                report.rejected.push(e);
            }
        }
    }

    report
}
