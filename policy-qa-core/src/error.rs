//! Error types for the core crate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid condition expression: '{0}'")]
    InvalidExpression(String),

    #[error("Invalid rule at index {index} ({}): {reason}", .rule_id.as_deref().unwrap_or("no rule_id"))]
    InvalidRule {
        index: usize,
        rule_id: Option<String>,
        reason: String,
    },
}

impl CoreError {
    pub fn invalid_rule(index: usize, rule_id: Option<&str>, reason: impl Into<String>) -> Self {
        CoreError::InvalidRule {
            index,
            rule_id: rule_id.map(str::to_string),
            reason: reason.into(),
        }
    }
}
