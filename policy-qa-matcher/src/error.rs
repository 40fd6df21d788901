//! Matcher error types

use thiserror::Error;

/// A fact value that cannot be read as a number under `>` / `<`
#[derive(Error, Debug, Clone, PartialEq)]
#[error("field '{field}' has non-numeric value '{value}' for comparison '{expression}'")]
pub struct CoercionError {
    pub field: String,
    pub value: String,
    pub expression: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("Rule '{rule_id}' cannot be evaluated: {source}")]
    NonNumericFact {
        rule_id: String,
        #[source]
        source: CoercionError,
    },
}

impl MatchError {
    pub fn rule_id(&self) -> &str {
        match self {
            MatchError::NonNumericFact { rule_id, .. } => rule_id,
        }
    }
}
