//! Core domain models

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

use crate::CoreError;

/// Decision label used when a rule's `then` clause omits one
pub const DEFAULT_DECISION: &str = "manual_review";

/// Justification used when a rule's `then` clause omits a reason
pub const DEFAULT_REASON: &str = "Rule triggered";

/// Field vocabulary produced by the question parser
pub const FACT_FIELDS: [&str; 5] = ["age", "gender", "procedure", "city", "policy_months"];

/// A single present value in a fact record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FactValue {
    /// Numeric view of the value. Strings are accepted when they look numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FactValue::Integer(i) => Some(*i as f64),
            FactValue::Float(f) => Some(*f),
            FactValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Integer(i) => write!(f, "{}", i),
            // Whole floats keep their fractional part: 65.0 renders as "65.0", not "65"
            FactValue::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{:.1}", x)
            }
            FactValue::Float(x) => write!(f, "{}", x),
            FactValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FactValue {
    fn from(value: i64) -> Self {
        FactValue::Integer(value)
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Float(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::Text(value)
    }
}

/// Structured facts extracted from a free-text question.
///
/// On the wire this is a flat JSON object: every key other than
/// `confidence` is a field, and `null` marks the field as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    /// Extraction confidence in [0, 1]. Ignored by the matcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(flatten)]
    fields: BTreeMap<String, Option<FactValue>>,
}

impl FactRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a present value for `field`
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FactValue>) -> Self {
        self.fields.insert(field.into(), Some(value.into()));
        self
    }

    /// Record `field` explicitly as absent
    pub fn with_absent(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), None);
        self
    }

    /// Set `field` from an optional value
    pub fn with_optional<V: Into<FactValue>>(self, field: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(field, v),
            None => self.with_absent(field),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Present value of `field`; `None` when missing or null
    pub fn get(&self, field: &str) -> Option<&FactValue> {
        self.fields.get(field).and_then(Option::as_ref)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    /// Number of fields holding a present value
    pub fn present_count(&self) -> usize {
        self.fields.values().filter(|v| v.is_some()).count()
    }
}

/// Comparison protocol of a single rule condition
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// `>bound`: fact coerced to a number must be strictly greater
    GreaterThan(f64),
    /// `<bound`: fact coerced to a number must be strictly less
    LessThan(f64),
    /// Bare value: case-insensitive string equality
    Equals(String),
}

impl Comparison {
    /// Parse a condition expression such as `">60"`, `"<6"` or `"knee surgery"`
    pub fn parse(expression: &str) -> Result<Self, CoreError> {
        if let Some(bound) = expression.strip_prefix('>') {
            Ok(Comparison::GreaterThan(parse_bound(expression, bound)?))
        } else if let Some(bound) = expression.strip_prefix('<') {
            Ok(Comparison::LessThan(parse_bound(expression, bound)?))
        } else {
            Ok(Comparison::Equals(expression.to_string()))
        }
    }
}

fn parse_bound(expression: &str, bound: &str) -> Result<f64, CoreError> {
    bound
        .trim()
        .parse::<f64>()
        .map_err(|_| CoreError::InvalidExpression(expression.to_string()))
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::GreaterThan(bound) => write!(f, ">{}", bound),
            Comparison::LessThan(bound) => write!(f, "<{}", bound),
            Comparison::Equals(value) => f.write_str(value),
        }
    }
}

impl Serialize for Comparison {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One `field -> expression` pair of a rule's `if` clause
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub field: String,
    pub comparison: Comparison,
}

impl Condition {
    pub fn new(field: impl Into<String>, comparison: Comparison) -> Self {
        Self {
            field: field.into(),
            comparison,
        }
    }

    pub fn parse(field: impl Into<String>, expression: &str) -> Result<Self, CoreError> {
        Ok(Self::new(field, Comparison::parse(expression)?))
    }
}

/// The resolved `then` clause of a rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub decision: String,
    pub reason: String,
    pub max_payout: Number,
}

impl Default for Outcome {
    fn default() -> Self {
        Self {
            decision: DEFAULT_DECISION.to_string(),
            reason: DEFAULT_REASON.to_string(),
            max_payout: Number::from(0),
        }
    }
}

/// A validated if/then rule mined from policy text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub rule_id: String,
    /// Conjunction of conditions, in document order
    pub conditions: Vec<Condition>,
    pub outcome: Outcome,
}

impl Rule {
    pub fn new(rule_id: impl Into<String>, conditions: Vec<Condition>, outcome: Outcome) -> Self {
        Self {
            rule_id: rule_id.into(),
            conditions,
            outcome,
        }
    }

    /// A rule without conditions matches every fact record
    pub fn is_catch_all(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Build the decision this rule yields when it fires
    pub fn resolve(&self) -> Decision {
        Decision {
            decision: self.outcome.decision.clone(),
            justification: self.outcome.reason.clone(),
            payout: self.outcome.max_payout.clone(),
            citations: vec![self.rule_id.clone()],
        }
    }
}

/// Result returned to the caller when a rule fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub decision: String,
    pub justification: String,
    pub payout: Number,
    pub citations: Vec<String>,
}

/// Outcome of evaluating a fact record against a rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "decision", rename_all = "snake_case")]
pub enum MatchOutcome {
    Matched(Decision),
    NoMatch,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }

    pub fn decision(&self) -> Option<&Decision> {
        match self {
            MatchOutcome::Matched(d) => Some(d),
            MatchOutcome::NoMatch => None,
        }
    }

    pub fn into_decision(self) -> Option<Decision> {
        match self {
            MatchOutcome::Matched(d) => Some(d),
            MatchOutcome::NoMatch => None,
        }
    }
}

/// Request to answer a batch of questions about a policy document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Remote URL of the policy document
    pub documents: String,
    pub questions: Vec<String>,
}

/// One answer per question, in question order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_comparisons() {
        assert_eq!(Comparison::parse(">60").unwrap(), Comparison::GreaterThan(60.0));
        assert_eq!(Comparison::parse("< 6").unwrap(), Comparison::LessThan(6.0));
        assert_eq!(
            Comparison::parse("Knee Surgery").unwrap(),
            Comparison::Equals("Knee Surgery".to_string())
        );
        assert_eq!(Comparison::parse("").unwrap(), Comparison::Equals(String::new()));
    }

    #[test]
    fn test_parse_rejects_non_numeric_bound() {
        assert!(matches!(
            Comparison::parse(">sixty"),
            Err(CoreError::InvalidExpression(e)) if e == ">sixty"
        ));
        assert!(Comparison::parse("<").is_err());
        assert!(Comparison::parse(">=60").is_err());
    }

    #[test]
    fn test_comparison_serializes_as_expression() {
        let condition = Condition::parse("age", ">60").unwrap();
        assert_eq!(
            serde_json::to_value(&condition).unwrap(),
            json!({"field": "age", "comparison": ">60"})
        );
    }

    #[test]
    fn test_fact_record_from_parser_output() {
        let record: FactRecord = serde_json::from_value(json!({
            "age": 46,
            "gender": "male",
            "procedure": "knee surgery",
            "city": null,
            "policy_months": 3,
            "confidence": 0.8
        }))
        .unwrap();

        assert_eq!(record.get("age"), Some(&FactValue::Integer(46)));
        assert_eq!(record.get("procedure"), Some(&FactValue::from("knee surgery")));
        assert_eq!(record.get("city"), None);
        assert_eq!(record.get("unknown"), None);
        assert_eq!(record.confidence(), Some(0.8));
        assert_eq!(record.present_count(), 4);
    }

    #[test]
    fn test_fact_value_numeric_coercion() {
        assert_eq!(FactValue::Integer(65).as_number(), Some(65.0));
        assert_eq!(FactValue::Float(2.5).as_number(), Some(2.5));
        assert_eq!(FactValue::from(" 12 ").as_number(), Some(12.0));
        assert_eq!(FactValue::from("twelve").as_number(), None);
    }

    #[test]
    fn test_fact_value_string_form() {
        assert_eq!(FactValue::Integer(65).to_string(), "65");
        assert_eq!(FactValue::Float(65.0).to_string(), "65.0");
        assert_eq!(FactValue::Float(-3.0).to_string(), "-3.0");
        assert_eq!(FactValue::Float(65.5).to_string(), "65.5");
        assert_eq!(FactValue::from("65").to_string(), "65");
    }

    #[test]
    fn test_rule_resolves_defaults() {
        let rule = Rule::new("r1", vec![], Outcome::default());
        let decision = rule.resolve();

        assert!(rule.is_catch_all());
        assert_eq!(decision.decision, "manual_review");
        assert_eq!(decision.justification, "Rule triggered");
        assert_eq!(decision.payout, Number::from(0));
        assert_eq!(decision.citations, vec!["r1".to_string()]);
    }

    #[test]
    fn test_match_outcome_wire_form() {
        assert_eq!(
            serde_json::to_value(MatchOutcome::NoMatch).unwrap(),
            json!({"outcome": "no_match"})
        );

        let matched = MatchOutcome::Matched(Decision {
            decision: "approved".into(),
            justification: "covered".into(),
            payout: Number::from(50000),
            citations: vec!["r1".into()],
        });
        assert_eq!(
            serde_json::to_value(&matched).unwrap(),
            json!({
                "outcome": "matched",
                "decision": {
                    "decision": "approved",
                    "justification": "covered",
                    "payout": 50000,
                    "citations": ["r1"]
                }
            })
        );
    }
}
