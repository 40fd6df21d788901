//! Schema validation for persisted rule entries
//!
//! Entries look like
//! `{"rule_id": "...", "if": {field: expr}, "then": {"decision", "reason", "max_payout"}}`.
//! Defaults for the `then` clause are resolved here, once, so evaluation
//! never has to look at raw JSON.

use policy_qa_core::{Condition, CoreError, Outcome, Rule, DEFAULT_DECISION, DEFAULT_REASON};
use serde_json::{Map, Number, Value};

/// Validate one raw entry of the rule array.
///
/// `index` is the entry's position in the source; it names the rule in
/// diagnostics and derives `rule_<index>` when the entry has no usable id.
pub fn validate_rule(index: usize, entry: &Value) -> Result<Rule, CoreError> {
    let object = entry.as_object().ok_or_else(|| {
        CoreError::invalid_rule(index, None, format!("expected an object, found {}", json_kind(entry)))
    })?;

    let declared_id = declared_rule_id(object);
    let reject = |reason: String| CoreError::invalid_rule(index, declared_id.as_deref(), reason);

    let conditions = match object.get("if") {
        Some(Value::Object(clauses)) => clauses
            .iter()
            .map(|(field, expression)| match expression {
                Value::String(expression) => {
                    Condition::parse(field.as_str(), expression).map_err(|e| reject(e.to_string()))
                }
                other => Err(reject(format!(
                    "condition on '{}' must be a string, found {}",
                    field,
                    json_kind(other)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => return Err(reject(format!("'if' must be an object, found {}", json_kind(other)))),
        None => return Err(reject("missing 'if' clause".to_string())),
    };

    let outcome = match object.get("then") {
        Some(Value::Object(then)) => parse_outcome(then).map_err(reject)?,
        Some(other) => {
            return Err(reject(format!("'then' must be an object, found {}", json_kind(other))))
        }
        None => return Err(reject("missing 'then' clause".to_string())),
    };

    let rule_id = declared_id.unwrap_or_else(|| format!("rule_{}", index));
    Ok(Rule::new(rule_id, conditions, outcome))
}

fn declared_rule_id(object: &Map<String, Value>) -> Option<String> {
    match object.get("rule_id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_outcome(then: &Map<String, Value>) -> Result<Outcome, String> {
    Ok(Outcome {
        decision: text_or_default(then, "decision", DEFAULT_DECISION)?,
        reason: text_or_default(then, "reason", DEFAULT_REASON)?,
        max_payout: payout(then)?,
    })
}

fn text_or_default(then: &Map<String, Value>, key: &str, default: &str) -> Result<String, String> {
    match then.get(key) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("'{}' must be a string, found {}", key, json_kind(other))),
    }
}

fn payout(then: &Map<String, Value>) -> Result<Number, String> {
    match then.get("max_payout") {
        None | Some(Value::Null) => Ok(Number::from(0)),
        Some(Value::Number(n)) => Ok(n.clone()),
        Some(Value::String(s)) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Number::from(i));
            }
            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(|| format!("'max_payout' is not numeric: '{}'", s))
        }
        Some(other) => Err(format!("'max_payout' must be a number, found {}", json_kind(other))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
