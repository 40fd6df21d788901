//! First-match-wins evaluation of fact records against ordered rules

use crate::{CoercionError, MatchError};
use policy_qa_core::{Comparison, Condition, FactRecord, FactValue, MatchOutcome, Rule};

/// Evaluate `facts` against `rules` in order.
///
/// Returns the decision of the first rule whose conditions all hold, or
/// [`MatchOutcome::NoMatch`] when none does. A non-numeric fact under a
/// `>`/`<` condition is an error, not a non-match.
pub fn evaluate(facts: &FactRecord, rules: &[Rule]) -> Result<MatchOutcome, MatchError> {
    for rule in rules {
        if rule_matches(facts, rule)? {
            tracing::debug!(rule_id = %rule.rule_id, "Rule matched");
            return Ok(MatchOutcome::Matched(rule.resolve()));
        }
    }
    Ok(MatchOutcome::NoMatch)
}

/// Whether every condition of `rule` holds for `facts`.
///
/// Stops at the first failing condition. An empty condition list holds.
pub fn rule_matches(facts: &FactRecord, rule: &Rule) -> Result<bool, MatchError> {
    for condition in &rule.conditions {
        let holds = condition_holds(facts, condition).map_err(|source| {
            MatchError::NonNumericFact {
                rule_id: rule.rule_id.clone(),
                source,
            }
        })?;
        if !holds {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Check a single condition. An absent field never satisfies a condition.
pub fn condition_holds(facts: &FactRecord, condition: &Condition) -> Result<bool, CoercionError> {
    let Some(value) = facts.get(&condition.field) else {
        return Ok(false);
    };

    match &condition.comparison {
        Comparison::GreaterThan(bound) => Ok(numeric(condition, value)? > *bound),
        Comparison::LessThan(bound) => Ok(numeric(condition, value)? < *bound),
        Comparison::Equals(expected) => {
            Ok(value.to_string().to_lowercase() == expected.to_lowercase())
        }
    }
}

fn numeric(condition: &Condition, value: &FactValue) -> Result<f64, CoercionError> {
    value.as_number().ok_or_else(|| CoercionError {
        field: condition.field.clone(),
        value: value.to_string(),
        expression: condition.comparison.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_qa_core::Outcome;
    use serde_json::Number;

    fn rule(id: &str, conditions: &[(&str, &str)], decision: &str) -> Rule {
        let conditions = conditions
            .iter()
            .map(|(field, expr)| Condition::parse(*field, expr).unwrap())
            .collect();
        Rule::new(
            id,
            conditions,
            Outcome {
                decision: decision.to_string(),
                reason: format!("{} reason", id),
                max_payout: Number::from(1000),
            },
        )
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            rule("first", &[("procedure", "knee surgery")], "approved"),
            rule("second", &[("procedure", "knee surgery")], "denied"),
        ];
        let facts = FactRecord::new().with("procedure", "knee surgery");

        let decision = evaluate(&facts, &rules).unwrap().into_decision().unwrap();
        assert_eq!(decision.decision, "approved");
        assert_eq!(decision.citations, vec!["first".to_string()]);
    }

    #[test]
    fn test_duplicate_rule_ids_resolve_by_order() {
        let rules = vec![
            rule("dup", &[("age", ">60")], "first"),
            rule("dup", &[("age", ">40")], "second"),
        ];
        let facts = FactRecord::new().with("age", 50);

        let decision = evaluate(&facts, &rules).unwrap().into_decision().unwrap();
        assert_eq!(decision.decision, "second");
    }

    #[test]
    fn test_conditions_are_a_conjunction() {
        let rules = vec![rule(
            "senior-knee",
            &[("age", ">60"), ("procedure", "knee surgery")],
            "approved",
        )];

        let cataract = FactRecord::new()
            .with("age", 65)
            .with("procedure", "cataract surgery");
        assert_eq!(evaluate(&cataract, &rules).unwrap(), MatchOutcome::NoMatch);

        let knee = FactRecord::new().with("age", 65).with("procedure", "knee surgery");
        assert!(evaluate(&knee, &rules).unwrap().is_match());
    }

    #[test]
    fn test_missing_field_never_matches() {
        let rules = vec![rule("pune", &[("procedure", "knee surgery"), ("city", "Pune")], "approved")];

        let missing = FactRecord::new().with("procedure", "knee surgery");
        assert_eq!(evaluate(&missing, &rules).unwrap(), MatchOutcome::NoMatch);

        let null = FactRecord::new()
            .with("procedure", "knee surgery")
            .with_absent("city");
        assert_eq!(evaluate(&null, &rules).unwrap(), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_missing_field_skips_inequality_without_error() {
        let rules = vec![rule("age-check", &[("age", "<18")], "denied")];
        let facts = FactRecord::new().with("gender", "female");

        assert_eq!(evaluate(&facts, &rules).unwrap(), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_equality_ignores_case() {
        let rules = vec![rule("gender", &[("gender", "Male")], "approved")];
        let facts = FactRecord::new().with("gender", "male");

        assert!(evaluate(&facts, &rules).unwrap().is_match());
    }

    #[test]
    fn test_empty_conditions_match_everything() {
        let rules = vec![rule("catch-all", &[], "manual_review")];

        assert!(evaluate(&FactRecord::new(), &rules).unwrap().is_match());
        let facts = FactRecord::new().with("age", 30).with("city", "Delhi");
        assert!(evaluate(&facts, &rules).unwrap().is_match());
    }

    #[test]
    fn test_no_rules_is_no_match() {
        let facts = FactRecord::new().with("age", 30);
        assert_eq!(evaluate(&facts, &[]).unwrap(), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_non_numeric_fact_is_an_error() {
        let rules = vec![
            rule("bad", &[("age", ">60")], "approved"),
            rule("never-reached", &[], "manual_review"),
        ];
        let facts = FactRecord::new().with("age", "sixty-five");

        let err = evaluate(&facts, &rules).unwrap_err();
        assert_eq!(err.rule_id(), "bad");
        let MatchError::NonNumericFact { source, .. } = err;
        assert_eq!(source.field, "age");
        assert_eq!(source.value, "sixty-five");
        assert_eq!(source.expression, ">60");
    }

    #[test]
    fn test_earlier_failing_condition_short_circuits_coercion() {
        let rules = vec![rule("ordered", &[("city", "Pune"), ("age", ">60")], "approved")];
        let facts = FactRecord::new().with("city", "Mumbai").with("age", "unknown");

        assert_eq!(evaluate(&facts, &rules).unwrap(), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let condition = Condition::parse("policy_months", "<6").unwrap();
        let facts = FactRecord::new().with("policy_months", "3");

        assert!(condition_holds(&facts, &condition).unwrap());
    }
}
