//! Conditional visibility

use serde_json::Value;
use shared_types::{is_empty_value, value_to_plain_string, Condition, ConditionalAction, Dataset, Schema};

use crate::formatter::parse_bool;

/// A field is visible unless one of the conditionals targeting it says otherwise
pub fn is_visible(field_id: &str, schema: &Schema, dataset: &Dataset) -> bool {
    schema.conditionals_for(field_id).all(|rule| {
        let holds = condition_holds(&rule.condition, dataset.resolve(&rule.source));
        match rule.action {
            ConditionalAction::Show => holds,
            ConditionalAction::Hide => !holds,
        }
    })
}

/// Evaluate a condition against the source field's current value
pub fn condition_holds(condition: &Condition, value: Option<&Value>) -> bool {
    match condition {
        Condition::Equals(expected) => value.is_some_and(|v| loosely_equal(v, expected)),
        Condition::NotEquals(expected) => !value.is_some_and(|v| loosely_equal(v, expected)),
        Condition::In(candidates) => {
            value.is_some_and(|v| candidates.iter().any(|c| loosely_equal(v, c)))
        }
        Condition::IsEmpty => value.map_or(true, is_empty_value),
        Condition::IsNotEmpty => !value.map_or(true, is_empty_value),
        Condition::IsTrue => value.is_some_and(is_truthy),
        Condition::IsFalse => !value.is_some_and(is_truthy),
    }
}

/// `"ma"` equals `"ma"`, `true` equals `"true"`, `3` equals `"3"`
fn loosely_equal(a: &Value, b: &Value) -> bool {
    a == b || value_to_plain_string(a).trim() == value_to_plain_string(b).trim()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        other => parse_bool(other).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::{Conditional, Field, FieldType};

    fn schema(condition: Condition, action: ConditionalAction) -> Schema {
        Schema::new(vec![
            Field::new("hasPets", FieldType::Boolean),
            Field::new("petDeposit", FieldType::Currency).required(),
        ])
        .with_conditional(Conditional {
            target: "petDeposit".into(),
            source: "hasPets".into(),
            condition,
            action,
        })
    }

    #[test]
    fn test_show_when_true() {
        let schema = schema(Condition::IsTrue, ConditionalAction::Show);
        let yes = Dataset::new().with_value("hasPets", json!(true));
        let no = Dataset::new().with_value("hasPets", json!("no"));
        assert!(is_visible("petDeposit", &schema, &yes));
        assert!(!is_visible("petDeposit", &schema, &no));
        assert!(!is_visible("petDeposit", &schema, &Dataset::new()));
        // fields without conditionals are always visible
        assert!(is_visible("hasPets", &schema, &Dataset::new()));
    }

    #[test]
    fn test_hide_when_equal() {
        let schema = schema(Condition::Equals(json!("false")), ConditionalAction::Hide);
        let hidden = Dataset::new().with_value("hasPets", json!(false));
        assert!(!is_visible("petDeposit", &schema, &hidden));
    }

    #[test]
    fn test_in_and_empty_conditions() {
        let state = Some(json!("ma"));
        assert!(condition_holds(&Condition::In(vec![json!("ny"), json!("ma")]), state.as_ref()));
        assert!(condition_holds(&Condition::IsEmpty, None));
        assert!(condition_holds(&Condition::IsNotEmpty, state.as_ref()));
        assert!(condition_holds(&Condition::NotEquals(json!("ny")), state.as_ref()));
    }
}
