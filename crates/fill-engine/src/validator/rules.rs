//! Type-specific value checks

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use shared_types::{value_to_plain_string, Field, FieldType};

use super::FieldValidation;
use crate::formatter::{numbers, parse_bool, parse_date, parse_number};

/// Check a non-empty value against its field's type and constraints
pub fn check_value(field: &Field, value: &Value, today: NaiveDate) -> FieldValidation {
    match field.field_type {
        FieldType::Text | FieldType::Textarea => check_text(field, value),
        FieldType::Date => check_date(field, value, today),
        FieldType::Number | FieldType::Currency => check_number(field, value),
        FieldType::Dropdown => check_dropdown(field, value),
        FieldType::Boolean => match parse_bool(value) {
            Some(_) => FieldValidation::valid(),
            None => FieldValidation::invalid(format!("{} must be yes or no", field.display_name())),
        },
        FieldType::Repeating => check_items(field, value),
        FieldType::Party => check_party(field, value),
        FieldType::Address => match value {
            Value::String(_) | Value::Object(_) => FieldValidation::valid(),
            _ => FieldValidation::invalid(format!("{} must be an address", field.display_name())),
        },
    }
}

fn check_text(field: &Field, value: &Value) -> FieldValidation {
    let rules = &field.validation;
    let text = value_to_plain_string(value);
    let length = text.chars().count();

    if let Some(min) = rules.min_length {
        if length < min {
            return FieldValidation::invalid(format!(
                "{} must be at least {} characters",
                field.display_name(),
                min
            ));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            return FieldValidation::invalid(format!(
                "{} must be at most {} characters",
                field.display_name(),
                max
            ));
        }
    }

    if let Some(pattern) = &rules.pattern {
        match Regex::new(&format!("^(?:{})$", pattern)) {
            Ok(re) if !re.is_match(&text) => {
                return FieldValidation::invalid(
                    rules
                        .pattern_message
                        .clone()
                        .unwrap_or_else(|| format!("{} is not in the expected format", field.display_name())),
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(field = %field.id, error = %e, "Validation pattern does not compile");
                return FieldValidation::warning(format!(
                    "The format rule for {} could not be checked",
                    field.display_name()
                ));
            }
        }
    }

    FieldValidation::valid()
}

fn check_date(field: &Field, value: &Value, today: NaiveDate) -> FieldValidation {
    let Some(date) = value.as_str().and_then(parse_date) else {
        return FieldValidation::invalid(format!("{} must be a valid date", field.display_name()));
    };
    let rules = &field.validation;

    if rules.not_in_past && date < today {
        return FieldValidation::invalid(format!("{} can't be in the past", field.display_name()));
    }
    if let Some(min) = rules.min_date.as_deref().and_then(parse_date) {
        if date < min {
            return FieldValidation::invalid(format!(
                "{} must be on or after {}",
                field.display_name(),
                min.format("%Y-%m-%d")
            ));
        }
    }
    if let Some(max) = rules.max_date.as_deref().and_then(parse_date) {
        if date > max {
            return FieldValidation::invalid(format!(
                "{} must be on or before {}",
                field.display_name(),
                max.format("%Y-%m-%d")
            ));
        }
    }

    FieldValidation::valid()
}

fn check_number(field: &Field, value: &Value) -> FieldValidation {
    let Some(number) = parse_number(value) else {
        return FieldValidation::invalid(format!("{} must be a number", field.display_name()));
    };
    let rules = &field.validation;

    if let Some(min) = rules.min {
        if number < min {
            return FieldValidation::invalid(format!("{} must be at least {}", field.display_name(), min));
        }
    }
    if let Some(max) = rules.max {
        if number > max {
            return FieldValidation::invalid(format!("{} must be at most {}", field.display_name(), max));
        }
    }

    if field.field_type == FieldType::Currency && numbers::written_decimals(value) > 2 {
        return FieldValidation::warning(format!(
            "{} has more than two decimal places and will be rounded",
            field.display_name()
        ));
    }

    FieldValidation::valid()
}

fn check_dropdown(field: &Field, value: &Value) -> FieldValidation {
    if field.options.is_empty() {
        return FieldValidation::valid();
    }
    let raw = value_to_plain_string(value);
    if field.options.iter().any(|o| o.value == raw.trim()) {
        FieldValidation::valid()
    } else {
        FieldValidation::invalid(format!(
            "{} must be one of the listed options",
            field.display_name()
        ))
    }
}

fn check_items(field: &Field, value: &Value) -> FieldValidation {
    let Value::Array(items) = value else {
        return FieldValidation::invalid(format!("{} must be a list", field.display_name()));
    };
    let rules = &field.validation;

    if let Some(min) = rules.min_items {
        if items.len() < min {
            return FieldValidation::invalid(format!(
                "{} needs at least {} entries",
                field.display_name(),
                min
            ));
        }
    }
    if let Some(max) = rules.max_items {
        if items.len() > max {
            return FieldValidation::invalid(format!(
                "{} allows at most {} entries",
                field.display_name(),
                max
            ));
        }
    }

    FieldValidation::valid()
}

fn check_party(field: &Field, value: &Value) -> FieldValidation {
    let named = match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Object(map) => ["name", "fullName", "displayName", "entityName", "companyName", "lastName"]
            .iter()
            .any(|k| map.get(*k).and_then(Value::as_str).is_some_and(|s| !s.trim().is_empty())),
        _ => false,
    };
    if named {
        FieldValidation::valid()
    } else {
        FieldValidation::invalid(format!("{} needs a name", field.display_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::FieldStatus;
    use serde_json::json;
    use shared_types::Validation;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    fn status(field: &Field, value: Value) -> FieldStatus {
        check_value(field, &value, today()).status
    }

    #[test]
    fn test_text_length_and_pattern() {
        let field = Field::new("zip", FieldType::Text).with_validation(Validation {
            min_length: Some(5),
            max_length: Some(10),
            pattern: Some(r"\d{5}(-\d{4})?".into()),
            ..Default::default()
        });
        assert_eq!(status(&field, json!("02108")), FieldStatus::Valid);
        assert_eq!(status(&field, json!("0210")), FieldStatus::Invalid);
        assert_eq!(status(&field, json!("02108-12345")), FieldStatus::Invalid);
        assert_eq!(status(&field, json!("abcde")), FieldStatus::Invalid);
    }

    #[test]
    fn test_broken_pattern_is_a_warning() {
        let field = Field::new("code", FieldType::Text).with_validation(Validation {
            pattern: Some("([".into()),
            ..Default::default()
        });
        assert_eq!(status(&field, json!("x")), FieldStatus::Warning);
    }

    #[test]
    fn test_dates() {
        let field = Field::new("start", FieldType::Date).with_validation(Validation {
            not_in_past: true,
            max_date: Some("2030-12-31".into()),
            ..Default::default()
        });
        assert_eq!(status(&field, json!("2026-13-01")), FieldStatus::Invalid);
        assert_eq!(status(&field, json!("2026-05-31")), FieldStatus::Invalid);
        assert_eq!(status(&field, json!("2026-06-01")), FieldStatus::Valid);
        assert_eq!(status(&field, json!("2031-01-01")), FieldStatus::Invalid);
        assert_eq!(status(&field, json!(20260601)), FieldStatus::Invalid);
    }

    #[test]
    fn test_numbers() {
        let field = Field::new("rent", FieldType::Currency).with_validation(Validation {
            min: Some(0.0),
            max: Some(10_000.0),
            ..Default::default()
        });
        assert_eq!(status(&field, json!("$1,850")), FieldStatus::Valid);
        assert_eq!(status(&field, json!(-5)), FieldStatus::Invalid);
        assert_eq!(status(&field, json!(20_000)), FieldStatus::Invalid);
        assert_eq!(status(&field, json!("lots")), FieldStatus::Invalid);
        assert_eq!(status(&field, json!("10.125")), FieldStatus::Warning);
    }

    #[test]
    fn test_dropdown_and_boolean() {
        let state = Field::new("state", FieldType::Dropdown).with_option("ma", "Massachusetts");
        assert_eq!(status(&state, json!("ma")), FieldStatus::Valid);
        assert_eq!(status(&state, json!("Massachusetts")), FieldStatus::Invalid);

        let flag = Field::new("pets", FieldType::Boolean);
        assert_eq!(status(&flag, json!("yes")), FieldStatus::Valid);
        assert_eq!(status(&flag, json!("maybe")), FieldStatus::Invalid);
    }

    #[test]
    fn test_repeating_item_counts() {
        let field = Field::new("tenants", FieldType::Repeating).with_validation(Validation {
            min_items: Some(1),
            max_items: Some(2),
            ..Default::default()
        });
        assert_eq!(status(&field, json!([{"name": "A"}])), FieldStatus::Valid);
        assert_eq!(status(&field, json!([1, 2, 3])), FieldStatus::Invalid);
        assert_eq!(status(&field, json!("A")), FieldStatus::Invalid);
    }

    #[test]
    fn test_party_needs_name() {
        let field = Field::new("landlord", FieldType::Party);
        assert_eq!(status(&field, json!({"name": "Acme"})), FieldStatus::Valid);
        assert_eq!(status(&field, json!({"email": "a@b.c"})), FieldStatus::Invalid);
    }
}
