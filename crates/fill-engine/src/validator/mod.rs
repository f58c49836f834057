//! Dataset validation
//!
//! Synchronous and free of host I/O, so it can run before every fill. "Not in
//! the past" checks compare against the local date at each call unless the
//! validator pins one with [`SchemaValidator::with_today`].

pub mod rules;
pub mod visibility;

pub use visibility::is_visible;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{is_empty_value, Dataset, Field, FieldType, Schema};
use std::collections::BTreeMap;

/// Verdict for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Valid,
    Invalid,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidation {
    pub status: FieldStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldValidation {
    pub fn valid() -> Self {
        Self {
            status: FieldStatus::Valid,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: FieldStatus::Invalid,
            message: Some(message.into()),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            status: FieldStatus::Warning,
            message: Some(message.into()),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.status == FieldStatus::Invalid
    }
}

/// One reported problem, addressed by dataset path (`parties.1.name`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub field_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Blocking problems
    pub errors: Vec<ValidationIssue>,
    /// Non-blocking problems
    pub warnings: Vec<ValidationIssue>,
    pub results: BTreeMap<String, FieldValidation>,
}

impl ValidationReport {
    fn record(&mut self, path: String, result: FieldValidation) {
        if let Some(message) = &result.message {
            let issue = ValidationIssue {
                field_id: path.clone(),
                message: message.clone(),
            };
            match result.status {
                FieldStatus::Invalid => self.errors.push(issue),
                FieldStatus::Warning => self.warnings.push(issue),
                FieldStatus::Valid => {}
            }
        }
        self.results.insert(path, result);
    }

    pub fn error_for(&self, field_id: &str) -> Option<&ValidationIssue> {
        self.errors.iter().find(|e| e.field_id == field_id)
    }
}

/// A pluggable dataset check, chosen when the engine is built
pub trait DatasetValidator: Send + Sync {
    fn validate_dataset(&self, schema: &Schema, dataset: &Dataset) -> ValidationReport;
}

/// Built-in validator driven entirely by the schema
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    /// Fixed "today"; the local date at each call when unset
    today: Option<NaiveDate>,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator {
    /// Validator comparing dates against the local calendar date of each call
    pub fn new() -> Self {
        Self { today: None }
    }

    /// Validator with a pinned "today"
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Validate one field's candidate value
    pub fn validate_field(
        &self,
        field: &Field,
        value: Option<&Value>,
        schema: &Schema,
        dataset: &Dataset,
    ) -> FieldValidation {
        // hidden fields can't block a fill
        if !is_visible(&field.id, schema, dataset) {
            return FieldValidation::valid();
        }
        check(field, value, self.today())
    }

    fn validate_items(
        field: &Field,
        items: &[Value],
        today: NaiveDate,
        report: &mut ValidationReport,
    ) {
        for (index, item) in items.iter().enumerate() {
            for sub in &field.sub_fields {
                let path = format!("{}.{}.{}", field.id, index, sub.id);
                let result = check(sub, item.get(&sub.id), today);
                report.record(path, result);
            }
        }
    }
}

fn check(field: &Field, value: Option<&Value>, today: NaiveDate) -> FieldValidation {
    match value.filter(|v| !is_empty_value(v)) {
        None if field.required => {
            FieldValidation::invalid(format!("{} is required", field.display_name()))
        }
        None => FieldValidation::valid(),
        Some(value) => rules::check_value(field, value, today),
    }
}

impl DatasetValidator for SchemaValidator {
    fn validate_dataset(&self, schema: &Schema, dataset: &Dataset) -> ValidationReport {
        let mut report = ValidationReport::default();
        let today = self.today();

        for field in &schema.fields {
            let value = dataset.resolve(&field.id);
            let result = if is_visible(&field.id, schema, dataset) {
                check(field, value, today)
            } else {
                FieldValidation::valid()
            };
            let visible_items = match (field.field_type, value) {
                (FieldType::Repeating, Some(Value::Array(items)))
                    if !result.is_blocking() && is_visible(&field.id, schema, dataset) =>
                {
                    Some(items)
                }
                _ => None,
            };
            report.record(field.id.clone(), result);

            if let Some(items) = visible_items {
                Self::validate_items(field, items, today, &mut report);
            }
        }

        for key in dataset.values.keys() {
            let known = schema.field(key).is_some()
                || schema.fields.iter().any(|f| key.starts_with(&format!("{}.", f.id)));
            if !known {
                report.warnings.push(ValidationIssue {
                    field_id: key.clone(),
                    message: format!("'{}' isn't a field in this template and will be ignored", key),
                });
            }
        }

        report.is_valid = report.errors.is_empty();
        tracing::debug!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Dataset validated"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shared_types::{Condition, ConditionalAction, Conditional, Validation};

    fn validator() -> SchemaValidator {
        SchemaValidator::with_today(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
    }

    #[test]
    fn test_invalid_month_blocks() {
        let schema = Schema::new(vec![Field::new("effectiveDate", FieldType::Date).required()]);
        let dataset = Dataset::new().with_value("effectiveDate", json!("2026-13-01"));
        let report = validator().validate_dataset(&schema, &dataset);

        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field_id, "effectiveDate");
        assert_eq!(report.results["effectiveDate"].status, FieldStatus::Invalid);
    }

    #[test]
    fn test_unpinned_validator_uses_the_current_date() {
        let schema = Schema::new(vec![Field::new("start", FieldType::Date).with_validation(
            Validation {
                not_in_past: true,
                ..Default::default()
            },
        )]);
        let validator = SchemaValidator::new();
        let today = chrono::Local::now().date_naive();
        let yesterday = today.pred_opt().unwrap();
        let next_year = today + chrono::Duration::days(366);

        let past = Dataset::new().with_value("start", json!(yesterday.format("%Y-%m-%d").to_string()));
        assert!(!validator.validate_dataset(&schema, &past).is_valid);

        let future = Dataset::new().with_value("start", json!(next_year.format("%Y-%m-%d").to_string()));
        assert!(validator.validate_dataset(&schema, &future).is_valid);

        // a pinned date is used as given
        let pinned = SchemaValidator::with_today(yesterday - chrono::Duration::days(1));
        assert!(pinned.validate_dataset(&schema, &past).is_valid);
    }

    #[test]
    fn test_required_missing() {
        let schema = Schema::new(vec![
            Field::new("tenant", FieldType::Text).with_label("Tenant name").required(),
            Field::new("notes", FieldType::Textarea),
        ]);
        let report = validator().validate_dataset(&schema, &Dataset::new());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].message, "Tenant name is required");
        assert_eq!(report.results["notes"].status, FieldStatus::Valid);
    }

    #[test]
    fn test_hidden_required_field_passes() {
        let schema = Schema::new(vec![
            Field::new("hasPets", FieldType::Boolean),
            Field::new("petDeposit", FieldType::Currency).required(),
        ])
        .with_conditional(Conditional {
            target: "petDeposit".into(),
            source: "hasPets".into(),
            condition: Condition::IsTrue,
            action: ConditionalAction::Show,
        });

        let no_pets = Dataset::new().with_value("hasPets", json!(false));
        assert!(validator().validate_dataset(&schema, &no_pets).is_valid);

        let pets = Dataset::new().with_value("hasPets", json!(true));
        let report = validator().validate_dataset(&schema, &pets);
        assert!(!report.is_valid);
        assert!(report.error_for("petDeposit").is_some());
    }

    #[test]
    fn test_repeating_items_validated_by_path() {
        let schema = Schema::new(vec![Field::new("parties", FieldType::Repeating)
            .with_sub_fields(vec![Field::new("name", FieldType::Text).required()])]);
        let dataset = Dataset::new().with_value("parties", json!([{"name": "Ann"}, {"name": ""}]));
        let report = validator().validate_dataset(&schema, &dataset);

        assert!(!report.is_valid);
        assert_eq!(report.errors[0].field_id, "parties.1.name");
        assert_eq!(report.results["parties.0.name"].status, FieldStatus::Valid);
    }

    #[test]
    fn test_unknown_keys_and_rounding_are_warnings() {
        let schema = Schema::new(vec![Field::new("rent", FieldType::Currency)]);
        let dataset = Dataset::new()
            .with_value("rent", json!("1200.555"))
            .with_value("color", json!("blue"));
        let report = validator().validate_dataset(&schema, &dataset);

        assert!(report.is_valid);
        let warned: Vec<_> = report.warnings.iter().map(|w| w.field_id.as_str()).collect();
        assert_eq!(warned, vec!["rent", "color"]);
    }

    #[test]
    fn test_report_is_reproducible() {
        let schema = Schema::new(vec![Field::new("start", FieldType::Date).required()]);
        let dataset = Dataset::new().with_value("start", json!("2026-02-30"));
        let a = validator().validate_dataset(&schema, &dataset);
        let b = validator().validate_dataset(&schema, &dataset);
        assert_eq!(a, b);
    }
}
