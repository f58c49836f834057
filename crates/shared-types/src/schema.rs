//! Template schema: the declarative description of every fillable field

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::control::ControlKey;

/// Errors raised while importing a schema
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate field id: {0}")]
    DuplicateField(String),

    #[error("Field id must not be empty")]
    EmptyFieldId,
}

/// Supported field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Date,
    Number,
    Currency,
    Dropdown,
    Boolean,
    Party,
    Address,
    Repeating,
}

/// Type-specific validation constraints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regex the whole value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Message shown instead of the generic pattern failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
    /// Earliest allowed date (ISO `YYYY-MM-DD`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    /// Latest allowed date (ISO `YYYY-MM-DD`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not_in_past: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

/// A selectable dropdown entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    /// Stored value
    pub value: String,
    /// Display label written into the document
    pub label: String,
}

/// Character and text styling applied when a field is written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    /// Upper-case the formatted value
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub all_caps: bool,
    /// Wrap the value in quotation marks (defined terms)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub quote_wrap: bool,
}

impl FieldStyle {
    /// True when the style carries anything the host must apply at character level
    pub fn has_character_style(&self) -> bool {
        self.font_family.is_some()
            || self.font_size.is_some()
            || self.bold
            || self.italic
            || self.underline
    }
}

/// How dates are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePattern {
    /// January 5, 2026
    #[default]
    Long,
    /// 5th day of January, 2026
    LongOrdinal,
    /// 5 January 2026
    DayMonthYear,
    /// 01/05/2026
    NumericMonthFirst,
    /// 05/01/2026
    NumericDayFirst,
    /// 2026-01-05
    Iso,
}

impl DatePattern {
    /// Parse a pattern name as used in configuration
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace('-', "_").as_str() {
            "long" => Some(DatePattern::Long),
            "long_ordinal" | "ordinal" => Some(DatePattern::LongOrdinal),
            "day_month_year" | "dmy" => Some(DatePattern::DayMonthYear),
            "numeric_month_first" | "us" | "mdy" => Some(DatePattern::NumericMonthFirst),
            "numeric_day_first" | "eu" => Some(DatePattern::NumericDayFirst),
            "iso" => Some(DatePattern::Iso),
            _ => None,
        }
    }
}

/// How numbers are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberStyle {
    Decimal,
    Currency,
    Percent,
    Words,
    /// "One Thousand Dollars ($1,000.00)"
    WordsWithNumerals,
}

/// Address block layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressLayout {
    #[default]
    MultiLine,
    SingleLine,
}

/// Per-field rendering options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_pattern: Option<DatePattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_style: Option<NumberStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_symbol: Option<String>,
    #[serde(default)]
    pub address_layout: AddressLayout,
    /// Labels for `true` and `false`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_labels: Option<(String, String)>,
}

/// A schema field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub validation: Validation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<DropdownOption>,
    #[serde(default)]
    pub style: FieldStyle,
    #[serde(default)]
    pub format: FieldFormat,
    /// Sub-fields of repeating and composite fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_fields: Vec<Field>,
}

impl Field {
    /// Create a field with default constraints and style
    pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            field_type,
            required: false,
            validation: Validation::default(),
            options: Vec::new(),
            style: FieldStyle::default(),
            format: FieldFormat::default(),
            sub_fields: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_style(mut self, style: FieldStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_format(mut self, format: FieldFormat) -> Self {
        self.format = format;
        self
    }

    /// Add a dropdown option
    pub fn with_option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(DropdownOption {
            value: value.into(),
            label: label.into(),
        });
        self
    }

    pub fn with_sub_fields(mut self, sub_fields: Vec<Field>) -> Self {
        self.sub_fields = sub_fields;
        self
    }

    /// Find a declared sub-field
    pub fn sub_field(&self, id: &str) -> Option<&Field> {
        self.sub_fields.iter().find(|f| f.id == id)
    }

    /// Display label for a stored dropdown value
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }

    /// Human-readable name used in messages
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// Comparison applied by a conditional rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "camelCase")]
pub enum Condition {
    Equals(serde_json::Value),
    NotEquals(serde_json::Value),
    In(Vec<serde_json::Value>),
    IsEmpty,
    IsNotEmpty,
    IsTrue,
    IsFalse,
}

/// What a conditional does to its target when the condition holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalAction {
    #[default]
    Show,
    Hide,
}

/// Conditional visibility rule: `target` is shown/hidden depending on `source`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    /// Field whose visibility is controlled
    pub target: String,
    /// Field whose value is inspected
    pub source: String,
    pub condition: Condition,
    #[serde(default)]
    pub action: ConditionalAction,
}

/// The full template schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditionals: Vec<Conditional>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn with_conditional(mut self, conditional: Conditional) -> Self {
        self.conditionals.push(conditional);
        self
    }

    /// Look up a top-level field
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Resolve the field a control key addresses (sub-field for indexed keys)
    pub fn field_for_key(&self, key: &ControlKey) -> Option<&Field> {
        let parent = self.field(&key.field_id)?;
        match &key.sub_field {
            Some(sub) => parent.sub_field(sub),
            None => Some(parent),
        }
    }

    /// Conditionals targeting a field
    pub fn conditionals_for<'a>(&'a self, field_id: &'a str) -> impl Iterator<Item = &'a Conditional> {
        self.conditionals.iter().filter(move |c| c.target == field_id)
    }

    /// Import a schema from JSON, rejecting duplicate or empty ids
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.check_ids()?;
        Ok(schema)
    }

    /// Export the schema as pretty JSON
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_ids(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.id.is_empty() {
                return Err(SchemaError::EmptyFieldId);
            }
            if !seen.insert(field.id.as_str()) {
                return Err(SchemaError::DuplicateField(field.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_schema_json_round_trip() {
        let schema = Schema::new(vec![
            Field::new("state", FieldType::Dropdown)
                .with_option("ma", "Massachusetts")
                .with_style(FieldStyle {
                    all_caps: true,
                    ..Default::default()
                }),
            Field::new("effectiveDate", FieldType::Date).required(),
        ])
        .with_conditional(Conditional {
            target: "effectiveDate".to_string(),
            source: "state".to_string(),
            condition: Condition::Equals(serde_json::json!("ma")),
            action: ConditionalAction::Show,
        });

        let json = schema.to_json().unwrap();
        let back = Schema::from_json(&json).unwrap();
        assert_eq!(schema, back);
    }

    #[test]
    fn test_schema_parses_camel_case_document() {
        let json = r#"{
            "fields": [
                {"id": "tenant", "type": "text", "label": "Tenant", "required": true,
                 "validation": {"minLength": 2, "maxLength": 80},
                 "style": {"allCaps": true, "quoteWrap": true}}
            ],
            "conditionals": [
                {"target": "tenant", "source": "hasTenant",
                 "condition": {"operator": "isTrue"}, "action": "show"}
            ]
        }"#;
        let schema = Schema::from_json(json).unwrap();
        let tenant = schema.field("tenant").unwrap();
        assert!(tenant.required);
        assert_eq!(tenant.validation.min_length, Some(2));
        assert!(tenant.style.all_caps && tenant.style.quote_wrap);
        assert_eq!(schema.conditionals[0].condition, Condition::IsTrue);
    }

    #[test]
    fn test_duplicate_field_ids_rejected() {
        let json = r#"{"fields": [{"id": "a", "type": "text"}, {"id": "a", "type": "number"}]}"#;
        assert!(matches!(
            Schema::from_json(json),
            Err(SchemaError::DuplicateField(id)) if id == "a"
        ));
    }

    #[test]
    fn test_field_for_indexed_key_resolves_sub_field() {
        let schema = Schema::new(vec![Field::new("parties", FieldType::Repeating)
            .with_sub_fields(vec![Field::new("name", FieldType::Text)])]);
        let key = ControlKey::indexed("parties", 0, "name");
        assert_eq!(schema.field_for_key(&key).unwrap().id, "name");
        let missing = ControlKey::indexed("parties", 0, "email");
        assert!(schema.field_for_key(&missing).is_none());
    }

    #[test]
    fn test_date_pattern_names() {
        assert_eq!(DatePattern::from_name("long"), Some(DatePattern::Long));
        assert_eq!(DatePattern::from_name("Day-Month-Year"), Some(DatePattern::DayMonthYear));
        assert_eq!(DatePattern::from_name("nope"), None);
    }
}
