//! Value formatting
//!
//! Turns a raw dataset value into the text written into a control: a
//! type-specific rendering followed by a style pass. Formatting never fails;
//! a value that can't be interpreted is written as its plain string form.

pub mod dates;
pub mod numbers;

pub use dates::{format_date, parse_date};
pub use numbers::parse_number;

use serde_json::{Map, Value};
use shared_types::{
    value_to_plain_string, AddressLayout, DatePattern, Field, FieldStyle, FieldType, NumberStyle,
};

use crate::config::EngineConfig;

const NAME_KEYS: &[&str] = &["name", "fullName", "displayName", "entityName", "companyName"];
const STREET_KEYS: &[&str] = &["street", "street1", "line1", "address1"];
const STREET2_KEYS: &[&str] = &["street2", "line2", "address2", "unit"];
const ZIP_KEYS: &[&str] = &["zip", "zipCode", "postalCode"];

/// Read `true`/`false` from booleans and the usual yes/no spellings
pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Formats values using field options, falling back to engine-wide defaults
#[derive(Debug, Clone)]
pub struct ValueFormatter {
    date_pattern: DatePattern,
    currency_symbol: String,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ValueFormatter {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            date_pattern: config.date_pattern,
            currency_symbol: config.currency_symbol.clone(),
        }
    }

    /// Base formatting followed by the style pass: the text that gets written
    pub fn render(&self, field: &Field, value: &Value) -> String {
        apply_style_to_value(&field.style, self.format(field, value))
    }

    /// Type-specific rendering
    pub fn format(&self, field: &Field, value: &Value) -> String {
        match field.field_type {
            FieldType::Text | FieldType::Textarea => plain_text(value),
            FieldType::Date => self.format_date_value(field, value),
            FieldType::Number | FieldType::Currency => self.format_number(field, value),
            FieldType::Dropdown => {
                let raw = value_to_plain_string(value);
                field
                    .option_label(raw.trim())
                    .map(str::to_string)
                    .unwrap_or(raw)
            }
            FieldType::Boolean => {
                let (yes, no) = field
                    .format
                    .boolean_labels
                    .clone()
                    .unwrap_or_else(|| ("Yes".to_string(), "No".to_string()));
                match parse_bool(value) {
                    Some(true) => yes,
                    Some(false) => no,
                    None => value_to_plain_string(value),
                }
            }
            FieldType::Party => format_party(value),
            FieldType::Address => format_address(value, field.format.address_layout),
            FieldType::Repeating => self.format_items(field, value),
        }
    }

    fn format_date_value(&self, field: &Field, value: &Value) -> String {
        let raw = value_to_plain_string(value);
        let pattern = field.format.date_pattern.unwrap_or(self.date_pattern);
        match parse_date(&raw) {
            Some(date) => format_date(date, pattern),
            None => raw,
        }
    }

    fn format_number(&self, field: &Field, value: &Value) -> String {
        let Some(number) = parse_number(value) else {
            return value_to_plain_string(value);
        };

        let style = field.format.number_style.unwrap_or(match field.field_type {
            FieldType::Currency => NumberStyle::Currency,
            _ => NumberStyle::Decimal,
        });
        let symbol = field
            .format
            .currency_symbol
            .as_deref()
            .unwrap_or(&self.currency_symbol);

        match style {
            NumberStyle::Decimal => {
                let decimals = field
                    .format
                    .decimals
                    .unwrap_or_else(|| numbers::written_decimals(value));
                numbers::format_grouped(number, decimals)
            }
            NumberStyle::Currency => {
                numbers::format_currency(number, symbol, field.format.decimals.unwrap_or(2))
            }
            NumberStyle::Percent => {
                let decimals = field
                    .format
                    .decimals
                    .unwrap_or_else(|| numbers::written_decimals(value));
                format!("{}%", numbers::format_grouped(number, decimals))
            }
            NumberStyle::Words => numbers::amount_to_words(number),
            NumberStyle::WordsWithNumerals => match field.field_type {
                FieldType::Currency => numbers::currency_words_with_numerals(number, symbol),
                _ => format!(
                    "{} ({})",
                    numbers::amount_to_words(number),
                    numbers::format_grouped(number, numbers::written_decimals(value))
                ),
            },
        }
    }

    /// One line per item, sub-field values separated by commas
    fn format_items(&self, field: &Field, value: &Value) -> String {
        let Value::Array(items) = value else {
            return value_to_plain_string(value);
        };

        items
            .iter()
            .map(|item| match item {
                Value::Object(map) if !field.sub_fields.is_empty() => field
                    .sub_fields
                    .iter()
                    .filter_map(|sub| {
                        map.get(&sub.id)
                            .filter(|v| !shared_types::is_empty_value(v))
                            .map(|v| self.render(sub, v))
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                other => plain_text(other),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Style pass, independent of type: all-caps, then quote-wrapping
pub fn apply_style_to_value(style: &FieldStyle, formatted: String) -> String {
    let mut text = formatted;
    if style.all_caps {
        text = text.to_uppercase();
    }
    if style.quote_wrap {
        text = format!("\u{201C}{}\u{201D}", text);
    }
    text
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(value_to_plain_string)
            .collect::<Vec<_>>()
            .join(", "),
        other => value_to_plain_string(other),
    }
}

fn first_string<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Display name of a party: explicit name, else first + last
fn format_party(value: &Value) -> String {
    let Value::Object(map) = value else {
        return value_to_plain_string(value);
    };

    if let Some(name) = first_string(map, NAME_KEYS) {
        return name.to_string();
    }

    let full: Vec<&str> = [
        first_string(map, &["firstName"]),
        first_string(map, &["middleName"]),
        first_string(map, &["lastName"]),
    ]
    .into_iter()
    .flatten()
    .collect();

    if full.is_empty() {
        value_to_plain_string(value)
    } else {
        full.join(" ")
    }
}

fn format_address(value: &Value, layout: AddressLayout) -> String {
    let Value::Object(map) = value else {
        return value_to_plain_string(value);
    };

    let city = first_string(map, &["city"]).unwrap_or_default();
    let state = first_string(map, &["state"]).unwrap_or_default();
    let zip = first_string(map, ZIP_KEYS).unwrap_or_default();

    let state_zip = [state, zip]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let locality = [city, state_zip.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let lines: Vec<&str> = [
        first_string(map, STREET_KEYS).unwrap_or_default(),
        first_string(map, STREET2_KEYS).unwrap_or_default(),
        locality.as_str(),
        first_string(map, &["country"]).unwrap_or_default(),
    ]
    .into_iter()
    .filter(|l| !l.is_empty())
    .collect();

    if lines.is_empty() {
        return value_to_plain_string(value);
    }

    match layout {
        AddressLayout::MultiLine => lines.join("\n"),
        AddressLayout::SingleLine => lines.join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::{FieldFormat, FieldStyle};

    fn render(field: &Field, value: Value) -> String {
        ValueFormatter::default().render(field, &value)
    }

    #[test]
    fn test_dropdown_label_then_caps() {
        let field = Field::new("state", FieldType::Dropdown)
            .with_option("ma", "Massachusetts")
            .with_style(FieldStyle {
                all_caps: true,
                ..Default::default()
            });
        assert_eq!(render(&field, json!("ma")), "MASSACHUSETTS");
        // unknown values fall back to the raw value
        assert_eq!(render(&field, json!("zz")), "ZZ");
    }

    #[test]
    fn test_quote_wrap_defined_term() {
        let field = Field::new("tenantTerm", FieldType::Text).with_style(FieldStyle {
            quote_wrap: true,
            ..Default::default()
        });
        assert_eq!(render(&field, json!("Tenant")), "\u{201C}Tenant\u{201D}");
    }

    #[test]
    fn test_dates() {
        let field = Field::new("start", FieldType::Date);
        assert_eq!(render(&field, json!("2026-03-01")), "March 1, 2026");

        let ordinal = Field::new("start", FieldType::Date).with_format(FieldFormat {
            date_pattern: Some(DatePattern::LongOrdinal),
            ..Default::default()
        });
        assert_eq!(render(&ordinal, json!("2026-03-01")), "1st day of March, 2026");

        // unparseable dates degrade to the raw text
        assert_eq!(render(&field, json!("sometime soon")), "sometime soon");
    }

    #[test]
    fn test_numbers() {
        let currency = Field::new("rent", FieldType::Currency);
        assert_eq!(render(&currency, json!(1850)), "$1,850.00");
        assert_eq!(render(&currency, json!("n/a")), "n/a");

        let decimal = Field::new("sqft", FieldType::Number);
        assert_eq!(render(&decimal, json!(12500)), "12,500");

        let percent = Field::new("rate", FieldType::Number).with_format(FieldFormat {
            number_style: Some(NumberStyle::Percent),
            ..Default::default()
        });
        assert_eq!(render(&percent, json!(7.5)), "7.5%");

        let words = Field::new("deposit", FieldType::Currency).with_format(FieldFormat {
            number_style: Some(NumberStyle::WordsWithNumerals),
            ..Default::default()
        });
        assert_eq!(
            render(&words, json!(2500)),
            "Two Thousand Five Hundred Dollars ($2,500.00)"
        );
    }

    #[test]
    fn test_very_large_amounts_in_words() {
        let words = Field::new("cap", FieldType::Currency).with_format(FieldFormat {
            number_style: Some(NumberStyle::WordsWithNumerals),
            ..Default::default()
        });
        assert_eq!(
            render(&words, json!("5000000000000000")),
            "Five Quadrillion Dollars ($5,000,000,000,000,000.00)"
        );

        let plain = Field::new("units", FieldType::Number).with_format(FieldFormat {
            number_style: Some(NumberStyle::Words),
            ..Default::default()
        });
        assert_eq!(render(&plain, json!(1_000_000_000_000_000u64)), "One Quadrillion");
        assert!(!render(&plain, json!(1e25)).is_empty());
    }

    #[test]
    fn test_boolean_labels() {
        let field = Field::new("pets", FieldType::Boolean);
        assert_eq!(render(&field, json!(true)), "Yes");
        assert_eq!(render(&field, json!("no")), "No");

        let custom = Field::new("pets", FieldType::Boolean).with_format(FieldFormat {
            boolean_labels: Some(("Permitted".into(), "Not permitted".into())),
            ..Default::default()
        });
        assert_eq!(render(&custom, json!(false)), "Not permitted");
    }

    #[test]
    fn test_party_names() {
        let field = Field::new("landlord", FieldType::Party);
        assert_eq!(render(&field, json!({"name": "Acme LLC", "type": "entity"})), "Acme LLC");
        assert_eq!(render(&field, json!({"firstName": "Jane", "lastName": "Doe"})), "Jane Doe");
        assert_eq!(render(&field, json!("Bob Smith")), "Bob Smith");
    }

    #[test]
    fn test_address_layouts() {
        let value = json!({"street": "1 Main St", "unit": "Apt 2", "city": "Boston", "state": "MA", "zip": "02108"});
        let multi = Field::new("premises", FieldType::Address);
        assert_eq!(render(&multi, value.clone()), "1 Main St\nApt 2\nBoston, MA 02108");

        let single = Field::new("premises", FieldType::Address).with_format(FieldFormat {
            address_layout: AddressLayout::SingleLine,
            ..Default::default()
        });
        assert_eq!(render(&single, value), "1 Main St, Apt 2, Boston, MA 02108");
    }

    #[test]
    fn test_repeating_items() {
        let field = Field::new("parties", FieldType::Repeating).with_sub_fields(vec![
            Field::new("name", FieldType::Text),
            Field::new("share", FieldType::Number),
        ]);
        let value = json!([{"name": "Ann", "share": 60}, {"name": "Ben", "share": 40}]);
        assert_eq!(render(&field, value), "Ann, 60\nBen, 40");
    }
}
