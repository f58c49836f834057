//! Controls: labeled regions discovered in the host document

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    /// `parent_<index>_<sub>`; the parent is matched lazily so `rent_0_amount` splits at the first index
    static ref INDEXED_TAG_PATTERN: Regex =
        Regex::new(r"^(?P<parent>.+?)_(?P<index>\d+)_(?P<sub>.+)$").unwrap();

    /// Unfilled marker such as `{{tenant_name}}`
    static ref DOUBLE_BRACE_PATTERN: Regex = Regex::new(r"^\{\{.*\}\}$").unwrap();
}

/// Structured address of a control: a field, or one sub-field of one repeating item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlKey {
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_field: Option<String>,
}

impl ControlKey {
    /// Key for a plain field
    pub fn field(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            index: None,
            sub_field: None,
        }
    }

    /// Key for one sub-field of one repeating item
    pub fn indexed(field_id: impl Into<String>, index: usize, sub_field: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            index: Some(index),
            sub_field: Some(sub_field.into()),
        }
    }

    /// Parse a control tag. Returns `None` for blank tags.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }

        if let Some(caps) = INDEXED_TAG_PATTERN.captures(tag) {
            if let Ok(index) = caps["index"].parse::<usize>() {
                return Some(Self::indexed(&caps["parent"], index, &caps["sub"]));
            }
        }

        Some(Self::field(tag))
    }

    /// Render back to the tag form the host stores
    pub fn to_tag(&self) -> String {
        match (self.index, &self.sub_field) {
            (Some(index), Some(sub)) => format!("{}_{}_{}", self.field_id, index, sub),
            _ => self.field_id.clone(),
        }
    }

    /// Dataset path for this key (`parties.0.name`)
    pub fn dataset_path(&self) -> String {
        match (self.index, &self.sub_field) {
            (Some(index), Some(sub)) => format!("{}.{}.{}", self.field_id, index, sub),
            _ => self.field_id.clone(),
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tag())
    }
}

/// Kind of region reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    #[default]
    RichText,
    PlainText,
    Date,
    DropDown,
    ComboBox,
    CheckBox,
    #[serde(other)]
    Unknown,
}

/// One region as read from the host, before interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawControl {
    pub id: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub placeholder_text: String,
    #[serde(default)]
    pub kind: ControlKind,
}

impl RawControl {
    pub fn new(id: impl Into<String>, tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            label: String::new(),
            text: text.into(),
            placeholder_text: String::new(),
            kind: ControlKind::RichText,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder_text = placeholder.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// An interpreted control produced by a scan. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub id: String,
    pub key: ControlKey,
    pub label: String,
    pub text: String,
    pub placeholder_text: String,
    pub kind: ControlKind,
    pub is_empty: bool,
}

impl Control {
    /// Interpret a raw control. The tag is preferred; the label is the fallback.
    /// Controls with neither are not recognized.
    pub fn from_raw(raw: &RawControl, unfilled_markers: &[String]) -> Option<Self> {
        let key = ControlKey::parse(&raw.tag).or_else(|| ControlKey::parse(&raw.label))?;
        let is_empty = is_unfilled_text(&raw.text, &raw.placeholder_text, unfilled_markers);

        Some(Self {
            id: raw.id.clone(),
            key,
            label: raw.label.clone(),
            text: raw.text.clone(),
            placeholder_text: raw.placeholder_text.clone(),
            kind: raw.kind,
            is_empty,
        })
    }

    pub fn field_id(&self) -> &str {
        &self.key.field_id
    }
}

/// Whether a control's text still reads as unfilled
pub fn is_unfilled_text(text: &str, placeholder: &str, extra_markers: &[String]) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }
    if !placeholder.trim().is_empty() && trimmed == placeholder.trim() {
        return true;
    }
    if DOUBLE_BRACE_PATTERN.is_match(trimmed) {
        return true;
    }
    extra_markers.iter().any(|m| !m.is_empty() && trimmed == m.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_tag() {
        let key = ControlKey::parse("effective_date").unwrap();
        assert_eq!(key, ControlKey::field("effective_date"));
        assert!(!key.is_indexed());
    }

    #[test]
    fn test_parse_indexed_tag() {
        let key = ControlKey::parse("parties_2_name").unwrap();
        assert_eq!(key, ControlKey::indexed("parties", 2, "name"));
        assert_eq!(key.to_tag(), "parties_2_name");
        assert_eq!(key.dataset_path(), "parties.2.name");
    }

    #[test]
    fn test_parse_indexed_tag_with_underscored_sub_field() {
        let key = ControlKey::parse("tenants_0_first_name").unwrap();
        assert_eq!(key, ControlKey::indexed("tenants", 0, "first_name"));
    }

    #[test]
    fn test_parse_blank_tag() {
        assert!(ControlKey::parse("   ").is_none());
    }

    #[test]
    fn test_unfilled_detection() {
        assert!(is_unfilled_text("", "", &[]));
        assert!(is_unfilled_text("  ", "", &[]));
        assert!(is_unfilled_text("Enter name", "Enter name", &[]));
        assert!(is_unfilled_text("{{tenant_name}}", "", &[]));
        assert!(is_unfilled_text("TBD", "", &["TBD".to_string()]));
        assert!(!is_unfilled_text("Jane Doe", "Enter name", &[]));
        assert!(!is_unfilled_text("{{ partial", "", &[]));
    }

    #[test]
    fn test_control_from_raw_falls_back_to_label() {
        let raw = RawControl::new("c1", "", "Jane").with_label("tenant");
        let control = Control::from_raw(&raw, &[]).unwrap();
        assert_eq!(control.field_id(), "tenant");
        assert!(!control.is_empty);

        let untagged = RawControl::new("c2", "", "text");
        assert!(Control::from_raw(&untagged, &[]).is_none());
    }
}
