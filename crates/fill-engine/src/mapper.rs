//! Reconcile schema fields against the controls found in a document

use serde::{Deserialize, Serialize};
use shared_types::{FieldType, Schema};

use crate::scanner::ControlMap;

/// A schema field and the controls that represent it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMatch {
    pub field_id: String,
    pub field_type: FieldType,
    pub control_ids: Vec<String>,
}

impl FieldMatch {
    /// The same field appears in several places
    pub fn is_multiple(&self) -> bool {
        self.control_ids.len() > 1
    }
}

/// A control the schema doesn't describe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedControl {
    pub control_id: String,
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingReport {
    pub matched: Vec<FieldMatch>,
    pub unmatched_controls: Vec<UnmatchedControl>,
    pub unmatched_fields: Vec<String>,
    pub warnings: Vec<String>,
}

impl MappingReport {
    /// Every schema field has at least one control and every control a field
    pub fn is_complete(&self) -> bool {
        self.unmatched_controls.is_empty() && self.unmatched_fields.is_empty()
    }
}

/// Map schema fields to scanned controls. Pure: reads the map, touches nothing.
pub fn map_schema(schema: &Schema, controls: &ControlMap) -> MappingReport {
    let mut report = MappingReport::default();

    for field in &schema.fields {
        let Some(found) = controls.get(&field.id).filter(|c| !c.is_empty()) else {
            report.unmatched_fields.push(field.id.clone());
            report.warnings.push(format!(
                "Field '{}' has no matching control in the document",
                field.display_name()
            ));
            continue;
        };

        let mut control_ids = Vec::with_capacity(found.len());
        for control in found {
            // indexed controls must name a declared sub-field
            let declared = match &control.key.sub_field {
                Some(sub) => field.sub_field(sub).is_some(),
                None => true,
            };
            if declared {
                control_ids.push(control.id.clone());
            } else {
                report.unmatched_controls.push(UnmatchedControl {
                    control_id: control.id.clone(),
                    tag: control.key.to_tag(),
                });
                report.warnings.push(format!(
                    "Control '{}' refers to an unknown part of '{}'",
                    control.key,
                    field.display_name()
                ));
            }
        }

        if control_ids.is_empty() {
            report.unmatched_fields.push(field.id.clone());
            continue;
        }

        report.matched.push(FieldMatch {
            field_id: field.id.clone(),
            field_type: field.field_type,
            control_ids,
        });
    }

    let mut orphan_ids: Vec<&String> = controls
        .keys()
        .filter(|id| schema.field(id).is_none())
        .collect();
    orphan_ids.sort();

    for field_id in orphan_ids {
        for control in &controls[field_id] {
            report.unmatched_controls.push(UnmatchedControl {
                control_id: control.id.clone(),
                tag: control.key.to_tag(),
            });
        }
        report.warnings.push(format!(
            "Document has a '{}' field that the template doesn't describe",
            field_id
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{group_by_field, interpret_controls};
    use pretty_assertions::assert_eq;
    use shared_types::{Field, RawControl};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("tenant", FieldType::Text),
            Field::new("rent", FieldType::Currency),
            Field::new("parties", FieldType::Repeating)
                .with_sub_fields(vec![Field::new("name", FieldType::Text)]),
        ])
    }

    fn control_map(raw: &[RawControl]) -> ControlMap {
        group_by_field(&interpret_controls(raw, &[]))
    }

    #[test]
    fn test_matches_one_to_many() {
        let map = control_map(&[
            RawControl::new("c1", "tenant", ""),
            RawControl::new("c2", "tenant", ""),
            RawControl::new("c3", "rent", ""),
            RawControl::new("c4", "parties_0_name", ""),
        ]);
        let report = map_schema(&schema(), &map);

        assert_eq!(report.matched.len(), 3);
        assert!(report.matched[0].is_multiple());
        assert_eq!(report.matched[0].control_ids, vec!["c1", "c2"]);
        assert!(report.is_complete());
    }

    #[test]
    fn test_reports_unmatched_both_ways() {
        let map = control_map(&[
            RawControl::new("c1", "tenant", ""),
            RawControl::new("c9", "guarantor", ""),
            RawControl::new("c10", "parties_0_email", ""),
        ]);
        let report = map_schema(&schema(), &map);

        assert_eq!(report.unmatched_fields, vec!["rent", "parties"]);
        let orphan_ids: Vec<_> = report
            .unmatched_controls
            .iter()
            .map(|c| c.control_id.as_str())
            .collect();
        assert_eq!(orphan_ids, vec!["c10", "c9"]);
        assert!(report.warnings.iter().any(|w| w.contains("guarantor")));
    }

    #[test]
    fn test_empty_document_reports_every_field() {
        let report = map_schema(&schema(), &ControlMap::new());
        assert!(report.matched.is_empty());
        assert_eq!(report.unmatched_fields.len(), 3);
        assert_eq!(report.warnings.len(), 3);
    }
}
