//! Shared fixtures for fill-engine integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use fill_engine::{EngineConfig, FillEngine, MemoryDocument, SchemaValidator};
use serde_json::json;
use shared_types::{
    Condition, Conditional, ConditionalAction, Dataset, Field, FieldStyle, FieldType, RawControl,
    Schema,
};
use std::time::Duration;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
}

/// Residential lease template
pub fn lease_schema() -> Schema {
    let mut schema = Schema::new(vec![
        Field::new("tenant", FieldType::Text).with_label("Tenant name").required(),
        Field::new("landlord", FieldType::Party).with_label("Landlord"),
        Field::new("effectiveDate", FieldType::Date)
            .with_label("Effective date")
            .required(),
        Field::new("rent", FieldType::Currency).with_label("Monthly rent").required(),
        Field::new("state", FieldType::Dropdown)
            .with_label("State")
            .with_option("ma", "Massachusetts")
            .with_option("ny", "New York")
            .with_style(FieldStyle {
                all_caps: true,
                ..Default::default()
            }),
        Field::new("hasPets", FieldType::Boolean),
        Field::new("petDeposit", FieldType::Currency).required(),
        Field::new("occupants", FieldType::Repeating).with_sub_fields(vec![
            Field::new("name", FieldType::Text).required(),
            Field::new("relation", FieldType::Text),
        ]),
    ])
    .with_conditional(Conditional {
        target: "petDeposit".into(),
        source: "hasPets".into(),
        condition: Condition::IsTrue,
        action: ConditionalAction::Show,
    });
    schema.name = Some("Residential Lease".into());
    schema
}

/// Controls of a lease document, as the host reports them
pub fn lease_controls() -> Vec<RawControl> {
    vec![
        RawControl::new("c-tenant", "tenant", "Tenant name").with_placeholder("Tenant name"),
        RawControl::new("c-landlord", "landlord", "{{landlord}}"),
        RawControl::new("c-date", "effectiveDate", ""),
        RawControl::new("c-rent", "rent", ""),
        RawControl::new("c-rent-2", "rent", "$0.00"),
        RawControl::new("c-state", "state", ""),
        RawControl::new("c-deposit", "petDeposit", ""),
        RawControl::new("c-occ-0", "occupants_0_name", ""),
        RawControl::new("c-occ-1", "occupants_1_name", ""),
        RawControl::new("c-footer", "footerNote", "Page 1"),
    ]
}

pub fn lease_dataset() -> Dataset {
    Dataset::from_values(json!({
        "tenant": "Jane Doe",
        "landlord": {"name": "Acme Properties LLC"},
        "effectiveDate": "2026-02-01",
        "rent": "1850",
        "state": "ma",
        "hasPets": false,
        "occupants": [{"name": "Sam Doe", "relation": "child"}],
    }))
}

pub fn config() -> EngineConfig {
    EngineConfig::default().with_scan_ttl(Duration::from_secs(60))
}

pub fn engine_with(controls: Vec<RawControl>, config: EngineConfig) -> FillEngine<MemoryDocument> {
    FillEngine::new(MemoryDocument::new(controls), config)
        .with_validator(SchemaValidator::with_today(today()))
}

pub fn lease_engine() -> FillEngine<MemoryDocument> {
    engine_with(lease_controls(), config())
}
