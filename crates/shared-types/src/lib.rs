//! Shared data model for template filling
//!
//! Schemas, datasets, and the controls discovered in a host document.
//! These types are exchanged as JSON with the task pane and dataset store.

pub mod control;
pub mod dataset;
pub mod schema;

pub use control::{is_unfilled_text, Control, ControlKey, ControlKind, RawControl};
pub use dataset::{is_empty_value, value_to_plain_string, Dataset};
pub use schema::{
    AddressLayout, Condition, Conditional, ConditionalAction, DatePattern, DropdownOption, Field,
    FieldFormat, FieldStyle, FieldType, NumberStyle, Schema, SchemaError, Validation,
};
