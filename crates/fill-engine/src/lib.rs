//! Fill Engine
//!
//! Transactional filling of document templates from structured datasets.
//!
//! The engine discovers labeled regions ("controls") in a host document,
//! maps them to a template [`Schema`](shared_types::Schema), validates a
//! [`Dataset`](shared_types::Dataset) against it, formats each value for its
//! field, and writes everything back in one batch. Each write is preceded by a
//! snapshot on a bounded undo stack.
//!
//! ```no_run
//! use fill_engine::{EngineConfig, FillEngine, FillOptions, MemoryDocument};
//! use shared_types::{Dataset, Field, FieldType, RawControl, Schema};
//!
//! # async fn run() -> Result<(), fill_engine::FillError> {
//! let document = MemoryDocument::new(vec![RawControl::new("c1", "tenant", "")]);
//! let mut engine = FillEngine::new(document, EngineConfig::default());
//!
//! let schema = Schema::new(vec![Field::new("tenant", FieldType::Text).required()]);
//! let dataset = Dataset::new().with_value("tenant", serde_json::json!("Jane Doe"));
//!
//! let result = engine.fill_template(&schema, &dataset, FillOptions::default()).await?;
//! assert!(result.is_success());
//! engine.undo().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod host;
pub mod mapper;
pub mod scanner;
pub mod store;
pub mod undo;
pub mod validator;

pub use config::EngineConfig;
pub use engine::{
    ControlError, FillEngine, FillOptions, FillResult, FillStatus, FilledControl, SkipReason,
    SkippedControl, UndoResult, NOTHING_TO_UNDO,
};
pub use error::{host_failure_message, Action, FillError, HostError, StoreError};
pub use formatter::{apply_style_to_value, ValueFormatter};
pub use host::{BatchOutcome, HostDocument, MemoryDocument, OpFailure, StyleSpec, WriteBatch, WriteOp};
pub use mapper::{map_schema, FieldMatch, MappingReport, UnmatchedControl};
pub use scanner::{ControlMap, ScanCache, ScanOutcome};
pub use store::{
    DatasetPage, DatasetStore, DatasetSummary, JsonDirStore, ListOptions, MemoryDatasetStore,
    SyncStatus,
};
pub use undo::{Snapshot, SnapshotKind, UndoEntry, UndoStack, UndoSummary};
pub use validator::{
    DatasetValidator, FieldStatus, FieldValidation, SchemaValidator, ValidationIssue,
    ValidationReport,
};
