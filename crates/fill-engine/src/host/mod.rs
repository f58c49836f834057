//! Host document capability
//!
//! The engine never touches a document directly. It reads all labeled regions
//! in one round-trip and commits every change of an operation as one batch.

pub mod memory;

pub use memory::MemoryDocument;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{FieldStyle, RawControl};

use crate::error::HostError;

/// Character-level style the host applies to a control's text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl StyleSpec {
    /// Character style carried by a field, if it declares any
    pub fn from_field_style(style: &FieldStyle) -> Option<Self> {
        if !style.has_character_style() {
            return None;
        }
        Some(Self {
            font_family: style.font_family.clone(),
            font_size: style.font_size,
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
        })
    }
}

/// A single queued change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    WriteText { control_id: String, text: String },
    SetStyle { control_id: String, style: StyleSpec },
    /// Visually mark a control that was left unfilled
    Highlight { control_id: String },
}

impl WriteOp {
    pub fn control_id(&self) -> &str {
        match self {
            WriteOp::WriteText { control_id, .. }
            | WriteOp::SetStyle { control_id, .. }
            | WriteOp::Highlight { control_id } => control_id,
        }
    }
}

/// All changes of one logical operation, committed in one round-trip
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_text(&mut self, control_id: impl Into<String>, text: impl Into<String>) {
        self.ops.push(WriteOp::WriteText {
            control_id: control_id.into(),
            text: text.into(),
        });
    }

    pub fn set_style(&mut self, control_id: impl Into<String>, style: StyleSpec) {
        self.ops.push(WriteOp::SetStyle {
            control_id: control_id.into(),
            style,
        });
    }

    pub fn highlight(&mut self, control_id: impl Into<String>) {
        self.ops.push(WriteOp::Highlight {
            control_id: control_id.into(),
        });
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// One operation the host rejected inside an otherwise committed batch
#[derive(Debug, Clone, PartialEq)]
pub struct OpFailure {
    /// Index into the batch's ops
    pub op_index: usize,
    pub control_id: String,
    pub error: HostError,
}

/// Result of a committed batch. An `Err` from `commit` means nothing can be claimed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub failures: Vec<OpFailure>,
}

impl BatchOutcome {
    /// Failure for a given op, if the host rejected it
    pub fn failure_for(&self, op_index: usize) -> Option<&OpFailure> {
        self.failures.iter().find(|f| f.op_index == op_index)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The capability surface the engine consumes from the host document
#[async_trait]
pub trait HostDocument: Send + Sync {
    /// Read every labeled region (id, tag, label, text, kind, placeholder) in one round-trip
    async fn read_controls(&self) -> Result<Vec<RawControl>, HostError>;

    /// Apply a batch of text/style changes in one round-trip
    async fn commit(&self, batch: WriteBatch) -> Result<BatchOutcome, HostError>;
}
