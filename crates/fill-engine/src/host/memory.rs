//! In-memory host document
//!
//! Backs the command line tool (documents stored as JSON) and the test suite.
//! Counts round-trips and can inject failures per control or per batch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::RawControl;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::{BatchOutcome, HostDocument, OpFailure, StyleSpec, WriteBatch, WriteOp};
use crate::error::HostError;

/// Serialized form of a document: its controls in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFile {
    pub controls: Vec<RawControl>,
}

#[derive(Debug, Default)]
struct DocumentState {
    controls: Vec<RawControl>,
    styles: HashMap<String, StyleSpec>,
    highlighted: HashSet<String>,
    read_count: usize,
    commit_count: usize,
    text_write_count: usize,
    rejecting: HashSet<String>,
    rejecting_styles: HashSet<String>,
    read_failure: Option<HostError>,
    commit_failure: Option<HostError>,
}

/// A host document held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryDocument {
    state: Mutex<DocumentState>,
}

impl MemoryDocument {
    pub fn new(controls: Vec<RawControl>) -> Self {
        Self {
            state: Mutex::new(DocumentState {
                controls,
                ..Default::default()
            }),
        }
    }

    pub fn from_file(file: DocumentFile) -> Self {
        Self::new(file.controls)
    }

    /// Current controls, in document order
    pub fn to_file(&self) -> DocumentFile {
        DocumentFile {
            controls: self.state().controls.clone(),
        }
    }

    fn state(&self) -> MutexGuard<'_, DocumentState> {
        // a panic elsewhere must not make the document unreadable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Text currently held by a control
    pub fn text_of(&self, control_id: &str) -> Option<String> {
        self.state()
            .controls
            .iter()
            .find(|c| c.id == control_id)
            .map(|c| c.text.clone())
    }

    /// Map of control id to text
    pub fn texts(&self) -> HashMap<String, String> {
        self.state()
            .controls
            .iter()
            .map(|c| (c.id.clone(), c.text.clone()))
            .collect()
    }

    pub fn style_of(&self, control_id: &str) -> Option<StyleSpec> {
        self.state().styles.get(control_id).cloned()
    }

    pub fn is_highlighted(&self, control_id: &str) -> bool {
        self.state().highlighted.contains(control_id)
    }

    /// Edit a control directly, as a user typing in the document would
    pub fn edit(&self, control_id: &str, text: &str) {
        if let Some(control) = self
            .state()
            .controls
            .iter_mut()
            .find(|c| c.id == control_id)
        {
            control.text = text.to_string();
        }
    }

    /// Remove a control from the document
    pub fn remove(&self, control_id: &str) {
        self.state().controls.retain(|c| c.id != control_id);
    }

    pub fn read_count(&self) -> usize {
        self.state().read_count
    }

    pub fn commit_count(&self) -> usize {
        self.state().commit_count
    }

    /// Number of text writes applied so far
    pub fn text_write_count(&self) -> usize {
        self.state().text_write_count
    }

    /// Make every op addressed at `control_id` fail inside its batch
    pub fn reject_writes_to(&self, control_id: &str) {
        self.state().rejecting.insert(control_id.to_string());
    }

    pub fn accept_writes_to(&self, control_id: &str) {
        self.state().rejecting.remove(control_id);
        self.state().rejecting_styles.remove(control_id);
    }

    /// Make only style changes on `control_id` fail; its text still lands
    pub fn reject_styles_for(&self, control_id: &str) {
        self.state().rejecting_styles.insert(control_id.to_string());
    }

    /// Make reads fail until cleared
    pub fn fail_reads(&self, error: Option<HostError>) {
        self.state().read_failure = error;
    }

    /// Make whole commits fail until cleared
    pub fn fail_commits(&self, error: Option<HostError>) {
        self.state().commit_failure = error;
    }
}

#[async_trait]
impl HostDocument for MemoryDocument {
    async fn read_controls(&self) -> Result<Vec<RawControl>, HostError> {
        let mut state = self.state();
        state.read_count += 1;
        if let Some(error) = &state.read_failure {
            return Err(error.clone());
        }
        Ok(state.controls.clone())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<BatchOutcome, HostError> {
        let mut state = self.state();
        state.commit_count += 1;
        if let Some(error) = &state.commit_failure {
            return Err(error.clone());
        }

        let mut outcome = BatchOutcome::default();
        for (op_index, op) in batch.ops().iter().enumerate() {
            let control_id = op.control_id().to_string();

            if state.rejecting.contains(&control_id) {
                outcome.failures.push(OpFailure {
                    op_index,
                    control_id: control_id.clone(),
                    error: HostError::General(format!("Control {} rejected the change", control_id)),
                });
                continue;
            }

            let Some(position) = state.controls.iter().position(|c| c.id == control_id) else {
                outcome.failures.push(OpFailure {
                    op_index,
                    control_id: control_id.clone(),
                    error: HostError::StaleControl(control_id),
                });
                continue;
            };

            match op {
                WriteOp::WriteText { text, .. } => {
                    state.controls[position].text = text.clone();
                    state.highlighted.remove(&control_id);
                    state.text_write_count += 1;
                }
                WriteOp::SetStyle { .. } if state.rejecting_styles.contains(&control_id) => {
                    outcome.failures.push(OpFailure {
                        op_index,
                        control_id: control_id.clone(),
                        error: HostError::General(format!("Control {} does not accept styling", control_id)),
                    });
                }
                WriteOp::SetStyle { style, .. } => {
                    state.styles.insert(control_id, style.clone());
                }
                WriteOp::Highlight { .. } => {
                    state.highlighted.insert(control_id);
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> MemoryDocument {
        MemoryDocument::new(vec![
            RawControl::new("c1", "tenant", ""),
            RawControl::new("c2", "landlord", "Acme"),
        ])
    }

    #[tokio::test]
    async fn test_commit_applies_text_and_counts() {
        let doc = doc();
        let mut batch = WriteBatch::new();
        batch.write_text("c1", "Jane");
        let outcome = doc.commit(batch).await.unwrap();

        assert!(outcome.is_clean());
        assert_eq!(doc.text_of("c1").as_deref(), Some("Jane"));
        assert_eq!(doc.commit_count(), 1);
        assert_eq!(doc.text_write_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_control_is_stale_failure() {
        let doc = doc();
        let mut batch = WriteBatch::new();
        batch.write_text("gone", "x");
        batch.write_text("c2", "Other");
        let outcome = doc.commit(batch).await.unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].error, HostError::StaleControl("gone".into()));
        assert_eq!(doc.text_of("c2").as_deref(), Some("Other"));
    }

    #[tokio::test]
    async fn test_style_rejection_keeps_text() {
        let doc = doc();
        doc.reject_styles_for("c1");
        let mut batch = WriteBatch::new();
        batch.write_text("c1", "Jane");
        batch.set_style(
            "c1",
            StyleSpec {
                bold: true,
                ..Default::default()
            },
        );
        let outcome = doc.commit(batch).await.unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].op_index, 1);
        assert_eq!(doc.text_of("c1").as_deref(), Some("Jane"));
        assert_eq!(doc.style_of("c1"), None);
    }

    #[tokio::test]
    async fn test_injected_read_failure() {
        let doc = doc();
        doc.fail_reads(Some(HostError::Timeout("slow".into())));
        assert!(doc.read_controls().await.is_err());
        doc.fail_reads(None);
        assert_eq!(doc.read_controls().await.unwrap().len(), 2);
        assert_eq!(doc.read_count(), 2);
    }

    #[test]
    fn test_document_file_json() {
        let json = r#"{"controls": [{"id": "c1", "tag": "tenant", "text": "", "placeholderText": "Tenant name"}]}"#;
        let file: DocumentFile = serde_json::from_str(json).unwrap();
        let doc = MemoryDocument::from_file(file.clone());
        assert_eq!(doc.to_file(), file);
    }
}
