//! Snapshots and the bounded undo stack

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::Control;
use std::collections::{BTreeMap, VecDeque};

/// Control text captured at one instant. Immutable once taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    taken_at: DateTime<Utc>,
    texts: BTreeMap<String, String>,
}

impl Snapshot {
    /// Capture the text of every given control
    pub fn capture<'a>(controls: impl IntoIterator<Item = &'a Control>) -> Self {
        Self {
            taken_at: Utc::now(),
            texts: controls
                .into_iter()
                .map(|c| (c.id.clone(), c.text.clone()))
                .collect(),
        }
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Saved text for a control
    pub fn text_of(&self, control_id: &str) -> Option<&str> {
        self.texts.get(control_id).map(String::as_str)
    }

    pub fn contains(&self, control_id: &str) -> bool {
        self.texts.contains_key(control_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.texts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Why a snapshot was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    Fill,
    SingleField,
    RepeatingSection,
    Checkpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoEntry {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub kind: SnapshotKind,
    pub snapshot: Snapshot,
}

/// Summary of an entry, for history listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoSummary {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub kind: SnapshotKind,
    pub control_count: usize,
}

/// LIFO stack of snapshots with a fixed maximum depth
#[derive(Debug, Clone)]
pub struct UndoStack {
    entries: VecDeque<UndoEntry>,
    max_depth: usize,
}

impl UndoStack {
    /// A depth of zero is raised to one so the latest operation can always be undone
    pub fn new(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            entries: VecDeque::with_capacity(max_depth),
            max_depth,
        }
    }

    /// Push a snapshot; drops the oldest entries past the bound. Never fails.
    pub fn push(&mut self, snapshot: Snapshot, description: impl Into<String>, kind: SnapshotKind) {
        self.push_entry(UndoEntry {
            timestamp: Utc::now(),
            description: description.into(),
            kind,
            snapshot,
        });
    }

    /// Put an entry back on top, e.g. after a failed restore
    pub fn push_entry(&mut self, entry: UndoEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_depth {
            if let Some(dropped) = self.entries.pop_front() {
                tracing::debug!(description = %dropped.description, "Oldest undo entry discarded");
            }
        }
    }

    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop_back()
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.back()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Newest first
    pub fn history(&self) -> Vec<UndoSummary> {
        self.entries
            .iter()
            .rev()
            .map(|e| UndoSummary {
                timestamp: e.timestamp,
                description: e.description.clone(),
                kind: e.kind,
                control_count: e.snapshot.len(),
            })
            .collect()
    }
}
