//! Error types for host access, fill operations, and dataset storage

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by the host document capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Document is protected: {0}")]
    Protected(String),

    #[error("Control no longer exists: {0}")]
    StaleControl(String),

    #[error("Host did not respond in time: {0}")]
    Timeout(String),

    #[error("Host failure: {0}")]
    General(String),
}

/// The engine action that was running when a host failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Scan,
    Fill,
    Undo,
    Checkpoint,
}

impl Action {
    fn verb(&self) -> &'static str {
        match self {
            Action::Scan => "scan the document",
            Action::Fill => "fill the template",
            Action::Undo => "undo the last change",
            Action::Checkpoint => "save a restore point",
        }
    }
}

/// Errors surfaced at the orchestrator boundary
#[derive(Error, Debug)]
pub enum FillError {
    #[error("Failed to {}: {source}", .action.verb())]
    Host {
        action: Action,
        #[source]
        source: HostError,
    },

    #[error("Field not found in schema: {0}")]
    UnknownField(String),

    #[error("Field is not a repeating section: {0}")]
    NotRepeating(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Dataset store error: {0}")]
    Store(#[from] StoreError),
}

impl FillError {
    pub fn host(action: Action, source: HostError) -> Self {
        FillError::Host { action, source }
    }

    /// User-facing sentence for this failure; the technical cause stays in `source()`
    pub fn user_message(&self) -> String {
        match self {
            FillError::Host { action, source } => host_failure_message(*action, source),
            FillError::UnknownField(id) => format!(
                "The field '{}' isn't part of this template. Reload the template and try again.",
                id
            ),
            FillError::NotRepeating(id) => format!(
                "The field '{}' isn't a repeating section, so it can't be filled item by item.",
                id
            ),
            FillError::DatasetNotFound(id) => format!(
                "The saved data '{}' could not be found. It may have been deleted.",
                id
            ),
            FillError::Store(err) => format!("Your saved data couldn't be loaded. ({})", err),
        }
    }

    /// Whether trying the same operation again may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FillError::Host { source, .. } => !matches!(source, HostError::Protected(_)),
            FillError::Store(StoreError::Offline) | FillError::Store(StoreError::Io(_)) => true,
            _ => false,
        }
    }
}

/// Map a host failure to a fixed human-readable cause for the given action
pub fn host_failure_message(action: Action, error: &HostError) -> String {
    let lead = format!("Couldn't {}.", action.verb());
    let cause = match error {
        HostError::Protected(_) => {
            "The document is protected or read-only. Turn off editing restrictions and try again."
        }
        HostError::StaleControl(_) => match action {
            Action::Undo => "Some fields were changed or deleted since the last fill, so they can't be restored.",
            _ => "It looks like some fields were changed or deleted. Try scanning again.",
        },
        HostError::Timeout(_) => "The document took too long to respond. Please try again.",
        HostError::General(_) => "Something went wrong while talking to the document. Please try again.",
    };
    format!("{} {}", lead, cause)
}

/// Errors from a dataset store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Store is offline")]
    Offline,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
