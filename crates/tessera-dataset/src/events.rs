// crates/tessera-dataset/src/events.rs
//
// Dataset lifecycle and progress events.
//
// The DatasetManager publishes events on a tokio broadcast channel. Every
// subscriber receives its own clone of each event, so a progress record
// seen by one subscriber is never shared with another or with the engine.

use serde::Serialize;
use uuid::Uuid;

use tessera_core::{DatasetProgress, SemVer};

/// Events emitted by the DatasetManager.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DatasetEvent {
    /// A file of a running batch finished (successfully or not).
    Progress {
        dataset_id: Uuid,
        progress: DatasetProgress,
    },
    /// Dataset creation passed validation and is about to upload.
    CreateStarted {
        dataset_id: Uuid,
        name: String,
        file_count: usize,
    },
    /// Dataset creation committed to the registry.
    CreateCompleted {
        dataset_id: Uuid,
        name: String,
        version: SemVer,
        file_count: usize,
        /// Files that could not be uploaded.
        failed: usize,
    },
    /// Dataset creation was rejected after it started.
    CreateFailed { name: String, error: String },
    /// A new version record was appended to a dataset's history.
    VersionCreated {
        dataset_id: Uuid,
        version: SemVer,
        created_by: String,
        summary: String,
    },
    /// A dataset and its history were removed.
    Deleted { dataset_id: Uuid, name: String },
}

impl DatasetEvent {
    /// Channel name of the event, e.g. `dataset:create:start`.
    pub fn channel(&self) -> &'static str {
        match self {
            DatasetEvent::Progress { .. } => "dataset:progress",
            DatasetEvent::CreateStarted { .. } => "dataset:create:start",
            DatasetEvent::CreateCompleted { .. } => "dataset:create:complete",
            DatasetEvent::CreateFailed { .. } => "dataset:create:error",
            DatasetEvent::VersionCreated { .. } => "dataset:version:create",
            DatasetEvent::Deleted { .. } => "dataset:delete",
        }
    }

    /// Dataset the event refers to, when one exists.
    pub fn dataset_id(&self) -> Option<Uuid> {
        match self {
            DatasetEvent::Progress { dataset_id, .. }
            | DatasetEvent::CreateStarted { dataset_id, .. }
            | DatasetEvent::CreateCompleted { dataset_id, .. }
            | DatasetEvent::VersionCreated { dataset_id, .. }
            | DatasetEvent::Deleted { dataset_id, .. } => Some(*dataset_id),
            DatasetEvent::CreateFailed { .. } => None,
        }
    }
}
