// crates/tessera-core/src/version.rs
//
// Version history records: structural change descriptors, frozen
// snapshots, and the immutable version record that ties them together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dataset::{Dataset, DatasetMetadata};
use crate::semver::SemVer;
use crate::upload::UploadResult;

/// Structural diff descriptor built by every mutating operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionChanges {
    /// Content ids that entered the live file list.
    #[serde(default)]
    pub added: Vec<String>,
    /// Content ids that left the live file list.
    #[serde(default)]
    pub removed: Vec<String>,
    /// Content ids still present whose stored record changed.
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub metadata_changed: bool,
    #[serde(default)]
    pub config_changed: bool,
    /// Human-readable summary; filled in by the version manager when empty.
    #[serde(default)]
    pub summary: String,
}

impl VersionChanges {
    /// Changes describing a brand-new dataset: every file is an addition.
    pub fn initial(dataset: &Dataset) -> Self {
        Self {
            added: dataset.files.iter().map(|f| f.cid.clone()).collect(),
            summary: format!("Initial version with {} files", dataset.files.len()),
            ..Self::default()
        }
    }

    /// True when nothing structural was recorded.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && !self.metadata_changed
            && !self.config_changed
    }
}

/// Configuration fields captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub encrypt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_conditions: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A frozen, independent copy of a dataset's state.
///
/// Built from owned clones, so nothing in a snapshot can be reached through
/// the live `Dataset` it was captured from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    pub files: Vec<UploadResult>,
    pub metadata: DatasetMetadata,
    pub config: SnapshotConfig,
    pub total_size: u64,
    pub file_count: usize,
}

impl DatasetSnapshot {
    pub fn capture(dataset: &Dataset) -> Self {
        Self {
            files: dataset.files.clone(),
            metadata: dataset.metadata.clone(),
            config: SnapshotConfig {
                name: dataset.name.clone(),
                description: dataset.description.clone(),
                encrypt: dataset.encrypted,
                access_conditions: dataset.access_conditions.clone(),
                tags: dataset.tags.clone(),
            },
            total_size: dataset.total_size(),
            file_count: dataset.files.len(),
        }
    }

    pub fn file_ids(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.cid.as_str()).collect()
    }

    /// Overwrite the dataset's content with independent copies of this
    /// snapshot. Identity, version, timestamps, and revision are untouched.
    pub fn restore_into(&self, dataset: &mut Dataset) {
        dataset.files = self.files.clone();
        dataset.metadata = self.metadata.clone();
        dataset.description = self.config.description.clone();
        dataset.access_conditions = self.config.access_conditions.clone();
        dataset.tags = self.config.tags.clone();
    }
}

/// An immutable point-in-time record in a dataset's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub id: Uuid,
    pub dataset_id: Uuid,
    pub version: SemVer,
    pub changes: VersionChanges,
    pub snapshot: DatasetSnapshot,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetConfig;

    fn file(cid: &str) -> UploadResult {
        UploadResult {
            cid: cid.to_string(),
            size: 4,
            encrypted: false,
            access_conditions: None,
            tags: vec!["t".to_string()],
            uploaded_at: Utc::now(),
            original_path: cid.to_string(),
            content_hash: None,
        }
    }

    #[test]
    fn snapshot_is_independent_of_live_dataset() {
        let mut ds = Dataset::new(DatasetConfig::new("snap"), vec![file("a"), file("b")]);
        ds.metadata.custom.insert("k".to_string(), serde_json::json!([1, 2]));
        let snapshot = DatasetSnapshot::capture(&ds);
        let before = snapshot.clone();

        ds.files[0].tags.push("mutated".to_string());
        ds.files.pop();
        ds.metadata.keywords.insert("new".to_string());
        ds.metadata.custom.insert("k".to_string(), serde_json::json!("changed"));

        assert_eq!(snapshot, before);
        assert_eq!(snapshot.file_count, 2);
        assert_eq!(snapshot.total_size, 8);
    }

    #[test]
    fn initial_changes_list_every_file() {
        let ds = Dataset::new(DatasetConfig::new("init"), vec![file("a"), file("b"), file("c")]);
        let changes = VersionChanges::initial(&ds);
        assert_eq!(changes.added.len(), 3);
        assert!(!changes.is_empty());
        assert!(VersionChanges::default().is_empty());
    }
}
