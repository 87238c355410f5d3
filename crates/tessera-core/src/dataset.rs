// crates/tessera-core/src/dataset.rs

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::semver::SemVer;
use crate::upload::{UploadOptions, UploadResult};

/// Descriptive metadata attached to a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    /// Free-form key/value pairs supplied by the caller.
    #[serde(default)]
    pub custom: BTreeMap<String, serde_json::Value>,
}

/// Everything the caller supplies when creating a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub encrypt: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_conditions: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: DatasetMetadata,
}

impl DatasetConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Upload options every file of this dataset is stored with.
    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            encrypt: self.encrypt,
            access_conditions: self.access_conditions.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// A named, versioned collection of stored files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Unique identifier (UUID v7, so ids sort by creation time).
    pub id: Uuid,
    /// Unique among live datasets.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Live file list. Content ids are unique within it.
    pub files: Vec<UploadResult>,
    pub metadata: DatasetMetadata,
    pub version: SemVer,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_conditions: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Bumped on every committed mutation; used for compare-and-swap.
    #[serde(default)]
    pub revision: u64,
}

impl Dataset {
    /// Build a fresh dataset at the initial version from a config and the
    /// files that were stored for it. Duplicate content ids are collapsed,
    /// keeping the last occurrence in place of the first.
    pub fn new(config: DatasetConfig, files: Vec<UploadResult>) -> Self {
        let now = Utc::now();
        let mut dataset = Self {
            id: Uuid::now_v7(),
            name: config.name,
            description: config.description,
            files: Vec::with_capacity(files.len()),
            metadata: config.metadata,
            version: SemVer::initial(),
            created_at: now,
            updated_at: now,
            encrypted: config.encrypt,
            access_conditions: config.access_conditions,
            tags: config.tags,
            revision: 0,
        };
        for file in files {
            dataset.upsert_file(file);
        }
        dataset
    }

    /// Upload options matching this dataset's configuration.
    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            encrypt: self.encrypted,
            access_conditions: self.access_conditions.clone(),
            tags: self.tags.clone(),
        }
    }

    pub fn file_ids(&self) -> HashSet<&str> {
        self.files.iter().map(|f| f.cid.as_str()).collect()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Insert a file, replacing any live entry with the same content id.
    ///
    /// Returns the replaced entry, if there was one.
    pub fn upsert_file(&mut self, file: UploadResult) -> Option<UploadResult> {
        match self.files.iter_mut().find(|f| f.cid == file.cid) {
            Some(existing) => Some(std::mem::replace(existing, file)),
            None => {
                self.files.push(file);
                None
            }
        }
    }

    /// Remove a file by content id. Returns the removed entry.
    pub fn remove_file(&mut self, cid: &str) -> Option<UploadResult> {
        let pos = self.files.iter().position(|f| f.cid == cid)?;
        Some(self.files.remove(pos))
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(cid: &str, size: u64) -> UploadResult {
        UploadResult {
            cid: cid.to_string(),
            size,
            encrypted: false,
            access_conditions: None,
            tags: Vec::new(),
            uploaded_at: Utc::now(),
            original_path: format!("/data/{}", cid),
            content_hash: None,
        }
    }

    #[test]
    fn new_dataset_starts_at_initial_version() {
        let ds = Dataset::new(DatasetConfig::new("genomes"), vec![file("a", 10), file("b", 5)]);
        assert_eq!(ds.version, SemVer::new(1, 0, 0));
        assert_eq!(ds.files.len(), 2);
        assert_eq!(ds.total_size(), 15);
        assert_eq!(ds.revision, 0);
    }

    #[test]
    fn duplicate_cids_are_collapsed() {
        let mut dup = file("a", 99);
        dup.tags.push("second".to_string());
        let ds = Dataset::new(DatasetConfig::new("dups"), vec![file("a", 99), file("b", 1), dup]);
        assert_eq!(ds.files.len(), 2);
        assert_eq!(ds.files[0].cid, "a");
        assert_eq!(ds.files[0].tags, vec!["second".to_string()]);
    }

    #[test]
    fn remove_file_returns_entry() {
        let mut ds = Dataset::new(DatasetConfig::new("rm"), vec![file("a", 1), file("b", 2)]);
        assert_eq!(ds.remove_file("a").map(|f| f.size), Some(1));
        assert!(ds.remove_file("a").is_none());
        assert_eq!(ds.file_ids().into_iter().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn upload_options_follow_config() {
        let mut config = DatasetConfig::new("opts");
        config.tags = vec!["raw".to_string()];
        config.encrypt = true;
        let opts = config.upload_options();
        assert!(opts.encrypt);
        assert_eq!(opts.tags, vec!["raw".to_string()]);
    }
}
