// crates/tessera-versioning/src/diff.rs
//
// Structural diffing of file lists, snapshots, and metadata.
//
// Files are matched by content id. A file present on both sides counts as
// modified when its serialized record differs, which catches per-file
// metadata changes such as tags even though the bytes are unchanged.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use tessera_core::{
    DatasetMetadata, DatasetSnapshot, SemVer, TesseraError, UploadResult, VersionChanges,
};

/// A file whose content id is on both sides but whose record differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub cid: String,
    pub from: UploadResult,
    pub to: UploadResult,
}

/// One differing metadata field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub from: Value,
    pub to: Value,
}

/// Result of diffing two file lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDiff {
    pub added: Vec<UploadResult>,
    pub removed: Vec<UploadResult>,
    pub modified: Vec<FileChange>,
}

impl FileDiff {
    /// Content-id view of the diff, as recorded in a version.
    pub fn to_changes(&self) -> VersionChanges {
        VersionChanges {
            added: self.added.iter().map(|f| f.cid.clone()).collect(),
            removed: self.removed.iter().map(|f| f.cid.clone()).collect(),
            modified: self.modified.iter().map(|c| c.cid.clone()).collect(),
            ..VersionChanges::default()
        }
    }
}

/// Answer to "what changed between two versions of a dataset".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionComparison {
    pub dataset_id: Uuid,
    pub from_version: SemVer,
    pub to_version: SemVer,
    pub files_added: Vec<UploadResult>,
    pub files_removed: Vec<UploadResult>,
    pub files_modified: Vec<FileChange>,
    pub metadata_changes: BTreeMap<String, FieldChange>,
}

impl VersionComparison {
    pub fn is_identical(&self) -> bool {
        self.files_added.is_empty()
            && self.files_removed.is_empty()
            && self.files_modified.is_empty()
            && self.metadata_changes.is_empty()
    }
}

fn record_value(file: &UploadResult) -> Result<Value, TesseraError> {
    Ok(serde_json::to_value(file)?)
}

/// Diff two file lists keyed by content id.
///
/// `added` follows the order of `to`, `removed` and `modified` the order
/// of `from`.
pub fn diff_files(from: &[UploadResult], to: &[UploadResult]) -> Result<FileDiff, TesseraError> {
    let from_map: HashMap<&str, &UploadResult> = from.iter().map(|f| (f.cid.as_str(), f)).collect();
    let to_map: HashMap<&str, &UploadResult> = to.iter().map(|f| (f.cid.as_str(), f)).collect();

    let mut diff = FileDiff::default();

    for file in to {
        if !from_map.contains_key(file.cid.as_str()) {
            diff.added.push(file.clone());
        }
    }

    for file in from {
        match to_map.get(file.cid.as_str()) {
            None => diff.removed.push(file.clone()),
            Some(other) => {
                if record_value(file)? != record_value(other)? {
                    diff.modified.push(FileChange {
                        cid: file.cid.clone(),
                        from: file.clone(),
                        to: (*other).clone(),
                    });
                }
            }
        }
    }

    Ok(diff)
}

/// Field-by-field diff over the union of both sides' metadata keys.
pub fn diff_metadata(
    from: &DatasetMetadata,
    to: &DatasetMetadata,
) -> Result<BTreeMap<String, FieldChange>, TesseraError> {
    let from_value = serde_json::to_value(from)?;
    let to_value = serde_json::to_value(to)?;
    let empty = serde_json::Map::new();
    let from_obj = from_value.as_object().unwrap_or(&empty);
    let to_obj = to_value.as_object().unwrap_or(&empty);

    let keys: BTreeSet<&String> = from_obj.keys().chain(to_obj.keys()).collect();
    let mut changes = BTreeMap::new();
    for key in keys {
        let a = from_obj.get(key).cloned().unwrap_or(Value::Null);
        let b = to_obj.get(key).cloned().unwrap_or(Value::Null);
        if a != b {
            changes.insert(key.clone(), FieldChange { from: a, to: b });
        }
    }
    Ok(changes)
}

/// Compare two snapshots of the same dataset.
pub fn compare_snapshots(
    dataset_id: Uuid,
    from_version: SemVer,
    from: &DatasetSnapshot,
    to_version: SemVer,
    to: &DatasetSnapshot,
) -> Result<VersionComparison, TesseraError> {
    let files = diff_files(&from.files, &to.files)?;
    Ok(VersionComparison {
        dataset_id,
        from_version,
        to_version,
        files_added: files.added,
        files_removed: files.removed,
        files_modified: files.modified,
        metadata_changes: diff_metadata(&from.metadata, &to.metadata)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn file(cid: &str, tags: &[&str]) -> UploadResult {
        UploadResult {
            cid: cid.to_string(),
            size: 1,
            encrypted: false,
            access_conditions: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            uploaded_at: chrono::DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            original_path: cid.to_string(),
            content_hash: None,
        }
    }

    #[test]
    fn classifies_added_removed_and_modified() {
        let from = vec![file("a", &[]), file("b", &[]), file("c", &["x"])];
        let to = vec![file("c", &["y"]), file("d", &[]), file("a", &[])];

        let diff = diff_files(&from, &to).unwrap();
        let cids = |v: &[UploadResult]| v.iter().map(|f| f.cid.clone()).collect::<Vec<_>>();
        assert_eq!(cids(&diff.added), vec!["d"]);
        assert_eq!(cids(&diff.removed), vec!["b"]);
        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.modified[0].cid, "c");
        assert_eq!(diff.modified[0].to.tags, vec!["y".to_string()]);
    }

    #[test]
    fn metadata_diff_covers_keys_on_either_side() {
        let from = DatasetMetadata {
            author: Some("ada".to_string()),
            ..DatasetMetadata::default()
        };
        let mut to = DatasetMetadata {
            license: Some("MIT".to_string()),
            ..DatasetMetadata::default()
        };
        to.custom.insert("rows".to_string(), serde_json::json!(10));

        let changes = diff_metadata(&from, &to).unwrap();
        assert_eq!(
            changes.keys().cloned().collect::<Vec<_>>(),
            vec!["author", "custom", "license"]
        );
        assert_eq!(changes["author"].from, serde_json::json!("ada"));
        assert_eq!(changes["author"].to, Value::Null);
        assert_eq!(changes["custom"].to, serde_json::json!({"rows": 10}));
    }

    #[test]
    fn identical_lists_produce_empty_diff() {
        let files = vec![file("a", &["t"]), file("b", &[])];
        let diff = diff_files(&files, &files).unwrap();
        assert_eq!(diff, FileDiff::default());
        assert!(diff.to_changes().is_empty());
    }
}
