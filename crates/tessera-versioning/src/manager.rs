// crates/tessera-versioning/src/manager.rs
//
// VersionManager: append-only version history per dataset.
//
// Each dataset id maps to its ordered list of `DatasetVersion` records.
// Records are only ever appended, and the whole list is dropped when the
// dataset is purged. Nothing here rewrites a stored version or snapshot.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_core::{
    Dataset, DatasetSnapshot, DatasetVersion, SemVer, TesseraError, VersionChanges,
};

use crate::bump::{determine_bump, summarize};
use crate::diff::{compare_snapshots, diff_files, VersionComparison};

/// Creator recorded on versions produced by rollbacks.
pub const SYSTEM_CREATOR: &str = "system";

/// Registry of version histories, keyed by dataset id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionManager {
    histories: HashMap<Uuid, Vec<DatasetVersion>>,
}

impl VersionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a manager from previously exported records.
    ///
    /// Records are grouped per dataset and ordered by version. Duplicate
    /// versions within one dataset are rejected.
    pub fn from_records(records: Vec<DatasetVersion>) -> Result<Self, TesseraError> {
        let mut histories: HashMap<Uuid, Vec<DatasetVersion>> = HashMap::new();
        for record in records {
            histories.entry(record.dataset_id).or_default().push(record);
        }
        for (dataset_id, history) in histories.iter_mut() {
            history.sort_by_key(|v| v.version);
            if history.windows(2).any(|w| w[0].version == w[1].version) {
                return Err(TesseraError::Validation(format!(
                    "duplicate version in history of dataset {}",
                    dataset_id
                )));
            }
        }
        Ok(Self { histories })
    }

    /// Every stored record, grouped by dataset.
    pub fn records(&self) -> impl Iterator<Item = &DatasetVersion> {
        self.histories.values().flatten()
    }

    /// Version the next record for this dataset would get for `changes`.
    ///
    /// The first record takes the dataset's own version (the initial
    /// `1.0.0`). Later records bump whichever is higher of the latest
    /// recorded version and the dataset's version.
    pub fn next_version(
        &self,
        dataset: &Dataset,
        changes: &VersionChanges,
    ) -> Result<SemVer, TesseraError> {
        match self.latest_version(dataset.id) {
            None => Ok(dataset.version),
            Some(latest) => latest
                .version
                .max(dataset.version)
                .bump(determine_bump(changes)),
        }
    }

    /// Freeze a snapshot of `dataset`, decide its version, and append the
    /// record. Returns a copy of the stored record.
    ///
    /// The caller is responsible for assigning the returned version to the
    /// live dataset.
    pub fn create_version(
        &mut self,
        dataset: &Dataset,
        mut changes: VersionChanges,
        created_by: &str,
    ) -> Result<DatasetVersion, TesseraError> {
        let version = self.next_version(dataset, &changes)?;
        if changes.summary.is_empty() {
            changes.summary = summarize(&changes);
        }

        let record = DatasetVersion {
            id: Uuid::now_v7(),
            dataset_id: dataset.id,
            version,
            summary: changes.summary.clone(),
            changes,
            snapshot: DatasetSnapshot::capture(dataset),
            created_at: Utc::now(),
            created_by: created_by.to_string(),
        };

        tracing::debug!(
            "Dataset {} -> {} ({}) by {}",
            dataset.id,
            record.version,
            record.summary,
            created_by
        );

        self.histories
            .entry(dataset.id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    /// Full ordered history of a dataset (empty if unknown).
    pub fn versions(&self, dataset_id: Uuid) -> &[DatasetVersion] {
        self.histories
            .get(&dataset_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn latest_version(&self, dataset_id: Uuid) -> Option<&DatasetVersion> {
        self.versions(dataset_id).last()
    }

    pub fn get_version(
        &self,
        dataset_id: Uuid,
        version: &SemVer,
    ) -> Result<&DatasetVersion, TesseraError> {
        self.versions(dataset_id)
            .iter()
            .find(|v| v.version == *version)
            .ok_or_else(|| {
                TesseraError::NotFound(format!("version {} of dataset {}", version, dataset_id))
            })
    }

    /// Diff the snapshots of two recorded versions.
    pub fn compare_versions(
        &self,
        dataset_id: Uuid,
        from: &SemVer,
        to: &SemVer,
    ) -> Result<VersionComparison, TesseraError> {
        let a = self.get_version(dataset_id, from)?;
        let b = self.get_version(dataset_id, to)?;
        compare_snapshots(dataset_id, a.version, &a.snapshot, b.version, &b.snapshot)
    }

    /// Roll `dataset` back to the content of version `target`.
    ///
    /// The rollback is itself recorded as a new version created by
    /// `"system"`, with changes computed from the live state against the
    /// target snapshot. On return the dataset holds independent copies of
    /// the target snapshot's files, metadata, and configuration, and its
    /// version is the newly created one, never the old target number.
    pub fn rollback_to_version(
        &mut self,
        dataset: &mut Dataset,
        target: &SemVer,
    ) -> Result<DatasetVersion, TesseraError> {
        let target_record = self.get_version(dataset.id, target)?;
        let target_snapshot = target_record.snapshot.clone();

        let mut changes = diff_files(&dataset.files, &target_snapshot.files)?.to_changes();
        changes.metadata_changed = dataset.metadata != target_snapshot.metadata;
        changes.config_changed = dataset.description != target_snapshot.config.description
            || dataset.access_conditions != target_snapshot.config.access_conditions
            || dataset.tags != target_snapshot.config.tags;
        changes.summary = format!("Rollback to version {}: {}", target, summarize(&changes));

        let mut restored = dataset.clone();
        target_snapshot.restore_into(&mut restored);

        let record = self.create_version(&restored, changes, SYSTEM_CREATOR)?;
        restored.version = record.version;
        restored.touch();
        *dataset = restored;

        tracing::info!(
            "Dataset {} rolled back to content of {} as {}",
            dataset.id,
            target,
            record.version
        );
        Ok(record)
    }

    /// Drop the whole history of a dataset. Returns the number of records
    /// removed.
    pub fn purge(&mut self, dataset_id: Uuid) -> usize {
        self.histories
            .remove(&dataset_id)
            .map(|h| h.len())
            .unwrap_or(0)
    }
}
