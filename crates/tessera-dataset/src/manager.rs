// crates/tessera-dataset/src/manager.rs
//
// DatasetManager: the live registry of datasets.
//
// Composes the batch upload engine and the version manager. The registry
// and all histories live behind a single RwLock; uploads run with the lock
// released, so every mutation that uploads follows a read / upload / commit
// cycle and commits only if the dataset's revision is unchanged.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use tessera_batch::{BatchOptions, BatchUploadEngine};
use tessera_core::{
    BatchUploadResult, Dataset, DatasetConfig, DatasetProgress, DatasetVersion, OperationKind,
    SemVer, TesseraError, Uploader, VersionChanges,
};
use tessera_versioning::{diff_files, VersionComparison, VersionManager};

use crate::events::DatasetEvent;
use crate::filter::{DatasetFilter, DatasetPage};
use crate::state::RegistryState;

/// Longest accepted dataset name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Most files accepted by a single create / update / add call.
pub const MAX_FILES_PER_OPERATION: usize = 10_000;

/// Buffered events per subscriber before the slowest one starts lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Creator recorded when the caller names none.
pub const DEFAULT_CREATOR: &str = "anonymous";

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Abort without persisting anything if any file fails to upload.
    pub strict: bool,
    /// Recorded on the initial version. Falls back to the metadata author.
    pub created_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MutationOptions {
    /// Record a dedicated version for the mutation.
    pub create_version: bool,
    pub created_by: Option<String>,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            create_version: true,
            created_by: None,
        }
    }
}

/// Shallow metadata patch. Set fields replace the current value; `custom`
/// entries merge key by key, and a JSON `null` removes the key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<std::collections::BTreeSet<String>>,
    #[serde(default)]
    pub custom: BTreeMap<String, serde_json::Value>,
}

/// Everything `update_dataset` can change in one call.
#[derive(Debug, Clone, Default)]
pub struct DatasetUpdate {
    /// New description; an empty string clears it.
    pub description: Option<String>,
    pub metadata: Option<MetadataPatch>,
    pub tags: Option<Vec<String>>,
    pub add_files: Vec<PathBuf>,
    /// Content ids to drop. Unknown ids are ignored.
    pub remove_files: Vec<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateResult {
    pub dataset: Dataset,
    pub upload: BatchUploadResult,
}

#[derive(Debug, Clone)]
pub struct MutationResult {
    pub dataset: Dataset,
    /// The version recorded for the mutation, unless opted out.
    pub version: Option<DatasetVersion>,
    /// Present when the mutation uploaded files.
    pub upload: Option<BatchUploadResult>,
}

#[derive(Debug, Default)]
struct Registry {
    /// Keyed by UUID v7, so iteration is creation order.
    datasets: BTreeMap<Uuid, Dataset>,
    versions: VersionManager,
}

impl Registry {
    fn name_taken(&self, name: &str) -> bool {
        self.datasets.values().any(|d| d.name == name)
    }

    fn get(&self, id: Uuid) -> Result<&Dataset, TesseraError> {
        self.datasets
            .get(&id)
            .ok_or_else(|| TesseraError::NotFound(format!("dataset {}", id)))
    }
}

pub struct DatasetManager {
    engine: BatchUploadEngine,
    batch: BatchOptions,
    registry: RwLock<Registry>,
    events: broadcast::Sender<DatasetEvent>,
}

impl DatasetManager {
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self::with_engine(BatchUploadEngine::new(uploader), BatchOptions::default())
    }

    /// Build a manager around an engine, running every batch with `batch`
    /// (the operation kind is set per call).
    pub fn with_engine(engine: BatchUploadEngine, batch: BatchOptions) -> Self {
        Self::from_registry(engine, batch, Registry::default())
    }

    fn from_registry(engine: BatchUploadEngine, batch: BatchOptions, registry: Registry) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            engine,
            batch,
            registry: RwLock::new(registry),
            events,
        }
    }

    /// Restore a manager from a previously exported registry.
    pub fn with_state(
        engine: BatchUploadEngine,
        batch: BatchOptions,
        state: RegistryState,
    ) -> Result<Self, TesseraError> {
        let mut datasets: BTreeMap<Uuid, Dataset> = BTreeMap::new();
        for dataset in state.datasets {
            if datasets.values().any(|d| d.name == dataset.name) {
                return Err(TesseraError::Validation(format!(
                    "registry state holds two datasets named '{}'",
                    dataset.name
                )));
            }
            if datasets.insert(dataset.id, dataset).is_some() {
                return Err(TesseraError::Validation(
                    "registry state holds a duplicate dataset id".to_string(),
                ));
            }
        }

        let versions = VersionManager::from_records(state.versions)?;
        for dataset in datasets.values() {
            if versions.latest_version(dataset.id).is_none() {
                return Err(TesseraError::Validation(format!(
                    "dataset {} has no version history",
                    dataset.id
                )));
            }
        }

        tracing::info!("Restored registry with {} datasets", datasets.len());
        Ok(Self::from_registry(
            engine,
            batch,
            Registry { datasets, versions },
        ))
    }

    /// Serializable image of every live dataset and its history.
    pub async fn export_state(&self) -> RegistryState {
        let registry = self.registry.read().await;
        let datasets: Vec<Dataset> = registry.datasets.values().cloned().collect();
        let versions = datasets
            .iter()
            .flat_map(|d| registry.versions.versions(d.id).iter().cloned())
            .collect();
        RegistryState { datasets, versions }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DatasetEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: DatasetEvent) {
        tracing::trace!("event {}", event.channel());
        // no subscribers is not an error
        let _ = self.events.send(event);
    }

    fn batch_options(&self, operation: OperationKind) -> BatchOptions {
        BatchOptions {
            operation,
            ..self.batch.clone()
        }
    }

    /// Upload `files` with the options of `dataset`, forwarding progress
    /// as events tagged with its id.
    async fn upload(
        &self,
        dataset: &Dataset,
        files: &[PathBuf],
        operation: OperationKind,
    ) -> Result<BatchUploadResult, TesseraError> {
        let options = self.batch_options(operation);
        let dataset_id = dataset.id;
        let events = &self.events;
        self.engine
            .upload_batch(files, &dataset.upload_options(), &options, |p: &DatasetProgress| {
                let _ = events.send(DatasetEvent::Progress {
                    dataset_id,
                    progress: p.clone(),
                });
            })
            .await
    }

    // --- create ---

    /// Upload `files` and register a new dataset at version `1.0.0`.
    pub async fn create_dataset(
        &self,
        config: DatasetConfig,
        files: &[PathBuf],
        options: &CreateOptions,
    ) -> Result<CreateResult, TesseraError> {
        validate_name(&config.name)?;
        validate_file_count(files.len(), false)?;

        if self.registry.read().await.name_taken(&config.name) {
            return Err(conflict(&config.name));
        }

        let created_by = options
            .created_by
            .clone()
            .or_else(|| config.metadata.author.clone())
            .unwrap_or_else(|| DEFAULT_CREATOR.to_string());

        let mut dataset = Dataset::new(config, Vec::new());
        let name = dataset.name.clone();
        tracing::info!("Creating dataset '{}' from {} files", name, files.len());
        self.emit(DatasetEvent::CreateStarted {
            dataset_id: dataset.id,
            name: name.clone(),
            file_count: files.len(),
        });

        let upload = match self.upload(&dataset, files, OperationKind::Create).await {
            Ok(upload) => upload,
            Err(e) => return Err(self.create_failed(&name, e)),
        };

        if options.strict && upload.has_failures() {
            let err = TesseraError::StrictModeAbort {
                failed: upload.failed,
                total: upload.total,
            };
            return Err(self.create_failed(&name, err));
        }
        if upload.has_failures() {
            tracing::warn!(
                "Dataset '{}': {} of {} files failed to upload",
                name,
                upload.failed,
                upload.total
            );
        }

        for file in &upload.successful_uploads {
            dataset.upsert_file(file.clone());
        }

        let mut registry = self.registry.write().await;
        if registry.name_taken(&name) {
            drop(registry);
            return Err(self.create_failed(&name, conflict(&name)));
        }

        let record = match registry.versions.create_version(
            &dataset,
            VersionChanges::initial(&dataset),
            &created_by,
        ) {
            Ok(record) => record,
            Err(e) => {
                drop(registry);
                return Err(self.create_failed(&name, e));
            }
        };
        dataset.version = record.version;
        registry.datasets.insert(dataset.id, dataset.clone());
        drop(registry);

        tracing::info!(
            "Created dataset '{}' ({}) with {} files",
            name,
            dataset.id,
            dataset.files.len()
        );
        self.emit(version_event(&record));
        self.emit(DatasetEvent::CreateCompleted {
            dataset_id: dataset.id,
            name,
            version: dataset.version,
            file_count: dataset.files.len(),
            failed: upload.failed,
        });

        Ok(CreateResult { dataset, upload })
    }

    fn create_failed(&self, name: &str, err: TesseraError) -> TesseraError {
        tracing::warn!("Creating dataset '{}' failed: {}", name, err);
        self.emit(DatasetEvent::CreateFailed {
            name: name.to_string(),
            error: err.to_string(),
        });
        err
    }

    // --- read ---

    /// The live dataset, or its content as of `version`.
    pub async fn get_dataset(
        &self,
        id: Uuid,
        version: Option<&SemVer>,
    ) -> Result<Dataset, TesseraError> {
        let registry = self.registry.read().await;
        let live = registry.get(id)?;
        let Some(version) = version else {
            return Ok(live.clone());
        };

        let record = registry.versions.get_version(id, version)?;
        let mut dataset = live.clone();
        record.snapshot.restore_into(&mut dataset);
        dataset.name = record.snapshot.config.name.clone();
        dataset.version = record.version;
        dataset.updated_at = record.created_at;
        Ok(dataset)
    }

    pub async fn find_by_name(&self, name: &str) -> Option<Dataset> {
        self.registry
            .read()
            .await
            .datasets
            .values()
            .find(|d| d.name == name)
            .cloned()
    }

    /// Datasets matching `filter`, in creation order, paginated.
    pub async fn list_datasets(&self, filter: &DatasetFilter) -> DatasetPage {
        let registry = self.registry.read().await;
        filter.apply(registry.datasets.values())
    }

    pub async fn list_versions(&self, id: Uuid) -> Result<Vec<DatasetVersion>, TesseraError> {
        let registry = self.registry.read().await;
        registry.get(id)?;
        Ok(registry.versions.versions(id).to_vec())
    }

    pub async fn compare_versions(
        &self,
        id: Uuid,
        from: &SemVer,
        to: &SemVer,
    ) -> Result<VersionComparison, TesseraError> {
        let registry = self.registry.read().await;
        registry.get(id)?;
        registry.versions.compare_versions(id, from, to)
    }

    // --- mutate ---

    /// Apply every part of `update` and record exactly one version for it.
    pub async fn update_dataset(
        &self,
        id: Uuid,
        update: DatasetUpdate,
    ) -> Result<MutationResult, TesseraError> {
        let before = self.registry.read().await.get(id)?.clone();
        validate_file_count(update.add_files.len(), true)?;

        let mut working = before.clone();
        if let Some(tags) = update.tags {
            working.tags = tags;
        }

        let upload = if update.add_files.is_empty() {
            None
        } else {
            Some(
                self.upload(&working, &update.add_files, OperationKind::Update)
                    .await?,
            )
        };

        if let Some(description) = update.description {
            working.description = (!description.is_empty()).then_some(description);
        }
        if let Some(patch) = &update.metadata {
            apply_metadata_patch(&mut working, patch);
        }
        for cid in &update.remove_files {
            if working.remove_file(cid).is_none() {
                tracing::debug!("Dataset {}: no live file {} to remove", id, cid);
            }
        }
        if let Some(upload) = &upload {
            for file in &upload.successful_uploads {
                working.upsert_file(file.clone());
            }
        }

        let mut changes = diff_files(&before.files, &working.files)?.to_changes();
        changes.metadata_changed = before.metadata != working.metadata;
        changes.config_changed =
            before.description != working.description || before.tags != working.tags;

        let created_by = creator(update.created_by.as_deref(), &before);
        let (dataset, version) = self
            .commit(working, before.revision, Some(changes), &created_by)
            .await?;
        Ok(MutationResult {
            dataset,
            version,
            upload,
        })
    }

    /// Upload `files` and append them to the dataset.
    pub async fn add_files(
        &self,
        id: Uuid,
        files: &[PathBuf],
        options: &MutationOptions,
    ) -> Result<MutationResult, TesseraError> {
        let before = self.registry.read().await.get(id)?.clone();
        validate_file_count(files.len(), false)?;

        let upload = self
            .upload(&before, files, OperationKind::AddFiles)
            .await?;

        let mut working = before.clone();
        for file in &upload.successful_uploads {
            working.upsert_file(file.clone());
        }

        let changes = if options.create_version {
            Some(diff_files(&before.files, &working.files)?.to_changes())
        } else {
            None
        };

        let created_by = creator(options.created_by.as_deref(), &before);
        let (dataset, version) = self
            .commit(working, before.revision, changes, &created_by)
            .await?;
        tracing::info!(
            "Added {} files to dataset {} ({} failed)",
            upload.successful,
            id,
            upload.failed
        );
        Ok(MutationResult {
            dataset,
            version,
            upload: Some(upload),
        })
    }

    /// Drop files by content id. Unknown ids are ignored.
    pub async fn remove_files(
        &self,
        id: Uuid,
        cids: &[String],
        options: &MutationOptions,
    ) -> Result<MutationResult, TesseraError> {
        let before = self.registry.read().await.get(id)?.clone();

        let mut working = before.clone();
        let mut removed = Vec::new();
        for cid in cids {
            if let Some(file) = working.remove_file(cid) {
                removed.push(file.cid);
            }
        }

        let changes = options.create_version.then(|| VersionChanges {
            removed,
            ..VersionChanges::default()
        });

        let created_by = creator(options.created_by.as_deref(), &before);
        let (dataset, version) = self
            .commit(working, before.revision, changes, &created_by)
            .await?;
        Ok(MutationResult {
            dataset,
            version,
            upload: None,
        })
    }

    /// Write `working` back if nobody committed since `expected_revision`,
    /// recording a version when `changes` is given.
    async fn commit(
        &self,
        mut working: Dataset,
        expected_revision: u64,
        changes: Option<VersionChanges>,
        created_by: &str,
    ) -> Result<(Dataset, Option<DatasetVersion>), TesseraError> {
        let mut registry = self.registry.write().await;
        let current = registry.get(working.id)?;
        if current.revision != expected_revision {
            tracing::warn!(
                "Dataset {} changed during the operation (revision {} != {})",
                working.id,
                current.revision,
                expected_revision
            );
            return Err(TesseraError::ConcurrentModification(working.id.to_string()));
        }

        working.revision = expected_revision + 1;
        working.touch();
        let record = changes
            .map(|c| registry.versions.create_version(&working, c, created_by))
            .transpose()?;
        if let Some(record) = &record {
            working.version = record.version;
        }
        registry.datasets.insert(working.id, working.clone());
        drop(registry);

        if let Some(record) = &record {
            self.emit(version_event(record));
        }
        Ok((working, record))
    }

    /// Restore the content of `version` as a new version.
    pub async fn rollback_to_version(
        &self,
        id: Uuid,
        version: &SemVer,
    ) -> Result<DatasetVersion, TesseraError> {
        let mut guard = self.registry.write().await;
        let Registry { datasets, versions } = &mut *guard;
        let dataset = datasets
            .get_mut(&id)
            .ok_or_else(|| TesseraError::NotFound(format!("dataset {}", id)))?;

        let record = versions.rollback_to_version(dataset, version)?;
        dataset.revision += 1;
        drop(guard);

        self.emit(version_event(&record));
        Ok(record)
    }

    /// Remove a dataset and its whole history. Returns false when absent.
    pub async fn delete_dataset(&self, id: Uuid) -> bool {
        let mut registry = self.registry.write().await;
        let Some(dataset) = registry.datasets.remove(&id) else {
            return false;
        };
        let purged = registry.versions.purge(id);
        drop(registry);

        tracing::info!(
            "Deleted dataset '{}' ({}) and {} versions",
            dataset.name,
            id,
            purged
        );
        self.emit(DatasetEvent::Deleted {
            dataset_id: id,
            name: dataset.name,
        });
        true
    }
}

fn validate_name(name: &str) -> Result<(), TesseraError> {
    if name.trim().is_empty() {
        return Err(TesseraError::Validation(
            "dataset name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(TesseraError::Validation(format!(
            "dataset name exceeds {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_file_count(count: usize, allow_empty: bool) -> Result<(), TesseraError> {
    if count == 0 && !allow_empty {
        return Err(TesseraError::Validation(
            "at least one file is required".to_string(),
        ));
    }
    if count > MAX_FILES_PER_OPERATION {
        return Err(TesseraError::Validation(format!(
            "{} files exceeds the limit of {} per operation",
            count, MAX_FILES_PER_OPERATION
        )));
    }
    Ok(())
}

fn conflict(name: &str) -> TesseraError {
    TesseraError::Conflict(format!("dataset '{}' already exists", name))
}

fn creator(requested: Option<&str>, dataset: &Dataset) -> String {
    requested
        .or(dataset.metadata.author.as_deref())
        .unwrap_or(DEFAULT_CREATOR)
        .to_string()
}

fn version_event(record: &DatasetVersion) -> DatasetEvent {
    DatasetEvent::VersionCreated {
        dataset_id: record.dataset_id,
        version: record.version,
        created_by: record.created_by.clone(),
        summary: record.summary.clone(),
    }
}

fn apply_metadata_patch(dataset: &mut Dataset, patch: &MetadataPatch) {
    let metadata = &mut dataset.metadata;
    if let Some(author) = &patch.author {
        metadata.author = Some(author.clone());
    }
    if let Some(license) = &patch.license {
        metadata.license = Some(license.clone());
    }
    if let Some(category) = &patch.category {
        metadata.category = Some(category.clone());
    }
    if let Some(keywords) = &patch.keywords {
        metadata.keywords = keywords.clone();
    }
    for (key, value) in &patch.custom {
        if value.is_null() {
            metadata.custom.remove(key);
        } else {
            metadata.custom.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_limits() {
        assert!(validate_name("ok").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(matches!(
            validate_name(&"x".repeat(MAX_NAME_LEN + 1)),
            Err(TesseraError::Validation(_))
        ));
    }

    #[test]
    fn file_count_limits() {
        assert!(validate_file_count(0, true).is_ok());
        assert!(validate_file_count(0, false).is_err());
        assert!(validate_file_count(MAX_FILES_PER_OPERATION, false).is_ok());
        assert!(validate_file_count(MAX_FILES_PER_OPERATION + 1, true).is_err());
    }

    #[test]
    fn metadata_patch_merges_custom_and_null_removes() {
        let mut config = DatasetConfig::new("m");
        config.metadata.author = Some("ada".to_string());
        config
            .metadata
            .custom
            .insert("rows".to_string(), serde_json::json!(10));
        config
            .metadata
            .custom
            .insert("stale".to_string(), serde_json::json!(true));
        let mut dataset = Dataset::new(config, Vec::new());

        let mut patch = MetadataPatch {
            license: Some("MIT".to_string()),
            ..MetadataPatch::default()
        };
        patch
            .custom
            .insert("rows".to_string(), serde_json::json!(12));
        patch
            .custom
            .insert("stale".to_string(), serde_json::Value::Null);
        apply_metadata_patch(&mut dataset, &patch);

        assert_eq!(dataset.metadata.author.as_deref(), Some("ada"));
        assert_eq!(dataset.metadata.license.as_deref(), Some("MIT"));
        assert_eq!(dataset.metadata.custom["rows"], serde_json::json!(12));
        assert!(!dataset.metadata.custom.contains_key("stale"));
    }

    #[test]
    fn creator_prefers_request_then_author() {
        let mut config = DatasetConfig::new("c");
        let anonymous = Dataset::new(config.clone(), Vec::new());
        config.metadata.author = Some("ada".to_string());
        let authored = Dataset::new(config, Vec::new());

        assert_eq!(creator(Some("bob"), &authored), "bob");
        assert_eq!(creator(None, &authored), "ada");
        assert_eq!(creator(None, &anonymous), DEFAULT_CREATOR);
    }
}
