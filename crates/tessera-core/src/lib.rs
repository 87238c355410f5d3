// crates/tessera-core/src/lib.rs
//
// tessera-core: Core types, errors, and traits for Tessera datasets.
//
// This is the leaf crate every other crate in the workspace depends on.
// It defines the upload records, the dataset and version data model,
// the semantic version type, the progress record, and the `Uploader`
// trait that marks the boundary to the storage backend.

pub mod dataset;
pub mod error;
pub mod progress;
pub mod semver;
pub mod traits;
pub mod upload;
pub mod version;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use tessera_core::Dataset;`

pub use dataset::{Dataset, DatasetConfig, DatasetMetadata};
pub use error::TesseraError;
pub use progress::{DatasetProgress, OperationKind};
pub use semver::{BumpKind, SemVer};
pub use traits::Uploader;
pub use upload::{BatchUploadResult, FailedUpload, UploadOptions, UploadResult};
pub use version::{DatasetSnapshot, DatasetVersion, SnapshotConfig, VersionChanges};
