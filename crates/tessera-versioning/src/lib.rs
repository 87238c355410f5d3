// crates/tessera-versioning/src/lib.rs
//
// tessera-versioning: Version history for Tessera datasets.
//
// Decides semantic version bumps from structural change descriptors,
// freezes snapshots into an append-only history per dataset, answers
// "what changed between two versions", and synthesizes rollbacks as new
// forward versions. Has no knowledge of uploads.

pub mod bump;
pub mod diff;
pub mod manager;

pub use bump::{determine_bump, summarize};
pub use diff::{diff_files, FieldChange, FileChange, FileDiff, VersionComparison};
pub use manager::{VersionManager, SYSTEM_CREATOR};
