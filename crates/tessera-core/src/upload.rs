// crates/tessera-core/src/upload.rs
//
// Upload-level data shapes: the options shared by one batch, the record of
// a stored file, the record of a file that could not be stored, and the
// aggregate outcome of a batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Options applied to every file of one upload call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Request encryption of the stored bytes. Backends that cannot encrypt
    /// reject the file instead of storing plaintext.
    #[serde(default)]
    pub encrypt: bool,
    /// Opaque access-control conditions, recorded but not evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_conditions: Option<Vec<serde_json::Value>>,
    /// Free-form tags stamped onto every resulting `UploadResult`.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One file stored by the upload primitive. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Content identifier returned by the backend.
    pub cid: String,
    /// Stored size in bytes.
    pub size: u64,
    pub encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_conditions: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
    /// Path the bytes were read from.
    pub original_path: String,
    /// SHA-256 of the plaintext, hex encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// A file the batch engine could not store. Terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedUpload {
    pub path: String,
    pub error: String,
    pub retry_count: u32,
    pub failed_at: DateTime<Utc>,
}

/// Outcome of one batch call.
///
/// `successful + failed == total` always holds, and both lists are in
/// completion order rather than input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchUploadResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub successful_uploads: Vec<UploadResult>,
    pub failed_uploads: Vec<FailedUpload>,
    /// Wall-clock duration of the whole batch in milliseconds.
    pub duration_ms: u64,
    /// Bytes per second over the successful uploads.
    pub average_speed: f64,
}

impl BatchUploadResult {
    /// Total bytes stored by the successful uploads.
    pub fn total_bytes(&self) -> u64 {
        self.successful_uploads.iter().map(|u| u.size).sum()
    }

    /// True when at least one file failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
