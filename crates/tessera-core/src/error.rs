use thiserror::Error;

/// Error type shared by every Tessera crate.
///
/// Partial upload failure is not an error: a file that could not be
/// stored is reported as a `FailedUpload` entry inside a successful result.
#[derive(Debug, Error)]
pub enum TesseraError {
    /// A live dataset already uses the requested name.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown dataset id or version.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-side precondition violated (empty file list, bad name, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Strict mode was requested and at least one file failed to upload.
    #[error("Strict mode abort: {failed} of {total} files failed to upload")]
    StrictModeAbort { failed: usize, total: usize },

    /// Another operation committed to the same dataset in the meantime.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// The upload primitive rejected or failed a single file.
    #[error("Upload error: {0}")]
    Upload(String),

    /// Backend storage error (IPFS API, local store directory).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Config error: {0}")]
    Config(String),

    /// The backend does not support the requested option.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for TesseraError {
    fn from(e: serde_json::Error) -> Self {
        TesseraError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for TesseraError {
    fn from(e: std::io::Error) -> Self {
        TesseraError::Storage(e.to_string())
    }
}
