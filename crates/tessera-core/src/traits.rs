// crates/tessera-core/src/traits.rs

use std::path::Path;

use async_trait::async_trait;

use crate::error::TesseraError;
use crate::upload::{UploadOptions, UploadResult};

/// The upload primitive: stores one file in a content-addressed backend.
///
/// Implemented by tessera-store (IPFS, local directory, in-memory).
/// Each call is treated as atomic pass/fail; retrying is the backend's
/// business.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Store the file at `path` and return its content id, size, and metadata.
    async fn upload(&self, path: &Path, options: &UploadOptions)
        -> Result<UploadResult, TesseraError>;

    /// Retrieve the raw bytes stored under a content id.
    async fn fetch(&self, cid: &str) -> Result<Vec<u8>, TesseraError>;

    /// Whether `UploadOptions::encrypt` can be honoured.
    fn supports_encryption(&self) -> bool {
        false
    }
}
