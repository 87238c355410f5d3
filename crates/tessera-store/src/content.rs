// crates/tessera-store/src/content.rs
//
// Helpers shared by the store backends: file reading, SHA-256 digests,
// digest-based content ids, and `UploadResult` assembly.

use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tessera_core::{TesseraError, UploadOptions, UploadResult};

/// Prefix of content ids derived from a SHA-256 digest.
pub const SHA256_CID_PREFIX: &str = "sha256:";

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Content id used by the digest-keyed backends: `sha256:{hex}`.
pub fn digest_cid(data: &[u8]) -> String {
    format!("{}{}", SHA256_CID_PREFIX, sha256_hex(data))
}

/// Extract and validate the hex digest from a `sha256:{hex}` content id.
pub fn digest_from_cid(cid: &str) -> Result<&str, TesseraError> {
    let digest = cid
        .strip_prefix(SHA256_CID_PREFIX)
        .ok_or_else(|| TesseraError::Validation(format!("not a sha256 content id: {}", cid)))?;
    if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(TesseraError::Validation(format!(
            "malformed sha256 content id: {}",
            cid
        )));
    }
    Ok(digest)
}

/// Read a file for upload, mapping I/O failures to `TesseraError::Upload`
/// so the batch engine reports them against the file.
pub async fn read_file(path: &Path) -> Result<Vec<u8>, TesseraError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| TesseraError::Upload(format!("failed to read {}: {}", path.display(), e)))
}

/// Reject options a plaintext backend cannot honour.
pub fn ensure_plaintext(backend: &str, options: &UploadOptions) -> Result<(), TesseraError> {
    if options.encrypt {
        return Err(TesseraError::Unsupported(format!(
            "{} backend cannot encrypt uploads",
            backend
        )));
    }
    Ok(())
}

/// Assemble the record for a stored file.
pub fn upload_record(
    path: &Path,
    options: &UploadOptions,
    cid: String,
    data: &[u8],
) -> UploadResult {
    UploadResult {
        cid,
        size: data.len() as u64,
        encrypted: options.encrypt,
        access_conditions: options.access_conditions.clone(),
        tags: options.tags.clone(),
        uploaded_at: Utc::now(),
        original_path: path.display().to_string(),
        content_hash: Some(sha256_hex(data)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_cid_round_trips_through_parser() {
        let cid = digest_cid(b"hello world");
        assert_eq!(
            cid,
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(digest_from_cid(&cid).unwrap(), sha256_hex(b"hello world"));
    }

    #[test]
    fn rejects_foreign_or_malformed_cids() {
        assert!(digest_from_cid("QmTest123").is_err());
        assert!(digest_from_cid("sha256:abc").is_err());
        assert!(digest_from_cid(&format!("sha256:{}", "z".repeat(64))).is_err());
    }

    #[test]
    fn encryption_is_rejected() {
        let opts = UploadOptions {
            encrypt: true,
            ..UploadOptions::default()
        };
        match ensure_plaintext("local", &opts) {
            Err(TesseraError::Unsupported(msg)) => assert!(msg.contains("local")),
            other => panic!("Expected Unsupported error, got: {:?}", other),
        }
    }
}
