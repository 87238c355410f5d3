// crates/tessera-store/src/memory.rs
//
// In-process content-addressed store. Nothing survives the process; used
// by tests and by dry runs of the CLI.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tessera_core::{TesseraError, UploadOptions, UploadResult, Uploader};

use crate::content;

#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs held.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl Uploader for MemoryStore {
    async fn upload(
        &self,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<UploadResult, TesseraError> {
        content::ensure_plaintext("memory", options)?;
        let data = content::read_file(path).await?;
        let cid = content::digest_cid(&data);
        let record = content::upload_record(path, options, cid.clone(), &data);
        self.blobs.write().await.entry(cid).or_insert(data);
        Ok(record)
    }

    async fn fetch(&self, cid: &str) -> Result<Vec<u8>, TesseraError> {
        self.blobs
            .read()
            .await
            .get(cid)
            .cloned()
            .ok_or_else(|| TesseraError::NotFound(format!("content {}", cid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_returns_bytes() {
        let path = std::env::temp_dir().join(format!("tessera_mem_{}.txt", uuid::Uuid::now_v7()));
        std::fs::write(&path, b"in memory").unwrap();

        let store = MemoryStore::new();
        let record = store.upload(&path, &UploadOptions::default()).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.fetch(&record.cid).await.unwrap(), b"in memory");
        assert!(matches!(
            store.fetch("sha256:nope").await,
            Err(TesseraError::NotFound(_))
        ));

        let _ = std::fs::remove_file(path);
    }
}
