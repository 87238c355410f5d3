// crates/tessera-store/src/local.rs
//
// LocalStore: content-addressed storage in a local directory.
//
// Blobs are keyed by their SHA-256 digest and laid out as
//   {root}/{digest[0..2]}/{digest}
// so that no single directory grows unbounded. Writes go to a temporary
// file first and are renamed into place, so a reader never observes a
// partially written blob.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tessera_core::{TesseraError, UploadOptions, UploadResult, Uploader};
use uuid::Uuid;

use crate::content;

/// Directory-backed content-addressed store.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, TesseraError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            TesseraError::Storage(format!("Failed to create store at {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, digest: &str) -> PathBuf {
        self.root.join(&digest[..2]).join(digest)
    }

    /// Store raw bytes and return their content id. Storing the same bytes
    /// twice is a no-op that returns the same id.
    pub async fn put(&self, data: &[u8]) -> Result<String, TesseraError> {
        let cid = content::digest_cid(data);
        let digest = content::digest_from_cid(&cid)?;
        let target = self.blob_path(digest);

        if tokio::fs::try_exists(&target).await? {
            return Ok(cid);
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Concurrent writers of the same content each get their own temp file.
        let tmp = target.with_extension(format!("tmp-{}", Uuid::now_v7()));
        if let Err(e) = tokio::fs::write(&tmp, data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                return Ok(cid);
            }
            return Err(e.into());
        }

        Ok(cid)
    }

    /// Read the bytes stored under a content id.
    pub async fn get(&self, cid: &str) -> Result<Vec<u8>, TesseraError> {
        let digest = content::digest_from_cid(cid)?;
        match tokio::fs::read(self.blob_path(digest)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TesseraError::NotFound(format!("content {}", cid)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Uploader for LocalStore {
    async fn upload(
        &self,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<UploadResult, TesseraError> {
        content::ensure_plaintext("local", options)?;
        let data = content::read_file(path).await?;
        let cid = self
            .put(&data)
            .await
            .map_err(|e| TesseraError::Upload(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Stored {} as {}", path.display(), cid);
        Ok(content::upload_record(path, options, cid, &data))
    }

    async fn fetch(&self, cid: &str) -> Result<Vec<u8>, TesseraError> {
        self.get(cid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tessera_test_{}_{}", label, Uuid::now_v7()))
    }

    #[tokio::test]
    async fn upload_then_fetch() {
        let dir = temp_dir("local");
        let store = LocalStore::open(dir.join("blobs")).await.unwrap();
        let src = dir.join("input.txt");
        std::fs::write(&src, b"tessera").unwrap();

        let record = store.upload(&src, &UploadOptions::default()).await.unwrap();
        assert!(record.cid.starts_with("sha256:"));
        assert_eq!(record.size, 7);
        assert_eq!(store.fetch(&record.cid).await.unwrap(), b"tessera");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn identical_content_shares_a_cid() {
        let dir = temp_dir("dedup");
        let store = LocalStore::open(&dir).await.unwrap();
        let a = store.put(b"same").await.unwrap();
        let b = store.put(b"same").await.unwrap();
        assert_eq!(a, b);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn concurrent_uploads_of_identical_content_all_succeed() {
        let dir = temp_dir("concurrent");
        let store = std::sync::Arc::new(LocalStore::open(dir.join("blobs")).await.unwrap());
        let payload = vec![7u8; 256 * 1024];

        for round in 0..10 {
            let mut paths = Vec::new();
            for i in 0..16 {
                let path = dir.join(format!("r{}_f{}.bin", round, i));
                let mut bytes = payload.clone();
                bytes.push(round as u8);
                std::fs::write(&path, &bytes).unwrap();
                paths.push(path);
            }

            let mut handles = Vec::new();
            for path in paths {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    store.upload(&path, &UploadOptions::default()).await
                }));
            }

            let mut cids = std::collections::BTreeSet::new();
            for handle in handles {
                let record = handle.await.unwrap().expect("identical upload failed");
                cids.insert(record.cid);
            }
            assert_eq!(cids.len(), 1, "round {} produced several ids", round);
        }

        // No temp files are left behind next to the blobs.
        for shard in std::fs::read_dir(dir.join("blobs")).unwrap() {
            for entry in std::fs::read_dir(shard.unwrap().path()).unwrap() {
                let name = entry.unwrap().file_name().to_string_lossy().into_owned();
                assert!(!name.contains(".tmp-"), "leftover temp file {}", name);
            }
        }

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn unknown_cid_is_not_found() {
        let dir = temp_dir("missing");
        let store = LocalStore::open(&dir).await.unwrap();
        let cid = content::digest_cid(b"never stored");
        assert!(matches!(store.get(&cid).await, Err(TesseraError::NotFound(_))));
        let _ = std::fs::remove_dir_all(dir);
    }
}
