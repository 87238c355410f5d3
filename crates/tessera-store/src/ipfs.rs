// crates/tessera-store/src/ipfs.rs
//
// Upload primitive backed by a Kubo node.
//
// Files are added through the node's HTTP API as CIDv1 and optionally
// pinned in the same call; fetch streams them back through `cat`.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tessera_core::{TesseraError, UploadOptions, UploadResult, Uploader};

use crate::content;

/// Response body of `POST /api/v0/add`.
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// HTTP client for the Kubo RPC API.
#[derive(Debug, Clone)]
pub struct IpfsClient {
    /// API root without a trailing slash, e.g. `http://127.0.0.1:5001`.
    pub base_url: String,
    /// Pin content on the node as part of the add call.
    pub pin: bool,
    client: reqwest::Client,
}

impl IpfsClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            pin: true,
            client: reqwest::Client::new(),
        }
    }

    /// Control whether added content is pinned.
    pub fn with_pin(mut self, pin: bool) -> Self {
        self.pin = pin;
        self
    }

    /// `POST /api/v0/cat?arg={cid}`: the full content behind a CID.
    pub async fn get_by_cid(&self, cid: &str) -> Result<Vec<u8>, TesseraError> {
        let url = format!("{}/api/v0/cat?arg={}", self.base_url, cid);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| TesseraError::Storage(format!("IPFS get request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TesseraError::Storage(format!(
                "IPFS cat returned {}: {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TesseraError::Storage(format!("IPFS get body read failed: {}", e)))?;

        Ok(bytes.to_vec())
    }

    /// `POST /api/v0/add` as multipart form data. Returns the CIDv1 the
    /// node assigned.
    pub async fn put(&self, data: &[u8], file_name: &str) -> Result<String, TesseraError> {
        let url = format!(
            "{}/api/v0/add?pin={}&cid-version=1",
            self.base_url, self.pin
        );

        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TesseraError::Storage(format!("IPFS put request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TesseraError::Storage(format!(
                "IPFS add returned {}: {}",
                status, body
            )));
        }

        let body: AddResponse = response.json().await.map_err(|e| {
            TesseraError::Serialization(format!("IPFS add response parse failed: {}", e))
        })?;

        Ok(body.hash)
    }
}

#[async_trait]
impl Uploader for IpfsClient {
    async fn upload(
        &self,
        path: &Path,
        options: &UploadOptions,
    ) -> Result<UploadResult, TesseraError> {
        content::ensure_plaintext("ipfs", options)?;
        let data = content::read_file(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "data".to_string());

        let cid = self.put(&data, &file_name).await?;
        tracing::debug!("IPFS add {} -> {} ({} bytes)", path.display(), cid, data.len());

        Ok(content::upload_record(path, options, cid, &data))
    }

    async fn fetch(&self, cid: &str) -> Result<Vec<u8>, TesseraError> {
        self.get_by_cid(cid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Helper to start a mock IPFS HTTP server that answers one request
    /// with the given status and body.
    async fn mock_ipfs_server(status: u16, body: &str) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);
        let response = format!(
            "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        (base_url, handle)
    }

    fn temp_file(contents: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("tessera_ipfs_{}.bin", uuid::Uuid::now_v7()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn put_returns_cid() {
        let (base_url, _handle) =
            mock_ipfs_server(200, r#"{"Name":"data","Hash":"bafyTest123","Size":"11"}"#).await;
        let client = IpfsClient::new(&base_url);
        let result = client.put(b"hello world", "data").await;
        assert_eq!(result.unwrap(), "bafyTest123");
    }

    #[tokio::test]
    async fn get_by_cid_returns_data() {
        let (base_url, _handle) = mock_ipfs_server(200, "hello world").await;
        let client = IpfsClient::new(&base_url);
        let result = client.get_by_cid("bafyTest123").await;
        assert_eq!(result.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn upload_builds_record_from_file() {
        let (base_url, _handle) =
            mock_ipfs_server(200, r#"{"Name":"x","Hash":"bafyFile","Size":"5"}"#).await;
        let path = temp_file(b"hello");
        let client = IpfsClient::new(&base_url);
        let opts = UploadOptions {
            tags: vec!["raw".to_string()],
            ..UploadOptions::default()
        };

        let record = client.upload(&path, &opts).await.unwrap();
        assert_eq!(record.cid, "bafyFile");
        assert_eq!(record.size, 5);
        assert_eq!(record.tags, vec!["raw".to_string()]);
        assert_eq!(
            record.content_hash.as_deref(),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn error_status_maps_to_storage_error() {
        let (base_url, _handle) = mock_ipfs_server(500, r#"{"Message":"boom","Code":0}"#).await;
        let client = IpfsClient::new(&base_url);
        match client.put(b"x", "x").await {
            Err(TesseraError::Storage(msg)) => assert!(msg.contains("IPFS add returned 500")),
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn connection_error_returns_storage_error() {
        let client = IpfsClient::new("http://127.0.0.1:1"); // Nothing listening
        match client.put(b"test", "test").await {
            Err(TesseraError::Storage(msg)) => assert!(msg.contains("request failed")),
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_file_fails_before_any_request() {
        let client = IpfsClient::new("http://127.0.0.1:1");
        let result = client
            .upload(Path::new("/definitely/not/here.bin"), &UploadOptions::default())
            .await;
        assert!(matches!(result, Err(TesseraError::Upload(_))));
    }
}
