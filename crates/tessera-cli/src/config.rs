// crates/tessera-cli/src/config.rs
//
// Runtime configuration for the tessera CLI.
// Loaded from a TOML file or populated with sensible defaults.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use tessera_batch::BatchOptions;

/// Storage backend files are uploaded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A Kubo (go-ipfs) node reached over its HTTP API.
    Ipfs,
    /// A content-addressed directory on local disk.
    Local,
}

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct TesseraConfig {
    #[serde(default = "default_backend")]
    pub backend: Backend,

    /// URL of the IPFS API endpoint.
    #[serde(default = "default_ipfs_api_url")]
    pub ipfs_api_url: String,

    /// Root of the local blob store.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// JSON file holding the dataset registry between invocations.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Uploads in flight at once (clamped to 1..=20).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-file upload timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Window size for large batches.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// File count at which a batch is processed in windows.
    #[serde(default = "default_large_batch_threshold")]
    pub large_batch_threshold: usize,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pin uploaded content on the IPFS node.
    #[serde(default = "default_pin")]
    pub pin: bool,
}

fn default_backend() -> Backend {
    Backend::Local
}

fn default_ipfs_api_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_store_dir() -> String {
    "~/.tessera/blobs".to_string()
}

fn default_state_file() -> String {
    "~/.tessera/registry.json".to_string()
}

fn default_concurrency() -> usize {
    tessera_batch::options::DEFAULT_CONCURRENCY
}

fn default_timeout_secs() -> u64 {
    tessera_batch::options::DEFAULT_TIMEOUT.as_secs()
}

fn default_chunk_size() -> usize {
    tessera_batch::options::DEFAULT_CHUNK_SIZE
}

fn default_large_batch_threshold() -> usize {
    tessera_batch::options::LARGE_BATCH_THRESHOLD
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pin() -> bool {
    true
}

impl Default for TesseraConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            ipfs_api_url: default_ipfs_api_url(),
            store_dir: default_store_dir(),
            state_file: default_state_file(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            chunk_size: default_chunk_size(),
            large_batch_threshold: default_large_batch_threshold(),
            log_level: default_log_level(),
            pin: default_pin(),
        }
    }
}

impl TesseraConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        let config: TesseraConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Batch engine settings derived from this configuration.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency: self.concurrency,
            timeout: Duration::from_secs(self.timeout_secs),
            chunk_size: self.chunk_size,
            large_batch_threshold: self.large_batch_threshold,
            ..BatchOptions::default()
        }
    }

    pub fn store_path(&self) -> PathBuf {
        expand_tilde(&self.store_dir)
    }

    pub fn state_path(&self) -> PathBuf {
        expand_tilde(&self.state_file)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config: TesseraConfig = toml::from_str(
            r#"
            backend = "ipfs"
            concurrency = 12
            pin = false
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, Backend::Ipfs);
        assert_eq!(config.concurrency, 12);
        assert!(!config.pin);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.chunk_size, 50);
        assert_eq!(config.ipfs_api_url, "http://127.0.0.1:5001");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(toml::from_str::<TesseraConfig>(r#"backend = "s3""#).is_err());
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let path = std::env::temp_dir().join(format!("tessera_cfg_{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&path, "timeout_secs = 5\nlarge_batch_threshold = 200\n").unwrap();

        let config = TesseraConfig::load(path.to_str().unwrap()).unwrap();
        let batch = config.batch_options();
        assert_eq!(batch.timeout, Duration::from_secs(5));
        assert_eq!(batch.large_batch_threshold, 200);
        assert_eq!(batch.concurrency, 5);

        let _ = std::fs::remove_file(&path);
        assert!(TesseraConfig::load(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x/y"), home.join("x/y"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde("rel"), PathBuf::from("rel"));
    }
}
