// crates/tessera-batch/src/options.rs
//
// Run options for one batch invocation.

use std::time::Duration;

use tessera_core::OperationKind;

/// Default number of uploads in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;
/// Hard ceiling on uploads in flight, whatever the caller asks for.
pub const MAX_CONCURRENCY: usize = 20;
/// Default per-file timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default window size for large batches.
pub const DEFAULT_CHUNK_SIZE: usize = 50;
/// Batches of at least this many files run in sequential windows.
pub const LARGE_BATCH_THRESHOLD: usize = 1_000;
/// Default size of retained result buffers above which a warning is logged.
pub const DEFAULT_MEMORY_WARN_BYTES: u64 = 256 * 1024 * 1024;

/// How a batch is run. Independent of the per-file `UploadOptions`.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Requested concurrency; clamped to `1..=MAX_CONCURRENCY`.
    pub concurrency: usize,
    /// Per-file timeout. A file exceeding it is recorded as failed.
    pub timeout: Duration,
    /// Window size used once the batch reaches `large_batch_threshold`.
    pub chunk_size: usize,
    pub large_batch_threshold: usize,
    /// Advisory threshold for the periodic memory observation.
    pub memory_warn_bytes: u64,
    /// Operation reported in progress records.
    pub operation: OperationKind,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            large_batch_threshold: LARGE_BATCH_THRESHOLD,
            memory_warn_bytes: DEFAULT_MEMORY_WARN_BYTES,
            operation: OperationKind::Upload,
        }
    }
}

impl BatchOptions {
    pub fn for_operation(operation: OperationKind) -> Self {
        Self {
            operation,
            ..Self::default()
        }
    }

    /// Concurrency actually used by the engine.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, MAX_CONCURRENCY)
    }

    /// Window size actually used by the engine.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }

    pub fn is_large(&self, file_count: usize) -> bool {
        file_count >= self.large_batch_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrency_is_clamped() {
        let mut opts = BatchOptions::default();
        assert_eq!(opts.effective_concurrency(), 5);
        opts.concurrency = 64;
        assert_eq!(opts.effective_concurrency(), MAX_CONCURRENCY);
        opts.concurrency = 0;
        assert_eq!(opts.effective_concurrency(), 1);
    }

    #[test]
    fn large_batch_threshold_is_inclusive() {
        let opts = BatchOptions::default();
        assert!(!opts.is_large(999));
        assert!(opts.is_large(1_000));
    }
}
