// crates/tessera-batch/src/engine.rs
//
// BatchUploadEngine: drives the upload primitive over many files.
//
// Uploads are polled as futures on the calling task through a
// `FuturesUnordered` pool of at most `concurrency` entries. Completions are
// handled one at a time between polls, so the result buffers and the
// progress tracker are only ever touched serially. The pool is refilled
// from the remaining queue after every completion.
//
// Batches at or above the large-batch threshold are split into windows that
// run sequentially through the same pool logic. Each window's buffers are
// folded into the running result and dropped before the next one starts.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};

use tessera_core::{
    BatchUploadResult, DatasetProgress, FailedUpload, TesseraError, UploadOptions, UploadResult,
    Uploader,
};

use crate::options::BatchOptions;
use crate::tracker::ProgressTracker;

/// Files processed between two memory observations.
pub const MEMORY_CHECK_INTERVAL: usize = 100;

/// Outcomes collected so far, in completion order.
#[derive(Debug, Default)]
struct Collected {
    successes: Vec<UploadResult>,
    failures: Vec<FailedUpload>,
}

impl Collected {
    fn with_capacity(n: usize) -> Self {
        Self {
            successes: Vec::with_capacity(n),
            failures: Vec::new(),
        }
    }

    fn absorb(&mut self, window: Collected) {
        self.successes.extend(window.successes);
        self.failures.extend(window.failures);
    }

    /// Rough number of heap bytes held by the buffers.
    fn approx_bytes(&self) -> u64 {
        let successes: usize = self
            .successes
            .iter()
            .map(|u| {
                std::mem::size_of::<UploadResult>()
                    + u.cid.len()
                    + u.original_path.len()
                    + u.content_hash.as_ref().map_or(0, String::len)
                    + u.tags.iter().map(String::len).sum::<usize>()
            })
            .sum();
        let failures: usize = self
            .failures
            .iter()
            .map(|f| std::mem::size_of::<FailedUpload>() + f.path.len() + f.error.len())
            .sum();
        (successes + failures) as u64
    }
}

/// Concurrency-bounded batch uploader over any `Uploader` backend.
#[derive(Clone)]
pub struct BatchUploadEngine {
    uploader: Arc<dyn Uploader>,
}

impl BatchUploadEngine {
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self { uploader }
    }

    /// Upload every file in `files` with the shared `upload` options.
    ///
    /// Every input produces exactly one outcome: an `UploadResult` or a
    /// `FailedUpload`. Per-file errors and timeouts never abort sibling
    /// uploads and never surface as an `Err`. The batch itself is refused
    /// up front when the file list is empty or when it asks for encryption
    /// the backend cannot provide.
    ///
    /// `on_progress` is called once per completed file with the recomputed
    /// progress record.
    pub async fn upload_batch<F>(
        &self,
        files: &[PathBuf],
        upload: &UploadOptions,
        options: &BatchOptions,
        mut on_progress: F,
    ) -> Result<BatchUploadResult, TesseraError>
    where
        F: FnMut(&DatasetProgress),
    {
        if files.is_empty() {
            return Err(TesseraError::Validation(
                "batch upload requires at least one file".to_string(),
            ));
        }
        if upload.encrypt && !self.uploader.supports_encryption() {
            return Err(TesseraError::Unsupported(
                "the configured backend cannot encrypt uploads".to_string(),
            ));
        }

        let mut tracker = ProgressTracker::new(options.operation, files.len());

        let collected = if options.is_large(files.len()) {
            let chunk_size = options.effective_chunk_size();
            let windows = files.len().div_ceil(chunk_size);
            tracing::info!(
                "Large batch: {} files in {} windows of {} (concurrency {})",
                files.len(),
                windows,
                chunk_size,
                options.effective_concurrency()
            );

            let mut collected = Collected::with_capacity(files.len());
            for (index, window_files) in files.chunks(chunk_size).enumerate() {
                let window = self
                    .run_window(
                        window_files,
                        upload,
                        options,
                        &mut tracker,
                        &mut on_progress,
                        &collected,
                    )
                    .await;
                collected.absorb(window);
                tracing::debug!(
                    "Window {}/{} done: {} succeeded, {} failed so far",
                    index + 1,
                    windows,
                    tracker.progress().completed,
                    tracker.progress().failed
                );
            }
            collected
        } else {
            tracing::info!(
                "Batch: {} files (concurrency {})",
                files.len(),
                options.effective_concurrency()
            );
            self.run_window(
                files,
                upload,
                options,
                &mut tracker,
                &mut on_progress,
                &Collected::default(),
            )
            .await
        };

        let result = finish(files.len(), collected, tracker.started().elapsed());
        tracing::info!(
            "Batch complete: {}/{} uploaded, {} failed in {}ms",
            result.successful,
            result.total,
            result.failed,
            result.duration_ms
        );
        Ok(result)
    }

    /// Run one pool over `files` until every file has an outcome.
    ///
    /// `earlier` holds outcomes from previous windows; it is only read for
    /// the memory observation.
    async fn run_window<F>(
        &self,
        files: &[PathBuf],
        upload: &UploadOptions,
        options: &BatchOptions,
        tracker: &mut ProgressTracker,
        on_progress: &mut F,
        earlier: &Collected,
    ) -> Collected
    where
        F: FnMut(&DatasetProgress),
    {
        let mut window = Collected::with_capacity(files.len());
        let mut queue = files.iter();
        let mut in_flight = FuturesUnordered::new();

        for path in queue.by_ref().take(options.effective_concurrency()) {
            in_flight.push(self.upload_one(path, upload, options.timeout));
        }

        while let Some((path, outcome)) = in_flight.next().await {
            let shown = path.display().to_string();
            let progress = match outcome {
                Ok(result) => {
                    tracing::debug!("Uploaded {} -> {}", shown, result.cid);
                    window.successes.push(result);
                    tracker.record_success(&shown)
                }
                Err(e) => {
                    tracing::warn!("Upload failed for {}: {}", shown, e);
                    window.failures.push(FailedUpload {
                        path: shown.clone(),
                        error: e.to_string(),
                        retry_count: 0,
                        failed_at: Utc::now(),
                    });
                    tracker.record_failure(&shown)
                }
            };
            tracing::trace!(
                "Progress {:.1}% ({} ok, {} failed, eta {:?}ms)",
                progress.percentage,
                progress.completed,
                progress.failed,
                progress.eta_ms
            );
            on_progress(progress);

            if tracker.processed() % MEMORY_CHECK_INTERVAL == 0 {
                observe_memory(
                    tracker.processed(),
                    earlier.approx_bytes() + window.approx_bytes(),
                    options.memory_warn_bytes,
                );
            }

            if let Some(next) = queue.next() {
                in_flight.push(self.upload_one(next, upload, options.timeout));
            }
        }

        window
    }

    /// Upload a single file, converting a timeout into an error outcome.
    async fn upload_one<'a>(
        &self,
        path: &'a Path,
        upload: &UploadOptions,
        timeout: Duration,
    ) -> (&'a Path, Result<UploadResult, TesseraError>) {
        let outcome = match tokio::time::timeout(timeout, self.uploader.upload(path, upload)).await
        {
            Ok(result) => result,
            Err(_) => Err(TesseraError::Upload(format!(
                "upload timed out after {}ms",
                timeout.as_millis()
            ))),
        };
        (path, outcome)
    }
}

/// Log the advisory memory observation. Never pauses or rejects work.
fn observe_memory(processed: usize, retained_bytes: u64, warn_bytes: u64) {
    if retained_bytes >= warn_bytes {
        tracing::warn!(
            "Batch result buffers hold ~{} bytes after {} files (advisory threshold {})",
            retained_bytes,
            processed,
            warn_bytes
        );
    } else {
        tracing::debug!(
            "Batch result buffers hold ~{} bytes after {} files",
            retained_bytes,
            processed
        );
    }
}

fn finish(total: usize, collected: Collected, elapsed: Duration) -> BatchUploadResult {
    let total_bytes: u64 = collected.successes.iter().map(|u| u.size).sum();
    let secs = elapsed.as_secs_f64();
    let average_speed = if secs > 0.0 {
        total_bytes as f64 / secs
    } else {
        0.0
    };

    BatchUploadResult {
        total,
        successful: collected.successes.len(),
        failed: collected.failures.len(),
        successful_uploads: collected.successes,
        failed_uploads: collected.failures,
        duration_ms: elapsed.as_millis() as u64,
        average_speed,
    }
}
