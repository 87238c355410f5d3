// crates/tessera-cli/src/context.rs
//
// Wiring shared by every command: the configured upload backend, the batch
// engine, and a DatasetManager restored from the registry file.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use tessera_batch::BatchUploadEngine;
use tessera_core::{TesseraError, Uploader};
use tessera_dataset::{DatasetEvent, DatasetManager};
use tessera_store::{IpfsClient, LocalStore};
use uuid::Uuid;

use crate::config::{Backend, TesseraConfig};
use crate::output::OutputFormat;
use crate::state::{load_state, save_state};

pub struct AppContext {
    pub config: TesseraConfig,
    pub format: OutputFormat,
    pub uploader: Arc<dyn Uploader>,
    pub manager: DatasetManager,
}

impl AppContext {
    pub async fn open(config: TesseraConfig, format: OutputFormat) -> Result<Self, TesseraError> {
        let uploader = open_uploader(&config).await?;
        let state = load_state(&config.state_path())?;
        let manager = DatasetManager::with_state(
            BatchUploadEngine::new(uploader.clone()),
            config.batch_options(),
            state,
        )?;
        Ok(Self {
            config,
            format,
            uploader,
            manager,
        })
    }

    /// Write the registry back to the state file.
    pub async fn save(&self) -> Result<(), TesseraError> {
        save_state(&self.config.state_path(), &self.manager.export_state().await)
    }

    pub fn engine(&self) -> BatchUploadEngine {
        BatchUploadEngine::new(self.uploader.clone())
    }

    /// Resolve a dataset reference given as a UUID or an exact name.
    pub async fn resolve(&self, reference: &str) -> Result<Uuid, TesseraError> {
        if let Ok(id) = reference.parse::<Uuid>() {
            return Ok(id);
        }
        self.manager
            .find_by_name(reference)
            .await
            .map(|d| d.id)
            .ok_or_else(|| TesseraError::NotFound(format!("dataset '{}'", reference)))
    }

    /// Render progress events on stderr while a command runs. Does nothing
    /// in JSON mode.
    pub fn report_progress(&self) -> Option<ProgressReporter> {
        if self.format == OutputFormat::Json {
            return None;
        }
        Some(ProgressReporter::spawn(self.manager.subscribe(), std::io::stderr()))
    }
}

/// Background task printing progress lines for one command.
pub struct ProgressReporter {
    handle: JoinHandle<()>,
    done: oneshot::Sender<()>,
}

impl ProgressReporter {
    pub fn spawn<W>(mut rx: broadcast::Receiver<DatasetEvent>, mut out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let (done, mut stopped) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut mid_line = false;
            loop {
                tokio::select! {
                    biased;
                    event = rx.recv() => match event {
                        Ok(event) => render(&mut out, &event, &mut mid_line),
                        Err(RecvError::Lagged(n)) => {
                            tracing::debug!("skipped {} progress events", n)
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = &mut stopped => {
                        // Everything sent before the command returned is
                        // already queued.
                        loop {
                            match rx.try_recv() {
                                Ok(event) => render(&mut out, &event, &mut mid_line),
                                Err(TryRecvError::Lagged(n)) => {
                                    tracing::debug!("skipped {} progress events", n)
                                }
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            if mid_line {
                let _ = writeln!(out);
            }
            let _ = out.flush();
        });
        Self { handle, done }
    }

    /// Print whatever is still queued, then stop.
    pub async fn finish(self) {
        let _ = self.done.send(());
        if let Err(e) = self.handle.await {
            tracing::debug!("progress reporter ended abnormally: {}", e);
        }
    }
}

fn render(out: &mut impl Write, event: &DatasetEvent, mid_line: &mut bool) {
    match event {
        DatasetEvent::Progress { progress, .. } => {
            let eta = progress
                .eta_ms
                .map(|ms| format!(", eta {:.1}s", ms as f64 / 1000.0))
                .unwrap_or_default();
            let _ = write!(
                out,
                "\r[{}] {}/{} done, {} failed ({:.1}%){}   ",
                progress.operation,
                progress.completed,
                progress.total,
                progress.failed,
                progress.percentage,
                eta
            );
            *mid_line = true;
            if progress.processed() == progress.total {
                let _ = writeln!(out);
                *mid_line = false;
            }
        }
        other => tracing::debug!("{}", other.channel()),
    }
}

/// Build the upload primitive selected by the configuration.
pub async fn open_uploader(config: &TesseraConfig) -> Result<Arc<dyn Uploader>, TesseraError> {
    match config.backend {
        Backend::Ipfs => {
            tracing::debug!("Using IPFS backend at {}", config.ipfs_api_url);
            Ok(Arc::new(
                IpfsClient::new(&config.ipfs_api_url).with_pin(config.pin),
            ))
        }
        Backend::Local => {
            let root = config.store_path();
            tracing::debug!("Using local store at {}", root.display());
            Ok(Arc::new(LocalStore::open(root).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use tessera_core::{DatasetProgress, OperationKind};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn progress(completed: usize, total: usize) -> DatasetEvent {
        let mut progress = DatasetProgress::new(OperationKind::Create, total);
        progress.completed = completed;
        DatasetEvent::Progress {
            dataset_id: Uuid::now_v7(),
            progress,
        }
    }

    #[tokio::test]
    async fn finish_prints_every_queued_event() {
        let (tx, rx) = broadcast::channel(1024);
        let buf = SharedBuf::default();
        let reporter = ProgressReporter::spawn(rx, buf.clone());

        for completed in 1..=200 {
            tx.send(progress(completed, 200)).unwrap();
        }
        reporter.finish().await;

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.matches('\r').count(), 200);
        assert!(text.contains("200/200 done"));
        assert!(text.ends_with('\n'));
    }

    #[tokio::test]
    async fn unfinished_line_is_terminated() {
        let (tx, rx) = broadcast::channel(16);
        let buf = SharedBuf::default();
        let reporter = ProgressReporter::spawn(rx, buf.clone());

        tx.send(progress(1, 3)).unwrap();
        reporter.finish().await;

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("1/3 done"));
        assert!(text.ends_with('\n'));
    }
}
