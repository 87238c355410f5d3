// crates/tessera-batch/src/tracker.rs
//
// Running progress counters for one batch.
//
// One tracker spans the whole file set, including every window of a large
// batch, so emitted counts are cumulative rather than per window.

use std::time::Instant;

use tessera_core::{DatasetProgress, OperationKind};

#[derive(Debug)]
pub struct ProgressTracker {
    progress: DatasetProgress,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(operation: OperationKind, total: usize) -> Self {
        Self {
            progress: DatasetProgress::new(operation, total),
            started: Instant::now(),
        }
    }

    pub fn record_success(&mut self, path: &str) -> &DatasetProgress {
        self.progress.completed += 1;
        self.advance(path)
    }

    pub fn record_failure(&mut self, path: &str) -> &DatasetProgress {
        self.progress.failed += 1;
        self.advance(path)
    }

    fn advance(&mut self, path: &str) -> &DatasetProgress {
        self.progress.current_file = Some(path.to_string());
        self.progress.recompute(self.started.elapsed());
        &self.progress
    }

    pub fn progress(&self) -> &DatasetProgress {
        &self.progress
    }

    pub fn processed(&self) -> usize {
        self.progress.processed()
    }

    pub fn started(&self) -> Instant {
        self.started
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_and_name_current_file() {
        let mut tracker = ProgressTracker::new(OperationKind::Upload, 4);
        tracker.record_success("a");
        tracker.record_failure("b");
        let p = tracker.record_success("c").clone();
        assert_eq!(p.completed, 2);
        assert_eq!(p.failed, 1);
        assert_eq!(p.current_file.as_deref(), Some("c"));
        assert_eq!(p.percentage, 75.0);
        assert_eq!(tracker.processed(), 3);
    }
}
