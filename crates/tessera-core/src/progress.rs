// crates/tessera-core/src/progress.rs
//
// Live progress record for a running batch.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operation a batch is running on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Upload,
    Create,
    Update,
    AddFiles,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Upload => write!(f, "upload"),
            OperationKind::Create => write!(f, "create"),
            OperationKind::Update => write!(f, "update"),
            OperationKind::AddFiles => write!(f, "add_files"),
        }
    }
}

/// Progress of one batch, re-emitted after every file outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProgress {
    pub operation: OperationKind,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Path of the file whose outcome produced this update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    /// Share of files with an outcome, 0.0 to 100.0.
    pub percentage: f64,
    /// Successful files per second since the batch started.
    pub rate: f64,
    /// Estimated milliseconds remaining; `None` while the rate is zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_ms: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl DatasetProgress {
    pub fn new(operation: OperationKind, total: usize) -> Self {
        Self {
            operation,
            total,
            completed: 0,
            failed: 0,
            current_file: None,
            percentage: 0.0,
            rate: 0.0,
            eta_ms: None,
            timestamp: Utc::now(),
        }
    }

    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed())
    }

    /// Recompute percentage, rate, and ETA from the counters.
    ///
    /// `rate = completed / elapsed_ms * 1000`; the ETA divides the remaining
    /// file count by that rate and is undefined when the rate is zero.
    pub fn recompute(&mut self, elapsed: Duration) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.percentage = if self.total == 0 {
            100.0
        } else {
            self.processed() as f64 / self.total as f64 * 100.0
        };
        self.rate = if elapsed_ms > 0.0 {
            self.completed as f64 * 1000.0 / elapsed_ms
        } else {
            0.0
        };
        self.eta_ms = if self.rate > 0.0 {
            Some((self.remaining() as f64 / self.rate * 1000.0).round() as u64)
        } else {
            None
        };
        self.timestamp = Utc::now();
    }
}
