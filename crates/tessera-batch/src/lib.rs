// crates/tessera-batch/src/lib.rs
//
// tessera-batch: Batch upload engine for Tessera.
//
// Drives an `Uploader` over many files with a concurrency ceiling, a
// per-file timeout, live progress/ETA, and per-file failure capture. Has no
// knowledge of datasets or versions.

pub mod engine;
pub mod options;
pub mod tracker;

pub use engine::BatchUploadEngine;
pub use options::BatchOptions;
pub use tracker::ProgressTracker;
