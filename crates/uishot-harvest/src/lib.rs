//! # uishot-harvest
//!
//! Runs the capture pipeline over an ordered list of targets and persists
//! what it finds.
//!
//! - [`orchestrator`]: sequential per-URL processing with failure isolation
//! - [`result`]: per-URL outcomes and the run-level result set
//! - [`sink`]: writes captures to disk, one directory per category

pub mod orchestrator;
pub mod result;
pub mod sink;

pub use orchestrator::BatchOrchestrator;
pub use result::{CaptureEntry, ResultSet, UrlOutcome, UrlStatus};
pub use sink::{encode, ImageDirectorySink, OutputSink};
