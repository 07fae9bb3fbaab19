//! Ordered planar file sink.
//!
//! [`SinkPipeline`] accepts reference-counted frame views from any number of
//! producer threads and converts them on one dedicated worker thread,
//! strictly in arrival order, into a raw planar frame file.

mod config;
mod error;
mod sink;
mod state;

pub use config::{RecordingSummary, SinkConfig};
pub use error::SinkError;
pub use sink::{FrameSender, SinkPipeline, SinkStats};
pub use state::PipelineState;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, SinkError>;
