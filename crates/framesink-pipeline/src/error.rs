//! Error types for the sink pipeline.

use thiserror::Error;

use framesink_writer::WriterError;

/// Errors that can occur in the sink pipeline.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Output dimensions are zero or not a multiple of two.
    #[error("Invalid output dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The configured frame rate is zero.
    #[error("Invalid frame rate: {fps}")]
    InvalidFrameRate { fps: u32 },

    /// The pipeline has already been started.
    #[error("Pipeline already started")]
    AlreadyStarted,

    /// The pipeline is not accepting frames.
    #[error("Pipeline is not running")]
    NotRunning,

    /// The worker thread went away without completing the stop handshake.
    #[error("Sink worker exited unexpectedly")]
    WorkerExited,

    /// The frame file writer failed.
    #[error("Writer error: {0}")]
    Writer(#[from] WriterError),
}
