//! Error types for the frame file writer.

use thiserror::Error;

/// Errors that can occur while writing a frame file.
#[derive(Debug, Error)]
pub enum WriterError {
    /// Frame dimensions are zero or not a multiple of two.
    #[error("Invalid dimensions: {width}x{height} (both must be positive and even)")]
    InvalidDimensions { width: u32, height: u32 },

    /// Frame payload length does not match the negotiated frame size.
    #[error("Frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },

    /// The writer has already been closed.
    #[error("Writer is closed")]
    Closed,

    /// The underlying sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
