//! Raw planar frame file writing.
//!
//! This crate owns the on-disk format of recorded frames: a YUV4MPEG2
//! stream with one header and marker-delimited raw planar payloads.

mod error;
mod y4m;

pub use error::WriterError;
pub use y4m::{validate_dimensions, Y4mWriter, FRAME_MARKER};

/// Frame rate written into the header when none is configured.
pub const DEFAULT_FPS: u32 = 30;

/// Result type for writer operations.
pub type WriterResult<T> = Result<T, WriterError>;
