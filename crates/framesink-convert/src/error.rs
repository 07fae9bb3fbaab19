//! Error types for the conversion module.

use thiserror::Error;

use framesink_buffer::BufferError;

/// Errors that can occur while materializing a frame.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A texture-backed frame reached a converter that has no sampler.
    #[error("No GPU context available for texture-backed frame")]
    NoGpuContext,

    /// The texture sampler failed.
    #[error("Texture sampler failed: {0}")]
    Sampler(String),

    /// The source buffer was rejected.
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
}
