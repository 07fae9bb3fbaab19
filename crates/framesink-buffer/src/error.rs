//! Error types for the buffer module.

use thiserror::Error;

/// Errors that can occur during buffer operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Dimensions are zero or otherwise unusable.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Crop rectangle extends past the buffer bounds.
    #[error(
        "Crop rect ({crop_x},{crop_y}) {crop_width}x{crop_height} out of bounds for {width}x{height} buffer"
    )]
    CropOutOfBounds {
        crop_x: u32,
        crop_y: u32,
        crop_width: u32,
        crop_height: u32,
        width: u32,
        height: u32,
    },

    /// Pixel data length does not match the dimensions.
    #[error("Data size mismatch: expected {expected} bytes, got {actual}")]
    DataSize { expected: usize, actual: usize },
}
