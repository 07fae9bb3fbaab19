//! Canonical planar conversion of frame buffer views.
//!
//! This crate turns a frame buffer's `(backing, transform)` pair into an
//! owned planar image: CPU geometry for planar and single-channel backings,
//! a pluggable sampler seam for texture backings.

mod converter;
mod error;
mod i420;
mod sampler;

pub use converter::FrameConverter;
pub use error::ConvertError;
pub use i420::{aspect_crop, crop_and_scale_planar, gray_to_planar, rotate_planar};
pub use sampler::{SamplerFactory, TextureSampler};

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
