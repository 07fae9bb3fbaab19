//! Reference-counted video frame buffers.
//!
//! This crate provides the shared frame handle passed between producers and
//! the sink pipeline: planar, texture and single-channel backing stores, the
//! crop/scale/rotate transform accumulated by derived views, and optional
//! mask planes that follow their host view.

mod buffer;
mod error;
mod mask;
mod planar;
mod transform;

pub use buffer::{Backing, FrameBuffer, ReleaseCallback, TextureBacking, TextureHandle, TextureKind};
pub use error::BufferError;
pub use mask::{MaskData, MaskPlane};
pub use planar::{chroma_dim, frame_size, GrayImage, PlanarImage};
pub use transform::{Rotation, Transform};

/// Result type for buffer operations.
pub type BufferResult<T> = Result<T, BufferError>;
