//! Texture sampling seam.
//!
//! Reading pixels back from a GPU texture is an external primitive. The
//! trait below is the boundary: an implementation wraps a GPU context and is
//! built on the thread that will own it.

use framesink_buffer::{PlanarImage, TextureBacking, Transform};

use crate::ConvertResult;

/// Samples a GPU texture into owned planar pixels.
pub trait TextureSampler {
    /// Materialize the affine part of `transform` applied to `texture` at
    /// the given output size. Rotation is left to the caller.
    fn sample(
        &mut self,
        texture: &TextureBacking,
        transform: &Transform,
        width: u32,
        height: u32,
    ) -> ConvertResult<PlanarImage>;
}

/// Builds a sampler on the thread that will own it.
///
/// The factory runs on the sink worker thread, so the GPU context it
/// acquires carries that thread's affinity.
pub type SamplerFactory = Box<dyn FnOnce() -> ConvertResult<Box<dyn TextureSampler>> + Send>;
