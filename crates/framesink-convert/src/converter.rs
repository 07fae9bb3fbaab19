//! Materializes buffer views into owned planar frames.

use std::marker::PhantomData;

use tracing::trace;

use framesink_buffer::{Backing, FrameBuffer, PlanarImage, Transform};

use crate::error::ConvertError;
use crate::i420::{crop_and_scale_planar, gray_to_planar, rotate_planar};
use crate::sampler::TextureSampler;
use crate::ConvertResult;

/// Converts `(backing, transform)` views into owned planar frames.
///
/// Planar and single-channel frames convert on the CPU; texture-backed
/// frames need a sampler. A converter is not `Send`: it lives and dies on
/// the thread that built it, which is the thread that owns the sampler's
/// GPU context.
pub struct FrameConverter {
    sampler: Option<Box<dyn TextureSampler>>,
    _affinity: PhantomData<*const ()>,
}

impl FrameConverter {
    /// Converter for CPU-backed frames only.
    pub fn new() -> Self {
        Self {
            sampler: None,
            _affinity: PhantomData,
        }
    }

    /// Converter that can also sample texture-backed frames.
    pub fn with_sampler(sampler: Box<dyn TextureSampler>) -> Self {
        Self {
            sampler: Some(sampler),
            _affinity: PhantomData,
        }
    }

    /// Whether texture-backed frames can be converted.
    pub fn has_sampler(&self) -> bool {
        self.sampler.is_some()
    }

    /// Materialize a buffer view as owned planar pixels, independent of the
    /// source.
    ///
    /// The output is the view's logical size with rotation folded in, so
    /// width and height come out swapped at 90 and 270 degrees.
    pub fn convert(&mut self, buffer: &FrameBuffer) -> ConvertResult<PlanarImage> {
        let transform = buffer.transform();
        let upright = match buffer.backing() {
            Backing::Planar(image) => {
                let window = source_window(&transform, image.width(), image.height());
                materialize(image, window, buffer.width(), buffer.height())?
            }
            Backing::Gray(image) => {
                let expanded = gray_to_planar(image)?;
                let window = source_window(&transform, image.width(), image.height());
                materialize(&expanded, window, buffer.width(), buffer.height())?
            }
            Backing::Texture(texture) => {
                let sampler = self.sampler.as_mut().ok_or(ConvertError::NoGpuContext)?;
                sampler.sample(texture, &transform, buffer.width(), buffer.height())?
            }
        };
        let out = rotate_planar(&upright, transform.rotation)?;
        trace!(
            width = out.width(),
            height = out.height(),
            rotation = transform.rotation.degrees(),
            "Materialized planar frame"
        );
        Ok(out)
    }
}

impl Default for FrameConverter {
    fn default() -> Self {
        Self::new()
    }
}

fn materialize(
    src: &PlanarImage,
    window: (u32, u32, u32, u32),
    out_width: u32,
    out_height: u32,
) -> ConvertResult<PlanarImage> {
    let (x, y, w, h) = window;
    crop_and_scale_planar(src, x, y, w, h, out_width, out_height)
}

/// Integer window selected by the affine part of a transform on a
/// `width x height` backing store, rounded to nearest and clamped so the
/// window always lies inside the store.
fn source_window(transform: &Transform, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let x = ((transform.translate_x * width as f32).round() as i64).clamp(0, width as i64 - 1);
    let y = ((transform.translate_y * height as f32).round() as i64).clamp(0, height as i64 - 1);
    let w = ((transform.scale_x * width as f32).round() as i64).clamp(1, width as i64 - x);
    let h = ((transform.scale_y * height as f32).round() as i64).clamp(1, height as i64 - y);
    (x as u32, y as u32, w as u32, h as u32)
}
