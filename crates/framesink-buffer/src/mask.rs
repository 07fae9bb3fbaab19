//! Mask planes kept in lockstep with their host buffer.
//!
//! A mask rides along with a buffer view; every crop/scale applied to the
//! host applies to the mask with the same normalized rectangle. Byte-grid
//! masks are resampled eagerly with nearest-neighbor integer arithmetic;
//! texture masks only compose their transform. The identity operation shares
//! the mask instead of recomputing it.

use bytes::Bytes;

use crate::buffer::TextureHandle;
use crate::error::BufferError;
use crate::transform::Transform;
use crate::BufferResult;

/// Storage behind a mask plane.
#[derive(Debug, Clone)]
pub enum MaskData {
    /// CPU byte grid, one byte per pixel. Clones share the bytes.
    Grid(Bytes),
    /// GPU texture owned by an external context.
    Texture(TextureHandle),
}

/// A single-channel mask attached to a buffer view.
#[derive(Debug, Clone)]
pub struct MaskPlane {
    width: u32,
    height: u32,
    transform: Transform,
    data: MaskData,
}

impl MaskPlane {
    /// Create a byte-grid mask. The grid length must be `width * height`.
    pub fn from_grid(width: u32, height: u32, grid: Bytes) -> BufferResult<Self> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if grid.len() != expected {
            return Err(BufferError::DataSize {
                expected,
                actual: grid.len(),
            });
        }
        Ok(Self {
            width,
            height,
            transform: Transform::IDENTITY,
            data: MaskData::Grid(grid),
        })
    }

    /// Create a texture mask carrying the transform of its host view.
    pub fn from_texture(
        width: u32,
        height: u32,
        texture: TextureHandle,
        transform: Transform,
    ) -> BufferResult<Self> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            transform,
            data: MaskData::Texture(texture),
        })
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The mask's own accumulated transform.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Storage behind the mask.
    pub fn data(&self) -> &MaskData {
        &self.data
    }

    /// Deconstruct into storage and transform.
    pub(crate) fn into_parts(self) -> (u32, u32, Transform, MaskData) {
        (self.width, self.height, self.transform, self.data)
    }

    fn is_identity_op(
        &self,
        crop_x: u32,
        crop_y: u32,
        crop_width: u32,
        crop_height: u32,
        scale_width: u32,
        scale_height: u32,
    ) -> bool {
        crop_x == 0
            && crop_y == 0
            && crop_width == self.width
            && crop_height == self.height
            && scale_width == self.width
            && scale_height == self.height
    }

    /// Follow a host crop/scale.
    ///
    /// The identity operation returns a shared clone. Byte grids are
    /// resampled eagerly; texture masks compose their transform and defer the
    /// pixel work to the sampler.
    pub(crate) fn crop_scaled(
        &self,
        crop_x: u32,
        crop_y: u32,
        crop_width: u32,
        crop_height: u32,
        scale_width: u32,
        scale_height: u32,
    ) -> MaskPlane {
        if self.is_identity_op(crop_x, crop_y, crop_width, crop_height, scale_width, scale_height)
        {
            return self.clone();
        }
        match &self.data {
            MaskData::Grid(grid) => {
                let resampled = resample_grid(
                    grid,
                    self.width,
                    self.height,
                    crop_x,
                    crop_y,
                    crop_width,
                    crop_height,
                    scale_width,
                    scale_height,
                );
                MaskPlane {
                    width: scale_width,
                    height: scale_height,
                    transform: Transform::IDENTITY,
                    data: MaskData::Grid(resampled),
                }
            }
            MaskData::Texture(texture) => {
                let transform = self.transform.crop_scaled(
                    crop_x as f32 / self.width as f32,
                    crop_y as f32 / self.height as f32,
                    crop_width as f32 / self.width as f32,
                    crop_height as f32 / self.height as f32,
                );
                MaskPlane {
                    width: scale_width,
                    height: scale_height,
                    transform,
                    data: MaskData::Texture(*texture),
                }
            }
        }
    }
}

/// Nearest-neighbor resample of a crop window into a new grid.
#[allow(clippy::too_many_arguments)]
fn resample_grid(
    grid: &[u8],
    src_width: u32,
    src_height: u32,
    crop_x: u32,
    crop_y: u32,
    crop_width: u32,
    crop_height: u32,
    out_width: u32,
    out_height: u32,
) -> Bytes {
    let mut out = Vec::with_capacity(out_width as usize * out_height as usize);
    for y in 0..out_height as u64 {
        let src_y = nearest(crop_y as u64, crop_height as u64, out_height as u64, y)
            .min(src_height as u64 - 1);
        for x in 0..out_width as u64 {
            let src_x = nearest(crop_x as u64, crop_width as u64, out_width as u64, x)
                .min(src_width as u64 - 1);
            out.push(grid[(src_y * src_width as u64 + src_x) as usize]);
        }
    }
    Bytes::from(out)
}

/// Source coordinate for output index `i`: `offset + len * i / out`, rounded
/// to the nearest integer.
fn nearest(offset: u64, len: u64, out: u64, i: u64) -> u64 {
    offset + (2 * len * i + out) / (2 * out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_bytes(mask: &MaskPlane) -> &Bytes {
        match mask.data() {
            MaskData::Grid(grid) => grid,
            MaskData::Texture(_) => panic!("expected grid mask"),
        }
    }

    #[test]
    fn test_identity_shares_grid() {
        let mask = MaskPlane::from_grid(4, 4, Bytes::from(vec![9u8; 16])).unwrap();
        let same = mask.crop_scaled(0, 0, 4, 4, 4, 4);
        assert_eq!(
            grid_bytes(&mask).as_ptr(),
            grid_bytes(&same).as_ptr(),
            "identity crop/scale must share the grid, not copy it"
        );
    }

    #[test]
    fn test_crop_resamples_grid() {
        // 4x4 grid with distinct quadrant values
        #[rustfmt::skip]
        let grid = Bytes::from(vec![
            1, 1, 2, 2,
            1, 1, 2, 2,
            3, 3, 4, 4,
            3, 3, 4, 4u8,
        ]);
        let mask = MaskPlane::from_grid(4, 4, grid).unwrap();
        let cropped = mask.crop_scaled(2, 2, 2, 2, 2, 2);
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.height(), 2);
        assert_eq!(grid_bytes(&cropped).as_ref(), &[4, 4, 4, 4]);
    }

    #[test]
    fn test_upscale_repeats_nearest_pixels() {
        let mask = MaskPlane::from_grid(2, 1, Bytes::from(vec![10u8, 20u8])).unwrap();
        let scaled = mask.crop_scaled(0, 0, 2, 1, 4, 1);
        // samples at 0, 0.5, 1.0, 1.5 round to indices 0, 1, 1, 1 (clamped)
        assert_eq!(grid_bytes(&scaled).as_ref(), &[10, 20, 20, 20]);
    }

    #[test]
    fn test_downscale_picks_rounded_coordinates() {
        let mask = MaskPlane::from_grid(4, 1, Bytes::from(vec![1u8, 2, 3, 4])).unwrap();
        let scaled = mask.crop_scaled(0, 0, 4, 1, 2, 1);
        // samples at 0 and 2
        assert_eq!(grid_bytes(&scaled).as_ref(), &[1, 3]);
    }

    #[test]
    fn test_texture_mask_composes_lazily() {
        let mask =
            MaskPlane::from_texture(4, 4, TextureHandle(7), Transform::IDENTITY).unwrap();
        let cropped = mask.crop_scaled(2, 0, 2, 2, 4, 4);
        assert_eq!(cropped.width(), 4);
        assert_eq!(cropped.height(), 4);
        let expected = Transform::IDENTITY.crop_scaled(0.5, 0.0, 0.5, 0.5);
        assert_eq!(cropped.transform(), expected);
        assert!(matches!(cropped.data(), MaskData::Texture(TextureHandle(7))));
    }

    #[test]
    fn test_grid_length_validated() {
        assert!(matches!(
            MaskPlane::from_grid(4, 4, Bytes::from(vec![0u8; 15])),
            Err(BufferError::DataSize { .. })
        ));
    }
}
