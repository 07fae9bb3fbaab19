//! Owned planar pixel storage.
//!
//! [`PlanarImage`] is the canonical planar frame: a full-resolution luma
//! plane followed by two half-resolution chroma planes in one contiguous
//! allocation, tightly packed (stride equals plane width).

use bytes::Bytes;

use crate::error::BufferError;
use crate::BufferResult;

/// Chroma plane dimension for a luma dimension, rounded up.
pub fn chroma_dim(dim: u32) -> u32 {
    (dim + 1) / 2
}

/// Total byte size of a packed planar frame.
pub fn frame_size(width: u32, height: u32) -> usize {
    let luma = width as usize * height as usize;
    let chroma = chroma_dim(width) as usize * chroma_dim(height) as usize;
    luma + 2 * chroma
}

/// An owned planar frame: Y plane, then U, then V, tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanarImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PlanarImage {
    /// Create a black frame (luma 0, chroma at the neutral 128).
    pub fn new(width: u32, height: u32) -> BufferResult<Self> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        let luma = width as usize * height as usize;
        let mut data = vec![128u8; frame_size(width, height)];
        data[..luma].fill(0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap packed planar bytes. The length must match the dimensions exactly.
    pub fn from_packed(width: u32, height: u32, data: Vec<u8>) -> BufferResult<Self> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        let expected = frame_size(width, height);
        if data.len() != expected {
            return Err(BufferError::DataSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Chroma plane width.
    pub fn chroma_width(&self) -> u32 {
        chroma_dim(self.width)
    }

    /// Chroma plane height.
    pub fn chroma_height(&self) -> u32 {
        chroma_dim(self.height)
    }

    fn luma_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn chroma_len(&self) -> usize {
        self.chroma_width() as usize * self.chroma_height() as usize
    }

    /// Luma plane.
    pub fn y(&self) -> &[u8] {
        &self.data[..self.luma_len()]
    }

    /// First chroma plane.
    pub fn u(&self) -> &[u8] {
        let luma = self.luma_len();
        &self.data[luma..luma + self.chroma_len()]
    }

    /// Second chroma plane.
    pub fn v(&self) -> &[u8] {
        let offset = self.luma_len() + self.chroma_len();
        &self.data[offset..offset + self.chroma_len()]
    }

    /// Mutable luma plane.
    pub fn y_mut(&mut self) -> &mut [u8] {
        let luma = self.luma_len();
        &mut self.data[..luma]
    }

    /// Mutable first chroma plane.
    pub fn u_mut(&mut self) -> &mut [u8] {
        let luma = self.luma_len();
        let chroma = self.chroma_len();
        &mut self.data[luma..luma + chroma]
    }

    /// Mutable second chroma plane.
    pub fn v_mut(&mut self) -> &mut [u8] {
        let luma = self.luma_len();
        let chroma = self.chroma_len();
        &mut self.data[luma + chroma..luma + 2 * chroma]
    }

    /// Full packed frame bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume into packed frame bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// A single-channel byte image, tightly packed.
///
/// Clones share the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: u32,
    height: u32,
    data: Bytes,
}

impl GrayImage {
    /// Wrap single-channel bytes. The length must be `width * height`.
    pub fn from_bytes(width: u32, height: u32, data: Bytes) -> BufferResult<Self> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(BufferError::DataSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap bytes whose length is already known to match the dimensions.
    pub(crate) fn from_shared(width: u32, height: u32, data: Bytes) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the pixel bytes.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }
}
