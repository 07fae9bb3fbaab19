//! Reference-counted frame buffer handles.
//!
//! A [`FrameBuffer`] is a lightweight view onto a shared pixel backing
//! store. All views of one backing store share a single reference count
//! guarded by its own lock; when the count reaches zero the store's release
//! callback runs exactly once, returning the pixels to their producer.
//! Handles are consumed on release, so a double release does not typecheck.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::BufferError;
use crate::mask::{MaskData, MaskPlane};
use crate::planar::{GrayImage, PlanarImage};
use crate::transform::Transform;
use crate::BufferResult;

/// Opaque identifier of a GPU texture owned by an external context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// How a texture's pixels are addressed when sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Regular 2D texture.
    Rgb,
    /// External OES texture, as produced by cameras and decoders.
    Oes,
}

/// GPU-backed pixel storage.
#[derive(Debug, Clone, Copy)]
pub struct TextureBacking {
    /// Texture name in the owning context.
    pub handle: TextureHandle,
    /// Sampling layout.
    pub kind: TextureKind,
}

/// Pixel storage behind a buffer handle.
#[derive(Debug)]
pub enum Backing {
    /// CPU planar pixels.
    Planar(PlanarImage),
    /// GPU texture plus its sampling layout.
    Texture(TextureBacking),
    /// Single-channel CPU pixels, the storage of a detached mask.
    Gray(GrayImage),
}

/// Callback run when the last handle onto a backing store goes away.
pub type ReleaseCallback = Box<dyn FnOnce() + Send>;

struct ReleaseState {
    refs: usize,
    on_release: Option<ReleaseCallback>,
}

/// A reference-counted view onto a pixel backing store.
///
/// Cloning (or [`retain`](Self::retain)) produces a sibling handle onto the
/// same store; [`crop_and_scale`](Self::crop_and_scale) produces a derived
/// view that shares the store but maps a sub-window of it. Dropping a handle
/// and calling [`release`](Self::release) are the same operation.
pub struct FrameBuffer {
    backing: Arc<Backing>,
    release: Arc<Mutex<ReleaseState>>,
    width: u32,
    height: u32,
    transform: Transform,
    // Shared between retain-siblings so spawning the mask through any of
    // them clears it for all of them.
    mask: Arc<Mutex<Option<MaskPlane>>>,
}

impl FrameBuffer {
    fn with_backing(
        backing: Backing,
        width: u32,
        height: u32,
        on_release: Option<ReleaseCallback>,
    ) -> Self {
        Self {
            backing: Arc::new(backing),
            release: Arc::new(Mutex::new(ReleaseState {
                refs: 1,
                on_release,
            })),
            width,
            height,
            transform: Transform::IDENTITY,
            mask: Arc::new(Mutex::new(None)),
        }
    }

    /// Wrap an owned planar image. The new handle holds the only reference.
    pub fn from_planar(image: PlanarImage) -> Self {
        let (width, height) = (image.width(), image.height());
        Self::with_backing(Backing::Planar(image), width, height, None)
    }

    /// Wrap an owned planar image with a callback that runs when the last
    /// handle goes away.
    pub fn from_planar_with_release(image: PlanarImage, on_release: ReleaseCallback) -> Self {
        let (width, height) = (image.width(), image.height());
        Self::with_backing(Backing::Planar(image), width, height, Some(on_release))
    }

    /// Wrap a GPU texture. The callback returns the texture to its owner
    /// once the last handle goes away.
    pub fn from_texture(
        texture: TextureBacking,
        width: u32,
        height: u32,
        on_release: ReleaseCallback,
    ) -> BufferResult<Self> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        Ok(Self::with_backing(
            Backing::Texture(texture),
            width,
            height,
            Some(on_release),
        ))
    }

    /// Wrap a single-channel image.
    pub fn from_gray(image: GrayImage) -> Self {
        let (width, height) = (image.width(), image.height());
        Self::with_backing(Backing::Gray(image), width, height, None)
    }

    /// Replace the view transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Attach a mask covering this view. The mask dimensions must match the
    /// view's logical dimensions.
    pub fn with_mask(self, mask: MaskPlane) -> Self {
        debug_assert_eq!((mask.width(), mask.height()), (self.width, self.height));
        *self.mask.lock() = Some(mask);
        self
    }

    /// Take an additional handle onto the same backing store.
    pub fn retain(&self) -> FrameBuffer {
        self.release.lock().refs += 1;
        FrameBuffer {
            backing: Arc::clone(&self.backing),
            release: Arc::clone(&self.release),
            width: self.width,
            height: self.height,
            transform: self.transform,
            mask: Arc::clone(&self.mask),
        }
    }

    /// Give up this handle.
    ///
    /// When this was the last handle onto the backing store, the store's
    /// release callback fires before the call returns. Dropping the handle
    /// is equivalent.
    pub fn release(self) {}

    /// Number of live handles onto the backing store.
    pub fn ref_count(&self) -> usize {
        self.release.lock().refs
    }

    /// Derive a view of a sub-window of this view, presented at the given
    /// target size.
    ///
    /// The backing store is shared and retained once; only the transform
    /// accumulates. A mask attached to this view follows into the derived
    /// view with the same window.
    pub fn crop_and_scale(
        &self,
        crop_x: u32,
        crop_y: u32,
        crop_width: u32,
        crop_height: u32,
        scale_width: u32,
        scale_height: u32,
    ) -> BufferResult<FrameBuffer> {
        if crop_width == 0 || crop_height == 0 {
            return Err(BufferError::InvalidDimensions {
                width: crop_width,
                height: crop_height,
            });
        }
        if scale_width == 0 || scale_height == 0 {
            return Err(BufferError::InvalidDimensions {
                width: scale_width,
                height: scale_height,
            });
        }
        if crop_x as u64 + crop_width as u64 > self.width as u64
            || crop_y as u64 + crop_height as u64 > self.height as u64
        {
            return Err(BufferError::CropOutOfBounds {
                crop_x,
                crop_y,
                crop_width,
                crop_height,
                width: self.width,
                height: self.height,
            });
        }

        let transform = self.transform.crop_scaled(
            crop_x as f32 / self.width as f32,
            crop_y as f32 / self.height as f32,
            crop_width as f32 / self.width as f32,
            crop_height as f32 / self.height as f32,
        );
        let mask = self.mask.lock().as_ref().map(|mask| {
            mask.crop_scaled(
                crop_x,
                crop_y,
                crop_width,
                crop_height,
                scale_width,
                scale_height,
            )
        });
        self.release.lock().refs += 1;
        Ok(FrameBuffer {
            backing: Arc::clone(&self.backing),
            release: Arc::clone(&self.release),
            width: scale_width,
            height: scale_height,
            transform,
            mask: Arc::new(Mutex::new(mask)),
        })
    }

    /// Detach the mask as an independent single-channel handle.
    ///
    /// The mask slot is shared between retained siblings; once one of them
    /// has spawned, the slot is empty for all of them and further calls
    /// return `None`. The spawned handle retains the backing store, so the
    /// release callback also waits for it.
    pub fn spawn_mask(&self) -> Option<FrameBuffer> {
        let mask = self.mask.lock().take()?;
        let (width, height, transform, data) = mask.into_parts();
        let backing = match data {
            MaskData::Grid(grid) => Backing::Gray(GrayImage::from_shared(width, height, grid)),
            // Mask textures are regular 2D textures.
            MaskData::Texture(handle) => Backing::Texture(TextureBacking {
                handle,
                kind: TextureKind::Rgb,
            }),
        };
        self.release.lock().refs += 1;
        Some(FrameBuffer {
            backing: Arc::new(backing),
            release: Arc::clone(&self.release),
            width,
            height,
            transform,
            mask: Arc::new(Mutex::new(None)),
        })
    }

    /// Logical view width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical view height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// View width once rotation is applied.
    pub fn rotated_width(&self) -> u32 {
        if self.transform.rotation.swaps_dimensions() {
            self.height
        } else {
            self.width
        }
    }

    /// View height once rotation is applied.
    pub fn rotated_height(&self) -> u32 {
        if self.transform.rotation.swaps_dimensions() {
            self.width
        } else {
            self.height
        }
    }

    /// Accumulated view-to-backing transform.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Pixel storage behind this view.
    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    /// Whether a mask is currently attached to this view.
    pub fn has_mask(&self) -> bool {
        self.mask.lock().is_some()
    }
}

impl Clone for FrameBuffer {
    fn clone(&self) -> Self {
        self.retain()
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        let callback = {
            let mut state = self.release.lock();
            debug_assert!(state.refs > 0, "reference count underflow");
            state.refs -= 1;
            if state.refs == 0 {
                state.on_release.take()
            } else {
                None
            }
        };
        // The callback runs outside the lock. `take` cleared the slot, so it
        // cannot run a second time.
        if let Some(callback) = callback {
            trace!(width = self.width, height = self.height, "Releasing backing store");
            callback();
        }
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("transform", &self.transform)
            .field("refs", &self.ref_count())
            .finish()
    }
}
