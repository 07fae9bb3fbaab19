//! View-to-backing-store coordinate transforms.
//!
//! A [`Transform`] records the cumulative crop/scale/rotate applied to a
//! buffer view without touching pixels: an axis-aligned scale and translation
//! in normalized `[0, 1]` backing-store coordinates, plus a quantized
//! rotation applied when the view is materialized.

/// Rotation applied when a view is materialized, in degrees clockwise.
///
/// Only quarter turns are representable. At 90 and 270 degrees the
/// materialized width and height are swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// No rotation.
    #[default]
    Deg0,
    /// Quarter turn clockwise.
    Deg90,
    /// Half turn.
    Deg180,
    /// Three-quarter turn clockwise.
    Deg270,
}

impl Rotation {
    /// Parse a rotation from degrees. Angles other than quarter turns are rejected.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    /// Rotation angle in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Whether materializing at this rotation swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// Combine two rotations.
    pub fn compose(self, other: Rotation) -> Rotation {
        match (self.degrees() + other.degrees()) % 360 {
            90 => Self::Deg90,
            180 => Self::Deg180,
            270 => Self::Deg270,
            _ => Self::Deg0,
        }
    }
}

/// Immutable mapping from a view's normalized coordinates into its backing store.
///
/// Composition always produces a new value; handles never observe a transform
/// mutated behind their back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Horizontal scale factor.
    pub scale_x: f32,
    /// Vertical scale factor.
    pub scale_y: f32,
    /// Horizontal offset in normalized backing coordinates.
    pub translate_x: f32,
    /// Vertical offset in normalized backing coordinates.
    pub translate_y: f32,
    /// Quantized rotation applied at materialization.
    pub rotation: Rotation,
}

impl Transform {
    /// The identity mapping.
    pub const IDENTITY: Transform = Transform {
        scale_x: 1.0,
        scale_y: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        rotation: Rotation::Deg0,
    };

    /// Whether this transform maps the view onto the full backing store unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Compose with a further scale.
    pub fn scaled(self, sx: f32, sy: f32) -> Transform {
        Transform {
            scale_x: self.scale_x * sx,
            scale_y: self.scale_y * sy,
            ..self
        }
    }

    /// Compose with a further translation, given in this view's coordinates.
    pub fn translated(self, tx: f32, ty: f32) -> Transform {
        Transform {
            translate_x: self.translate_x + self.scale_x * tx,
            translate_y: self.translate_y + self.scale_y * ty,
            ..self
        }
    }

    /// Compose with a further rotation.
    pub fn rotated(self, rotation: Rotation) -> Transform {
        Transform {
            rotation: self.rotation.compose(rotation),
            ..self
        }
    }

    /// Fold a crop window into the accumulated mapping.
    ///
    /// The window is given in normalized view coordinates: offset `(x, y)`
    /// and extent `(w, h)`, all in `[0, 1]`. The window applies first, then
    /// the existing transform, so nested crops compose associatively.
    pub fn crop_scaled(self, x: f32, y: f32, w: f32, h: f32) -> Transform {
        self.translated(x, y).scaled(w, h)
    }

    /// Map a normalized view point through the affine part.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.translate_x + self.scale_x * x,
            self.translate_y + self.scale_y * y,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
