//! CPU plane geometry.
//!
//! Nearest-neighbor crop/scale and quarter-turn rotation over packed planar
//! frames. These materialize the geometric part of a view transform; no
//! colorspace math happens here.

use framesink_buffer::{chroma_dim, BufferError, GrayImage, PlanarImage, Rotation};

use crate::ConvertResult;

struct PlaneWindow {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Nearest source index for output sample `i` when mapping `out` samples
/// onto `len` source samples starting at `offset`.
fn nearest(offset: u32, len: u32, out: u32, i: u32) -> u64 {
    offset as u64 + (2 * len as u64 * i as u64 + out as u64) / (2 * out as u64)
}

fn scale_plane(
    src: &[u8],
    src_width: u32,
    src_height: u32,
    window: &PlaneWindow,
    dst: &mut [u8],
    dst_width: u32,
    dst_height: u32,
) {
    for y in 0..dst_height {
        let src_y = nearest(window.y, window.height, dst_height, y).min(src_height as u64 - 1);
        let src_row = (src_y * src_width as u64) as usize;
        let dst_row = (y * dst_width) as usize;
        for x in 0..dst_width {
            let src_x = nearest(window.x, window.width, dst_width, x).min(src_width as u64 - 1);
            dst[dst_row + x as usize] = src[src_row + src_x as usize];
        }
    }
}

/// Crop a window out of a planar frame and scale it to the given size,
/// nearest-neighbor per plane.
///
/// Crop offsets are forced even before any plane is sampled, so the halved
/// chroma origin sits under the luma origin rather than half a chroma site
/// off. Identity geometry yields byte-identical planes.
pub fn crop_and_scale_planar(
    src: &PlanarImage,
    crop_x: u32,
    crop_y: u32,
    crop_width: u32,
    crop_height: u32,
    out_width: u32,
    out_height: u32,
) -> ConvertResult<PlanarImage> {
    if crop_width == 0 || crop_height == 0 {
        return Err(BufferError::InvalidDimensions {
            width: crop_width,
            height: crop_height,
        }
        .into());
    }
    if crop_x as u64 + crop_width as u64 > src.width() as u64
        || crop_y as u64 + crop_height as u64 > src.height() as u64
    {
        return Err(BufferError::CropOutOfBounds {
            crop_x,
            crop_y,
            crop_width,
            crop_height,
            width: src.width(),
            height: src.height(),
        }
        .into());
    }
    if crop_x == 0
        && crop_y == 0
        && crop_width == src.width()
        && crop_height == src.height()
        && out_width == src.width()
        && out_height == src.height()
    {
        return Ok(src.clone());
    }

    // Even offsets keep the chroma planes aligned with the luma above them.
    let crop_x = crop_x & !1;
    let crop_y = crop_y & !1;

    let mut out = PlanarImage::new(out_width, out_height)?;
    let luma = PlaneWindow {
        x: crop_x,
        y: crop_y,
        width: crop_width,
        height: crop_height,
    };
    scale_plane(
        src.y(),
        src.width(),
        src.height(),
        &luma,
        out.y_mut(),
        out_width,
        out_height,
    );

    let chroma = PlaneWindow {
        x: crop_x / 2,
        y: crop_y / 2,
        width: chroma_dim(crop_width),
        height: chroma_dim(crop_height),
    };
    let (src_cw, src_ch) = (src.chroma_width(), src.chroma_height());
    let (out_cw, out_ch) = (out.chroma_width(), out.chroma_height());
    scale_plane(src.u(), src_cw, src_ch, &chroma, out.u_mut(), out_cw, out_ch);
    scale_plane(src.v(), src_cw, src_ch, &chroma, out.v_mut(), out_cw, out_ch);
    Ok(out)
}

fn rotate_plane(src: &[u8], width: u32, height: u32, rotation: Rotation, dst: &mut [u8]) {
    let w = width as usize;
    let h = height as usize;
    match rotation {
        Rotation::Deg0 => dst.copy_from_slice(src),
        Rotation::Deg90 => {
            // first source row becomes the last output column
            for y in 0..h {
                for x in 0..w {
                    dst[x * h + (h - 1 - y)] = src[y * w + x];
                }
            }
        }
        Rotation::Deg180 => {
            for y in 0..h {
                for x in 0..w {
                    dst[(h - 1 - y) * w + (w - 1 - x)] = src[y * w + x];
                }
            }
        }
        Rotation::Deg270 => {
            for y in 0..h {
                for x in 0..w {
                    dst[(w - 1 - x) * h + y] = src[y * w + x];
                }
            }
        }
    }
}

/// Rotate a planar frame clockwise by a quarter-turn multiple.
///
/// Output dimensions swap at 90 and 270 degrees.
pub fn rotate_planar(src: &PlanarImage, rotation: Rotation) -> ConvertResult<PlanarImage> {
    if rotation == Rotation::Deg0 {
        return Ok(src.clone());
    }
    let (out_width, out_height) = if rotation.swaps_dimensions() {
        (src.height(), src.width())
    } else {
        (src.width(), src.height())
    };
    let mut out = PlanarImage::new(out_width, out_height)?;
    rotate_plane(src.y(), src.width(), src.height(), rotation, out.y_mut());
    let (cw, ch) = (src.chroma_width(), src.chroma_height());
    rotate_plane(src.u(), cw, ch, rotation, out.u_mut());
    rotate_plane(src.v(), cw, ch, rotation, out.v_mut());
    Ok(out)
}

/// Expand a single-channel image to planar: the channel becomes luma and
/// both chroma planes sit at the neutral 128.
pub fn gray_to_planar(gray: &GrayImage) -> ConvertResult<PlanarImage> {
    let mut out = PlanarImage::new(gray.width(), gray.height())?;
    out.y_mut().copy_from_slice(gray.data());
    Ok(out)
}

/// Centered crop window equalizing the source aspect ratio with the
/// target's, as `(crop_x, crop_y, crop_width, crop_height)`.
pub fn aspect_crop(
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> (u32, u32, u32, u32) {
    // the window never collapses to zero
    let crop_width = src_width
        .min((dst_width as u64 * src_height as u64 / dst_height as u64) as u32)
        .max(1);
    let crop_height = src_height
        .min((dst_height as u64 * src_width as u64 / dst_width as u64) as u32)
        .max(1);
    let crop_x = (src_width - crop_width) / 2;
    let crop_y = (src_height - crop_height) / 2;
    (crop_x, crop_y, crop_width, crop_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x4 planar frame with sequential luma and distinct chroma bytes.
    fn sequential_4x4() -> PlanarImage {
        let mut data: Vec<u8> = (1..=16).collect();
        data.extend_from_slice(&[21, 22, 23, 24]); // u
        data.extend_from_slice(&[31, 32, 33, 34]); // v
        PlanarImage::from_packed(4, 4, data).unwrap()
    }

    #[test]
    fn test_identity_geometry_is_byte_identical() {
        let src = sequential_4x4();
        let out = crop_and_scale_planar(&src, 0, 0, 4, 4, 4, 4).unwrap();
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn test_crop_quadrant() {
        let src = sequential_4x4();
        let out = crop_and_scale_planar(&src, 2, 2, 2, 2, 2, 2).unwrap();
        assert_eq!(out.y(), &[11, 12, 15, 16]);
        assert_eq!(out.u(), &[24]);
        assert_eq!(out.v(), &[34]);
    }

    #[test]
    fn test_downscale_picks_nearest_rows() {
        let src = sequential_4x4();
        let out = crop_and_scale_planar(&src, 0, 0, 4, 4, 2, 2).unwrap();
        // columns 0 and 2 of rows 0 and 2
        assert_eq!(out.y(), &[1, 3, 9, 11]);
    }

    #[test]
    fn test_upscale_repeats_pixels() {
        let src = PlanarImage::from_packed(2, 2, vec![1, 2, 3, 4, 128, 128]).unwrap();
        let out = crop_and_scale_planar(&src, 0, 0, 2, 2, 4, 4).unwrap();
        #[rustfmt::skip]
        assert_eq!(out.y(), &[
            1, 2, 2, 2,
            3, 4, 4, 4,
            3, 4, 4, 4,
            3, 4, 4, 4,
        ]);
    }

    #[test]
    fn test_odd_crop_offset_snaps_to_even() {
        let src = sequential_4x4();
        let out = crop_and_scale_planar(&src, 1, 1, 2, 2, 2, 2).unwrap();
        // both offsets are forced down to 0
        assert_eq!(out.y(), &[1, 2, 5, 6]);
        assert_eq!(out.u(), &[21]);
        assert_eq!(out.v(), &[31]);
    }

    #[test]
    fn test_snapped_luma_stays_over_its_chroma() {
        let mut data: Vec<u8> = vec![10, 20, 30, 40, 50, 60, 70, 80];
        data.extend_from_slice(&[1, 2]); // u, 2x1
        data.extend_from_slice(&[3, 4]); // v, 2x1
        let src = PlanarImage::from_packed(4, 2, data).unwrap();
        let out = crop_and_scale_planar(&src, 1, 0, 2, 2, 2, 2).unwrap();
        // the window slides to column 0, the chroma site covering that luma
        assert_eq!(out.y(), &[10, 20, 50, 60]);
        assert_eq!(out.u(), &[1]);
        assert_eq!(out.v(), &[3]);
    }

    #[test]
    fn test_crop_bounds_validated() {
        let src = sequential_4x4();
        assert!(crop_and_scale_planar(&src, 3, 3, 2, 2, 2, 2).is_err());
        assert!(crop_and_scale_planar(&src, 0, 0, 0, 2, 2, 2).is_err());
    }

    #[test]
    fn test_rotate_90_clockwise() {
        let mut data: Vec<u8> = (1..=8).collect();
        data.extend_from_slice(&[20, 21]); // u, 2x1
        data.extend_from_slice(&[30, 31]); // v, 2x1
        let src = PlanarImage::from_packed(4, 2, data).unwrap();
        let out = rotate_planar(&src, Rotation::Deg90).unwrap();
        assert_eq!(out.width(), 2);
        assert_eq!(out.height(), 4);
        // bottom-left source pixel lands top-left
        assert_eq!(out.y(), &[5, 1, 6, 2, 7, 3, 8, 4]);
        assert_eq!(out.u(), &[20, 21]);
        assert_eq!(out.v(), &[30, 31]);
    }

    #[test]
    fn test_rotate_180() {
        let src = sequential_4x4();
        let out = rotate_planar(&src, Rotation::Deg180).unwrap();
        let reversed: Vec<u8> = (1..=16).rev().collect();
        assert_eq!(out.y(), reversed.as_slice());
        assert_eq!(out.u(), &[24, 23, 22, 21]);
    }

    #[test]
    fn test_four_quarter_turns_reproduce_input() {
        let src = sequential_4x4();
        let mut frame = src.clone();
        for _ in 0..4 {
            frame = rotate_planar(&frame, Rotation::Deg90).unwrap();
        }
        assert_eq!(frame.data(), src.data());
    }

    #[test]
    fn test_quarter_plus_quarter_is_half_turn() {
        let src = sequential_4x4();
        let twice = rotate_planar(&rotate_planar(&src, Rotation::Deg90).unwrap(), Rotation::Deg90)
            .unwrap();
        let half = rotate_planar(&src, Rotation::Deg180).unwrap();
        assert_eq!(twice.data(), half.data());
    }

    #[test]
    fn test_gray_expands_with_neutral_chroma() {
        let gray = GrayImage::from_bytes(2, 2, vec![9u8, 8, 7, 6].into()).unwrap();
        let out = gray_to_planar(&gray).unwrap();
        assert_eq!(out.y(), &[9, 8, 7, 6]);
        assert_eq!(out.u(), &[128]);
        assert_eq!(out.v(), &[128]);
    }

    #[test]
    fn test_aspect_crop_shaves_height_for_wider_target() {
        // 4:3 source, 16:9 target
        let (x, y, w, h) = aspect_crop(640, 480, 1920, 1080);
        assert_eq!((w, h), (640, 360));
        assert_eq!((x, y), (0, 60));
    }

    #[test]
    fn test_aspect_crop_shaves_width_for_taller_target() {
        let (x, y, w, h) = aspect_crop(640, 480, 480, 480);
        assert_eq!((w, h), (480, 480));
        assert_eq!((x, y), (80, 0));
    }

    #[test]
    fn test_aspect_crop_identity_for_matching_ratio() {
        let (x, y, w, h) = aspect_crop(640, 480, 320, 240);
        assert_eq!((x, y, w, h), (0, 0, 640, 480));
    }
}
