//! Synthetic test-pattern frames.

use clap::ValueEnum;

use framesink_buffer::{BufferResult, PlanarImage};

/// BT.601 luma/chroma triples for the classic vertical bars, left to
/// right: white, yellow, cyan, green, magenta, red, blue.
const BARS: [(u8, u8, u8); 7] = [
    (235, 128, 128),
    (210, 16, 146),
    (170, 166, 16),
    (145, 54, 34),
    (106, 202, 222),
    (81, 90, 240),
    (41, 240, 110),
];

/// Test pattern painted into generated frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    /// Vertical color bars scrolling one pixel per frame.
    Bars,
    /// Diagonal luma gradient drifting one step per frame.
    Gradient,
}

impl Pattern {
    /// Render the frame at `index` for a stream of the given size.
    pub fn render(self, width: u32, height: u32, index: u32) -> BufferResult<PlanarImage> {
        match self {
            Pattern::Bars => bars(width, height, index),
            Pattern::Gradient => gradient(width, height, index),
        }
    }
}

fn bars(width: u32, height: u32, index: u32) -> BufferResult<PlanarImage> {
    let mut image = PlanarImage::new(width, height)?;
    let w = width as usize;
    let shift = index as usize % w;
    let bar_at = |x: usize| BARS[(x + shift) % w * BARS.len() / w];

    let luma = image.y_mut();
    for y in 0..height as usize {
        for x in 0..w {
            luma[y * w + x] = bar_at(x).0;
        }
    }
    // Chroma is half resolution, so sample the bar under the left luma
    // column of each chroma cell.
    let cw = image.chroma_width() as usize;
    let ch = image.chroma_height() as usize;
    let u = image.u_mut();
    for y in 0..ch {
        for x in 0..cw {
            u[y * cw + x] = bar_at(x * 2).1;
        }
    }
    let v = image.v_mut();
    for y in 0..ch {
        for x in 0..cw {
            v[y * cw + x] = bar_at(x * 2).2;
        }
    }
    Ok(image)
}

fn gradient(width: u32, height: u32, index: u32) -> BufferResult<PlanarImage> {
    let mut image = PlanarImage::new(width, height)?;
    let w = width as usize;
    let luma = image.y_mut();
    for y in 0..height as usize {
        for x in 0..w {
            luma[y * w + x] = (x + y + index as usize) as u8;
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_first_column_is_white() {
        let image = Pattern::Bars.render(14, 2, 0).unwrap();
        assert_eq!(image.y()[0], 235);
        assert_eq!(image.u()[0], 128);
        assert_eq!(image.v()[0], 128);
    }

    #[test]
    fn test_bars_scroll_with_index() {
        let first = Pattern::Bars.render(14, 2, 0).unwrap();
        let second = Pattern::Bars.render(14, 2, 1).unwrap();
        // Scrolling by one pixel moves column 1 into column 0.
        assert_eq!(second.y()[0], first.y()[1]);
        assert_ne!(first.y(), second.y());
    }

    #[test]
    fn test_gradient_is_diagonal_and_drifts() {
        let image = Pattern::Gradient.render(4, 4, 0).unwrap();
        assert_eq!(image.y()[0], 0);
        assert_eq!(image.y()[5], 2);
        assert!(image.u().iter().all(|&b| b == 128));

        let drifted = Pattern::Gradient.render(4, 4, 3).unwrap();
        assert_eq!(drifted.y()[0], 3);
    }

    #[test]
    fn test_gradient_wraps_at_256() {
        let image = Pattern::Gradient.render(300, 2, 0).unwrap();
        assert_eq!(image.y()[255], 255);
        assert_eq!(image.y()[256], 0);
    }
}
