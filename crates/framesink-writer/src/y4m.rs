//! YUV4MPEG2 stream writer.
//!
//! One stream header followed by length-delimited raw planar frames:
//! `YUV4MPEG2 C420 W<w> H<h> Ip F<fps>:1 A1:1`, then `FRAME\n` plus
//! `w * h * 3/2` payload bytes per frame. Standard playback tools accept
//! the stream directly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::WriterError;
use crate::WriterResult;

/// Marker preceding every frame payload.
pub const FRAME_MARKER: &[u8] = b"FRAME\n";

/// Frame dimensions accepted by the stream: positive and even on both axes,
/// so chroma planes cover the frame without partial rows.
pub fn validate_dimensions(width: u32, height: u32) -> WriterResult<()> {
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(WriterError::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Writes a planar frame stream to an underlying sink.
///
/// The header goes out exactly once, when the writer is constructed. Frames
/// are appended verbatim behind their marker; nothing is buffered beyond
/// what the sink itself buffers.
pub struct Y4mWriter<W: Write> {
    sink: W,
    width: u32,
    height: u32,
    frame_size: usize,
    frames_written: u64,
    bytes_written: u64,
    closed: bool,
}

impl Y4mWriter<BufWriter<File>> {
    /// Create a frame file at `path` and write the stream header.
    ///
    /// Dimensions are checked before the file is touched.
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        fps: u32,
    ) -> WriterResult<Self> {
        validate_dimensions(width, height)?;
        let file = File::create(path.as_ref())?;
        let writer = Self::from_writer(BufWriter::new(file), width, height, fps)?;
        debug!(
            path = %path.as_ref().display(),
            width,
            height,
            fps,
            "Created frame file"
        );
        Ok(writer)
    }
}

impl<W: Write> Y4mWriter<W> {
    /// Wrap an open sink and write the stream header.
    pub fn from_writer(mut sink: W, width: u32, height: u32, fps: u32) -> WriterResult<Self> {
        validate_dimensions(width, height)?;
        let header = format!(
            "YUV4MPEG2 C420 W{} H{} Ip F{}:1 A1:1\n",
            width, height, fps
        );
        sink.write_all(header.as_bytes())?;
        Ok(Self {
            sink,
            width,
            height,
            frame_size: width as usize * height as usize * 3 / 2,
            frames_written: 0,
            bytes_written: header.len() as u64,
            closed: false,
        })
    }

    /// Append one frame payload behind its marker.
    ///
    /// The payload must be exactly `width * height * 3/2` bytes of packed
    /// planar pixels.
    pub fn append_frame(&mut self, frame: &[u8]) -> WriterResult<()> {
        if self.closed {
            return Err(WriterError::Closed);
        }
        if frame.len() != self.frame_size {
            return Err(WriterError::FrameSize {
                expected: self.frame_size,
                actual: frame.len(),
            });
        }
        self.sink.write_all(FRAME_MARKER)?;
        self.sink.write_all(frame)?;
        self.frames_written += 1;
        self.bytes_written += (FRAME_MARKER.len() + frame.len()) as u64;
        Ok(())
    }

    /// Flush the stream and mark the writer closed. Further calls are no-ops.
    pub fn close(&mut self) -> WriterResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.flush()?;
        debug!(
            frames = self.frames_written,
            bytes = self.bytes_written,
            "Closed frame file"
        );
        Ok(())
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Payload size each frame must have.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Frames appended so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Bytes written so far, header and markers included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Whether the writer has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }
}

impl<W: Write> Drop for Y4mWriter<W> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                warn!("Failed to flush frame file on drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bytes_exact() {
        let writer = Y4mWriter::from_writer(Vec::new(), 4, 4, 30).unwrap();
        assert_eq!(writer.get_ref().as_slice(), b"YUV4MPEG2 C420 W4 H4 Ip F30:1 A1:1\n");
        assert_eq!(writer.bytes_written(), 35);
    }

    #[test]
    fn test_header_reflects_dimensions_and_rate() {
        let writer = Y4mWriter::from_writer(Vec::new(), 640, 480, 25).unwrap();
        assert_eq!(
            writer.get_ref().as_slice(),
            b"YUV4MPEG2 C420 W640 H480 Ip F25:1 A1:1\n"
        );
    }

    #[test]
    fn test_odd_or_zero_dimensions_rejected() {
        for (w, h) in [(3, 4), (4, 5), (0, 4), (4, 0), (5, 3)] {
            assert!(matches!(
                Y4mWriter::from_writer(Vec::new(), w, h, 30),
                Err(WriterError::InvalidDimensions { .. })
            ));
        }
        assert!(Y4mWriter::from_writer(Vec::new(), 4, 4, 30).is_ok());
    }

    #[test]
    fn test_frame_stream_layout() {
        let mut writer = Y4mWriter::from_writer(Vec::new(), 4, 4, 30).unwrap();
        writer.append_frame(&[1u8; 24]).unwrap();
        writer.append_frame(&[2u8; 24]).unwrap();
        writer.close().unwrap();

        let mut expected = b"YUV4MPEG2 C420 W4 H4 Ip F30:1 A1:1\n".to_vec();
        expected.extend_from_slice(b"FRAME\n");
        expected.extend_from_slice(&[1u8; 24]);
        expected.extend_from_slice(b"FRAME\n");
        expected.extend_from_slice(&[2u8; 24]);
        assert_eq!(writer.get_ref().as_slice(), expected.as_slice());
        assert_eq!(writer.frames_written(), 2);
        assert_eq!(writer.bytes_written(), expected.len() as u64);
    }

    #[test]
    fn test_frame_size_validated() {
        let mut writer = Y4mWriter::from_writer(Vec::new(), 4, 4, 30).unwrap();
        assert!(matches!(
            writer.append_frame(&[0u8; 23]),
            Err(WriterError::FrameSize {
                expected: 24,
                actual: 23
            })
        ));
        assert_eq!(writer.frames_written(), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut writer = Y4mWriter::from_writer(Vec::new(), 4, 4, 30).unwrap();
        writer.append_frame(&[0u8; 24]).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        assert!(writer.is_closed());
    }

    #[test]
    fn test_append_after_close_rejected() {
        let mut writer = Y4mWriter::from_writer(Vec::new(), 4, 4, 30).unwrap();
        writer.close().unwrap();
        assert!(matches!(
            writer.append_frame(&[0u8; 24]),
            Err(WriterError::Closed)
        ));
    }
}
