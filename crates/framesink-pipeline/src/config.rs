//! Sink configuration and the finished-recording summary.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use framesink_writer::{validate_dimensions, DEFAULT_FPS};

use crate::error::SinkError;
use crate::PipelineResult;

/// Configuration for a sink pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Output file path.
    pub output_path: PathBuf,

    /// Output frame width in pixels (positive and even).
    pub width: u32,

    /// Output frame height in pixels (positive and even).
    pub height: u32,

    /// Frame rate written into the stream header (default: 30).
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

impl SinkConfig {
    /// Configuration with the default frame rate.
    pub fn new<P: Into<PathBuf>>(output_path: P, width: u32, height: u32) -> Self {
        Self {
            output_path: output_path.into(),
            width,
            height,
            fps: DEFAULT_FPS,
        }
    }

    /// Check the configuration before any resource exists.
    ///
    /// Uses the same dimension predicate as the writer, so a pipeline that
    /// constructs cannot later fail to open its file over geometry.
    pub fn validate(&self) -> PipelineResult<()> {
        if validate_dimensions(self.width, self.height).is_err() {
            return Err(SinkError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.fps == 0 {
            return Err(SinkError::InvalidFrameRate { fps: self.fps });
        }
        Ok(())
    }
}

/// What a finished recording produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingSummary {
    /// Frames accepted onto the queue.
    pub frames_enqueued: u64,

    /// Frames converted to planar.
    pub frames_converted: u64,

    /// Frames dropped because their conversion failed.
    pub frames_dropped: u64,

    /// Frames written to the output file.
    pub frames_written: u64,

    /// Total bytes written, header and markers included.
    pub bytes_written: u64,
}
