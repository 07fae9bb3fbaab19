//! Synthetic-source frame recorder.
//!
//! Generates test-pattern frames, wraps them in refcounted frame buffers,
//! and runs them through a sink pipeline into a raw planar frame file.

mod pattern;

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::info;

use framesink_buffer::{FrameBuffer, Rotation, Transform};
use framesink_pipeline::{SinkConfig, SinkPipeline};

use crate::pattern::Pattern;

/// Record synthetic frames to a raw planar frame file.
#[derive(Debug, Parser)]
#[command(name = "framesink", version, about)]
struct Args {
    /// Output file path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Frame width in pixels (must be even).
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels (must be even).
    #[arg(long)]
    height: Option<u32>,

    /// Frame rate written into the stream header.
    #[arg(long)]
    fps: Option<u32>,

    /// Number of frames to record.
    #[arg(short = 'n', long, default_value_t = 90)]
    frames: u32,

    /// Test pattern to generate.
    #[arg(long, value_enum, default_value_t = Pattern::Bars)]
    pattern: Pattern,

    /// Source rotation in degrees (0, 90, 180 or 270).
    #[arg(long, default_value_t = 0)]
    rotation: i32,

    /// JSON sink configuration file. Command-line flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Merge the config file (if any) with command-line overrides.
    fn sink_config(&self) -> anyhow::Result<SinkConfig> {
        let base = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                serde_json::from_str::<SinkConfig>(&text)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => SinkConfig::new("recording.y4m", 640, 480),
        };
        Ok(SinkConfig {
            output_path: self.output.clone().unwrap_or(base.output_path),
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            fps: self.fps.unwrap_or(base.fps),
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let rotation = Rotation::from_degrees(args.rotation)
        .ok_or_else(|| anyhow!("rotation must be one of 0, 90, 180, 270"))?;
    let config = args.sink_config()?;

    info!(
        path = %config.output_path.display(),
        width = config.width,
        height = config.height,
        fps = config.fps,
        frames = args.frames,
        "Recording synthetic frames"
    );

    let mut pipeline = SinkPipeline::new(config).context("invalid sink configuration")?;
    let sender = pipeline.start(None).context("failed to start sink pipeline")?;

    // Frames are generated in the source orientation: a rotated source is
    // stored sideways and comes out upright in the file.
    let config = pipeline.config();
    let (source_width, source_height) = if rotation.swaps_dimensions() {
        (config.height, config.width)
    } else {
        (config.width, config.height)
    };

    for index in 0..args.frames {
        let image = args
            .pattern
            .render(source_width, source_height, index)
            .context("failed to render frame")?;
        let frame = FrameBuffer::from_planar(image)
            .with_transform(Transform::IDENTITY.rotated(rotation));
        sender.send(&frame)?;
    }

    let summary = pipeline.stop().context("failed to finish recording")?;
    info!(
        written = summary.frames_written,
        dropped = summary.frames_dropped,
        bytes = summary.bytes_written,
        "Recording complete"
    );
    println!(
        "Wrote {} frames ({} bytes) to {}",
        summary.frames_written,
        summary.bytes_written,
        pipeline.config().output_path.display()
    );

    Ok(())
}
