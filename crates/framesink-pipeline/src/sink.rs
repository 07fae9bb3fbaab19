//! Ordered frame sink pipeline.
//!
//! A dedicated worker thread drains an unbounded frame queue strictly in
//! arrival order, converting each view into owned planar pixels. Stopping is
//! a two-phase handshake: the stop task queues behind every pending frame,
//! the worker converts everything ahead of it and hands the frames back over
//! a one-shot channel, and the caller writes and closes the file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use framesink_buffer::{FrameBuffer, PlanarImage};
use framesink_convert::{aspect_crop, ConvertResult, FrameConverter, SamplerFactory};
use framesink_writer::{WriterError, Y4mWriter};

use crate::config::{RecordingSummary, SinkConfig};
use crate::error::SinkError;
use crate::state::PipelineState;
use crate::PipelineResult;

/// Work items consumed by the sink worker.
enum SinkTask {
    /// Convert this frame and keep it for the final drain.
    Frame(FrameBuffer),
    /// Convert nothing further; hand the converted frames back.
    Stop(Sender<DrainOutcome>),
}

/// What the worker accumulated by the time the stop task surfaced.
struct DrainOutcome {
    frames: Vec<PlanarImage>,
}

#[derive(Default)]
struct SinkCounters {
    enqueued: AtomicU64,
    converted: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time pipeline counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkStats {
    /// Frames accepted onto the queue.
    pub frames_enqueued: u64,

    /// Frames converted so far.
    pub frames_converted: u64,

    /// Frames dropped because their conversion failed.
    pub frames_dropped: u64,
}

/// Cloneable producer handle feeding a running pipeline.
///
/// Sending retains the frame and places it on the queue; it never blocks and
/// never converts on the caller's thread.
#[derive(Clone)]
pub struct FrameSender {
    sender: Sender<SinkTask>,
    state: Arc<RwLock<PipelineState>>,
    counters: Arc<SinkCounters>,
}

impl FrameSender {
    /// Retain `buffer` and enqueue it for conversion.
    ///
    /// Rejected with [`SinkError::NotRunning`] once draining has begun.
    pub fn send(&self, buffer: &FrameBuffer) -> PipelineResult<()> {
        // The state lock is held across the send so no frame can land
        // behind a stop task: accepted implies drained.
        let state = self.state.read();
        if !state.accepts_frames() {
            return Err(SinkError::NotRunning);
        }
        if self.sender.send(SinkTask::Frame(buffer.retain())).is_err() {
            return Err(SinkError::WorkerExited);
        }
        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Ordered, single-consumer frame sink.
///
/// Any number of producers may feed it; one worker thread converts frames in
/// arrival order. The output file is written when the pipeline stops: the
/// drained frames first, then the stream is flushed and closed, all on the
/// stopping thread.
pub struct SinkPipeline {
    config: SinkConfig,
    state: Arc<RwLock<PipelineState>>,
    counters: Arc<SinkCounters>,
    sender: Option<FrameSender>,
    worker: Option<JoinHandle<()>>,
    writer: Option<Y4mWriter<Box<dyn Write + Send>>>,
}

impl SinkPipeline {
    /// Build a pipeline in the `Created` state.
    ///
    /// The configuration is validated here; nothing is spawned or opened.
    pub fn new(config: SinkConfig) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: Arc::new(RwLock::new(PipelineState::Created)),
            counters: Arc::new(SinkCounters::default()),
            sender: None,
            worker: None,
            writer: None,
        })
    }

    /// Open the output file, write the stream header, and spawn the worker.
    ///
    /// When `sampler` is given, the factory runs on the worker thread so the
    /// GPU context it acquires lives where the converter lives. Returns a
    /// cloneable sender for producer threads.
    #[instrument(name = "sink_start", skip(self, sampler))]
    pub fn start(&mut self, sampler: Option<SamplerFactory>) -> PipelineResult<FrameSender> {
        // Rejected before the path is touched; creating the file first
        // would truncate a finished recording.
        if *self.state.read() != PipelineState::Created {
            return Err(SinkError::AlreadyStarted);
        }
        info!(
            path = %self.config.output_path.display(),
            width = self.config.width,
            height = self.config.height,
            fps = self.config.fps,
            "Starting sink pipeline"
        );
        let file = File::create(&self.config.output_path).map_err(WriterError::Io)?;
        self.start_with_output(Box::new(BufWriter::new(file)), sampler)
    }

    /// Start with an explicit output sink instead of the configured path.
    fn start_with_output(
        &mut self,
        sink: Box<dyn Write + Send>,
        sampler: Option<SamplerFactory>,
    ) -> PipelineResult<FrameSender> {
        if *self.state.read() != PipelineState::Created {
            return Err(SinkError::AlreadyStarted);
        }
        let writer =
            Y4mWriter::from_writer(sink, self.config.width, self.config.height, self.config.fps)?;

        let (sender, receiver) = crossbeam_channel::unbounded::<SinkTask>();
        let counters = Arc::clone(&self.counters);
        let (width, height) = (self.config.width, self.config.height);
        let handle = thread::spawn(move || {
            run_sink_worker(receiver, sampler, width, height, counters);
        });

        *self.state.write() = PipelineState::Running;
        let frame_sender = FrameSender {
            sender,
            state: Arc::clone(&self.state),
            counters: Arc::clone(&self.counters),
        };
        self.sender = Some(frame_sender.clone());
        self.worker = Some(handle);
        self.writer = Some(writer);
        debug!("Sink worker spawned");
        Ok(frame_sender)
    }

    /// Retain `buffer` and enqueue it for conversion, preserving arrival
    /// order across all producers.
    pub fn on_frame(&self, buffer: &FrameBuffer) -> PipelineResult<()> {
        match &self.sender {
            Some(sender) => sender.send(buffer),
            None => Err(SinkError::NotRunning),
        }
    }

    /// Drain the queue, write every converted frame, and close the file.
    ///
    /// Every frame accepted before this call is converted and written;
    /// frames offered during or after it are rejected with
    /// [`SinkError::NotRunning`].
    #[instrument(name = "sink_stop", skip(self))]
    pub fn stop(&mut self) -> PipelineResult<RecordingSummary> {
        if !self.state.read().accepts_frames() {
            return Err(SinkError::NotRunning);
        }
        info!("Stopping sink pipeline");
        *self.state.write() = PipelineState::Draining;
        let sender = match self.sender.take() {
            Some(sender) => sender,
            None => return Err(SinkError::NotRunning),
        };

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let handshake = sender.sender.send(SinkTask::Stop(done_tx));
        drop(sender);
        if handshake.is_err() {
            if let Some(worker) = self.worker.take() {
                let _ = worker.join();
            }
            *self.state.write() = PipelineState::Stopped;
            return Err(SinkError::WorkerExited);
        }

        let outcome = done_rx.recv();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        *self.state.write() = PipelineState::Stopped;
        let outcome = outcome.map_err(|_| SinkError::WorkerExited)?;

        let mut writer = match self.writer.take() {
            Some(writer) => writer,
            None => return Err(SinkError::WorkerExited),
        };
        for frame in &outcome.frames {
            writer.append_frame(frame.data())?;
        }
        writer.close()?;

        let summary = RecordingSummary {
            frames_enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            frames_converted: self.counters.converted.load(Ordering::Relaxed),
            frames_dropped: self.counters.dropped.load(Ordering::Relaxed),
            frames_written: writer.frames_written(),
            bytes_written: writer.bytes_written(),
        };
        info!(
            frames = summary.frames_written,
            dropped = summary.frames_dropped,
            bytes = summary.bytes_written,
            "Recording finished"
        );
        Ok(summary)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        *self.state.read()
    }

    /// Point-in-time counters.
    pub fn stats(&self) -> SinkStats {
        SinkStats {
            frames_enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            frames_converted: self.counters.converted.load(Ordering::Relaxed),
            frames_dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }
}

impl Drop for SinkPipeline {
    fn drop(&mut self) {
        if self.state.read().accepts_frames() {
            let _ = self.stop();
        }
    }
}

/// Worker loop: build the converter (and its GPU context, if any) on this
/// thread, then drain the queue in arrival order until the stop task
/// surfaces.
fn run_sink_worker(
    receiver: Receiver<SinkTask>,
    sampler: Option<SamplerFactory>,
    width: u32,
    height: u32,
    counters: Arc<SinkCounters>,
) {
    debug!("Sink worker started");

    let mut converter = match sampler {
        Some(factory) => match factory() {
            Ok(sampler) => FrameConverter::with_sampler(sampler),
            Err(e) => {
                // texture-backed frames will now fail per-frame and be dropped
                warn!("Sampler initialization failed: {}", e);
                FrameConverter::new()
            }
        },
        None => FrameConverter::new(),
    };

    let mut frames: Vec<PlanarImage> = Vec::new();
    while let Ok(task) = receiver.recv() {
        match task {
            SinkTask::Frame(buffer) => {
                match convert_frame(&mut converter, &buffer, width, height) {
                    Ok(frame) => {
                        counters.converted.fetch_add(1, Ordering::Relaxed);
                        frames.push(frame);
                    }
                    Err(e) => {
                        counters.dropped.fetch_add(1, Ordering::Relaxed);
                        warn!("Dropping frame after conversion failure: {}", e);
                    }
                }
                // the queue's reference goes away here
                drop(buffer);
            }
            SinkTask::Stop(done) => {
                debug!(frames = frames.len(), "Drain complete");
                if done.send(DrainOutcome { frames }).is_err() {
                    warn!("Stop handshake receiver vanished");
                }
                break;
            }
        }
    }

    debug!("Sink worker exited");
}

/// Convert one frame to the pipeline's output geometry: center-crop to the
/// output aspect ratio in rotated space, scale, and fold the rotation in.
fn convert_frame(
    converter: &mut FrameConverter,
    buffer: &FrameBuffer,
    out_width: u32,
    out_height: u32,
) -> ConvertResult<PlanarImage> {
    // aspect is judged on the dimensions a viewer would see
    let (crop_x, crop_y, crop_w, crop_h) = aspect_crop(
        buffer.rotated_width(),
        buffer.rotated_height(),
        out_width,
        out_height,
    );
    let view = if buffer.transform().rotation.swaps_dimensions() {
        // map the rotated-space window back onto the unrotated view
        buffer.crop_and_scale(crop_y, crop_x, crop_h, crop_w, out_height, out_width)?
    } else {
        buffer.crop_and_scale(crop_x, crop_y, crop_w, crop_h, out_width, out_height)?
    };
    converter.convert(&view)
}
