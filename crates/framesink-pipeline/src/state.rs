//! Pipeline state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle of a sink pipeline.
///
/// States only move forward; a stopped pipeline is not restartable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineState {
    /// Configuration validated; no worker thread, no output file.
    #[default]
    Created,

    /// Worker consuming the queue in arrival order.
    Running,

    /// Stop requested; frames already queued are still being converted.
    Draining,

    /// Worker exited and the output file is closed.
    Stopped,
}

impl PipelineState {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }

    /// Whether new frames are accepted.
    pub fn accepts_frames(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether the pipeline has finished.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}
