//! Progress side-channel for recording runs
//!
//! Events are delivered with `try_send` on a bounded channel; a slow or
//! absent observer drops events instead of stalling the encoders.

use crate::error::ErrorKind;
use crate::types::PolarAngle;
use std::path::PathBuf;

/// Capacity of the observer channel returned by `RecordingPipeline::subscribe`
pub const EVENT_QUEUE_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordingEvent {
    /// All four streams are open
    Started {
        width: u32,
        height: u32,
        frame_rate: f64,
        outputs: Vec<PathBuf>,
    },
    /// Frame `index` (zero-based) reached all four streams
    FrameRecorded { index: u64 },
    SessionClosed { angle: PolarAngle, frames: u64 },
    Finished { frames: u64 },
    Failed { kind: ErrorKind, message: String },
}
