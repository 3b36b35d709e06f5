//! Error taxonomy for recording runs

use crate::session::SessionState;
use crate::types::{PixelFormat, PolarAngle};
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by an encoding collaborator
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder process failed to start: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("encoder process exited with {status}: {stderr}")]
    ProcessExit { status: String, stderr: String },

    #[error("unsupported encoder selection: {0}")]
    Unsupported(String),

    #[error("sink is not open")]
    NotOpen,
}

/// Error raised by any stage of a recording run
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed frame: {bytes_filled} bytes filled of {capacity} available, need at least {min}")]
    MalformedFrame {
        bytes_filled: usize,
        capacity: usize,
        min: usize,
    },

    #[error("empty plane for angle {angle}")]
    EmptyPlane { angle: PolarAngle },

    #[error("unsupported pixel format {format:?}")]
    UnsupportedPixelFormat { format: PixelFormat },

    #[error("dimension mismatch on {angle} stream: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        angle: PolarAngle,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("cannot {operation} {angle} stream in state {state:?}")]
    InvalidSessionState {
        angle: PolarAngle,
        state: SessionState,
        operation: &'static str,
    },

    #[error("failed to open {angle} stream: {reason}")]
    SessionOpenError {
        angle: PolarAngle,
        reason: String,
        #[source]
        source: Option<SinkError>,
    },

    #[error("failed to append frame to {angle} stream: {source}")]
    Encode {
        angle: PolarAngle,
        #[source]
        source: SinkError,
    },

    #[error("failed to finalize {angle} stream: {source}")]
    Finalize {
        angle: PolarAngle,
        #[source]
        source: SinkError,
    },

    #[error("no frames to record")]
    NoFrames,

    #[error("frame source failed: {0}")]
    Acquisition(#[source] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Terminal classification of a [`RecordError`]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedFrame = 1,
    EmptyPlane = 2,
    UnsupportedPixelFormat = 3,
    DimensionMismatch = 4,
    InvalidSessionState = 5,
    SessionOpen = 6,
    Encode = 7,
    Finalize = 8,
    NoFrames = 9,
    Acquisition = 10,
    Config = 11,
}

impl RecordError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::MalformedFrame { .. } => ErrorKind::MalformedFrame,
            RecordError::EmptyPlane { .. } => ErrorKind::EmptyPlane,
            RecordError::UnsupportedPixelFormat { .. } => ErrorKind::UnsupportedPixelFormat,
            RecordError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            RecordError::InvalidSessionState { .. } => ErrorKind::InvalidSessionState,
            RecordError::SessionOpenError { .. } => ErrorKind::SessionOpen,
            RecordError::Encode { .. } => ErrorKind::Encode,
            RecordError::Finalize { .. } => ErrorKind::Finalize,
            RecordError::NoFrames => ErrorKind::NoFrames,
            RecordError::Acquisition(_) => ErrorKind::Acquisition,
            RecordError::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T, E = RecordError> = std::result::Result<T, E>;
