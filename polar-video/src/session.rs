//! Per-angle output stream lifecycle
//!
//! A [`StreamSession`] owns one encoding collaborator and enforces
//! `Created -> Opened -> Appending* -> Closed`.

use crate::error::{RecordError, Result, SinkError};
use crate::frame::EncoderImage;
use crate::types::{Codec, EncoderSelection, PolarAngle, VideoParams};
use std::path::Path;

/// Largest width or height accepted by the encoders
pub const MAX_DIMENSION: u32 = 16384;

/// Highest accepted frame rate
pub const MAX_FRAME_RATE: f64 = 1000.0;

/// Encoding collaborator consuming packed images for one output file
pub trait EncoderSink: Send {
    /// Start the encoder for `params` using `selection`
    fn open(&mut self, params: &VideoParams, selection: &EncoderSelection) -> Result<(), SinkError>;

    /// Encode one image; images arrive in presentation order
    fn append_image(&mut self, image: &EncoderImage) -> Result<(), SinkError>;

    /// Flush and finalize the output
    fn close(&mut self) -> Result<(), SinkError>;

    /// Destination this sink writes to
    fn output(&self) -> &Path;
}

impl<S: EncoderSink + ?Sized> EncoderSink for Box<S> {
    fn open(&mut self, params: &VideoParams, selection: &EncoderSelection) -> Result<(), SinkError> {
        (**self).open(params, selection)
    }

    fn append_image(&mut self, image: &EncoderImage) -> Result<(), SinkError> {
        (**self).append_image(image)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        (**self).close()
    }

    fn output(&self) -> &Path {
        (**self).output()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Opened,
    Appending,
    Closed,
}

impl SessionState {
    pub fn is_open(self) -> bool {
        matches!(self, SessionState::Opened | SessionState::Appending)
    }
}

/// One output video stream for a single polarization angle
pub struct StreamSession<S: EncoderSink> {
    angle: PolarAngle,
    params: VideoParams,
    selection: EncoderSelection,
    state: SessionState,
    frames_written: u64,
    sink: S,
}

impl<S: EncoderSink> StreamSession<S> {
    pub fn new(angle: PolarAngle, params: VideoParams, selection: EncoderSelection, sink: S) -> Self {
        Self {
            angle,
            params,
            selection,
            state: SessionState::Created,
            frames_written: 0,
            sink,
        }
    }

    pub fn angle(&self) -> PolarAngle {
        self.angle
    }

    pub fn params(&self) -> &VideoParams {
        &self.params
    }

    pub fn selection(&self) -> &EncoderSelection {
        &self.selection
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn output(&self) -> &Path {
        self.sink.output()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Validate parameters and start the encoder
    pub fn open(&mut self) -> Result<()> {
        if self.state != SessionState::Created {
            return Err(self.invalid_state("open"));
        }

        self.validate()?;

        self.sink
            .open(&self.params, &self.selection)
            .map_err(|e| RecordError::SessionOpenError {
                angle: self.angle,
                reason: format!("encoder for {} refused to start", self.sink.output().display()),
                source: Some(e),
            })?;

        self.state = SessionState::Opened;
        log::info!(
            "Opened {} stream {}x{} @ {} fps ({}) -> {}",
            self.angle,
            self.params.width,
            self.params.height,
            self.params.frame_rate,
            self.selection,
            self.sink.output().display()
        );

        Ok(())
    }

    /// Append one image in arrival order
    pub fn append_frame(&mut self, image: &EncoderImage) -> Result<()> {
        if !self.state.is_open() {
            return Err(self.invalid_state("append to"));
        }

        if image.format != self.selection.pixel_format {
            return Err(RecordError::UnsupportedPixelFormat {
                format: image.format,
            });
        }

        if image.dimensions() != (self.params.width, self.params.height) {
            return Err(RecordError::DimensionMismatch {
                angle: self.angle,
                expected: (self.params.width, self.params.height),
                actual: image.dimensions(),
            });
        }

        self.sink
            .append_image(image)
            .map_err(|source| RecordError::Encode {
                angle: self.angle,
                source,
            })?;

        self.state = SessionState::Appending;
        self.frames_written += 1;
        Ok(())
    }

    /// Finalize the output; not idempotent
    ///
    /// The session is `Closed` afterwards even if finalizing failed.
    pub fn close(&mut self) -> Result<()> {
        if !self.state.is_open() {
            return Err(self.invalid_state("close"));
        }

        self.state = SessionState::Closed;
        let result = self.sink.close().map_err(|source| RecordError::Finalize {
            angle: self.angle,
            source,
        });

        match &result {
            Ok(()) => log::info!(
                "Closed {} stream after {} frames",
                self.angle,
                self.frames_written
            ),
            Err(e) => log::error!("{}", e),
        }

        result
    }

    fn validate(&self) -> Result<()> {
        let VideoParams {
            width,
            height,
            frame_rate,
        } = self.params;

        let reason = if width == 0 || height == 0 {
            Some(format!("resolution {}x{} must be positive", width, height))
        } else if width > MAX_DIMENSION || height > MAX_DIMENSION {
            Some(format!(
                "resolution {}x{} exceeds {}",
                width, height, MAX_DIMENSION
            ))
        } else if self.selection.codec == Codec::H264 && (width % 2 != 0 || height % 2 != 0) {
            Some(format!("H.264 needs even dimensions, got {}x{}", width, height))
        } else if !frame_rate.is_finite() || frame_rate <= 0.0 || frame_rate > MAX_FRAME_RATE {
            Some(format!("frame rate {} is out of range", frame_rate))
        } else if !self.selection.is_supported() {
            Some(format!("unsupported codec/container combination {}", self.selection))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(RecordError::SessionOpenError {
                angle: self.angle,
                reason,
                source: None,
            }),
            None => Ok(()),
        }
    }

    fn invalid_state(&self, operation: &'static str) -> RecordError {
        RecordError::InvalidSessionState {
            angle: self.angle,
            state: self.state,
            operation,
        }
    }
}

impl<S: EncoderSink> Drop for StreamSession<S> {
    fn drop(&mut self) {
        if self.state.is_open() {
            log::warn!("{} stream dropped while open, finalizing", self.angle);
            let _ = self.close();
        }
    }
}
