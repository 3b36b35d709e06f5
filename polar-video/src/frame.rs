//! Owned frame, plane and encoder image buffers

use crate::types::{PixelFormat, PolarAngle};
use std::fmt;

/// One captured raw frame with interleaved polarization samples
///
/// `bytes_filled` is the payload size reported by the acquisition source and
/// may be smaller than the backing buffer.
#[derive(Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    bytes_filled: usize,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Wrap a buffer whose whole length is payload
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        let bytes_filled = data.len();
        Self {
            width,
            height,
            bytes_filled,
            data,
        }
    }

    /// Wrap a buffer of which only the first `bytes_filled` bytes are payload
    pub fn with_filled(width: u32, height: u32, data: Vec<u8>, bytes_filled: usize) -> Self {
        Self {
            width,
            height,
            bytes_filled,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size_filled(&self) -> usize {
        self.bytes_filled
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes_filled", &self.bytes_filled)
            .field("capacity", &self.data.len())
            .finish()
    }
}

/// Single-channel image extracted for one polarization angle
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelPlane {
    pub angle: PolarAngle,
    pub width: u32,
    pub height: u32,
    /// Pixels written by demultiplexing; the rest of `data` is zero
    pub populated: usize,
    pub data: Vec<u8>,
}

impl ChannelPlane {
    /// Zeroed plane of `width * height` pixels
    pub fn new(angle: PolarAngle, width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self::from_buffer(angle, width, height, vec![0u8; len])
    }

    /// Reuse `buffer` as backing storage, resized and zeroed to the plane size
    pub fn from_buffer(angle: PolarAngle, width: u32, height: u32, mut buffer: Vec<u8>) -> Self {
        let len = width as usize * height as usize;
        buffer.clear();
        buffer.resize(len, 0);

        Self {
            angle,
            width,
            height,
            populated: 0,
            data: buffer,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for ChannelPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelPlane")
            .field("angle", &self.angle)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("populated", &self.populated)
            .finish()
    }
}

/// Packed multi-channel image ready to hand to an encoder
#[derive(Clone, PartialEq, Eq)]
pub struct EncoderImage {
    pub angle: PolarAngle,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl EncoderImage {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Debug for EncoderImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderImage")
            .field("angle", &self.angle)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}
