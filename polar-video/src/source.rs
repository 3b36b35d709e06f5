//! Acquisition collaborators that yield interleaved frames

use crate::demux::UNIT_STRIDE;
use crate::error::{RecordError, Result};
use crate::frame::FrameBuffer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Ordered, finite producer of captured frames
pub trait FrameSource {
    /// Next frame, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>>;
}

impl<F: FrameSource + ?Sized> FrameSource for Box<F> {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        (**self).next_frame()
    }
}

/// Deterministic interleaved test pattern
///
/// Sample `k` of pixel `(x, y)` in frame `f` is `x + 2y + 64k + f`, wrapping.
/// Optional seeded noise is added on top.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    count: u64,
    produced: u64,
    noise: Option<(StdRng, u8)>,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, count: u64) -> Self {
        Self {
            width,
            height,
            count,
            produced: 0,
            noise: None,
        }
    }

    /// Add uniform noise in `0..=amplitude`, reproducible from `seed`
    pub fn with_noise(mut self, seed: u64, amplitude: u8) -> Self {
        self.noise = Some((StdRng::seed_from_u64(seed), amplitude));
        self
    }

    pub fn pattern_byte(&self, frame: u64, x: u32, y: u32, offset: usize) -> u8 {
        (x as u64 + 2 * y as u64 + 64 * offset as u64 + frame) as u8
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        if self.produced >= self.count {
            return Ok(None);
        }

        let pixels = self.width as usize * self.height as usize;
        let mut data = Vec::with_capacity(pixels * UNIT_STRIDE);
        for y in 0..self.height {
            for x in 0..self.width {
                for k in 0..UNIT_STRIDE {
                    data.push(self.pattern_byte(self.produced, x, y, k));
                }
            }
        }

        if let Some((rng, amplitude)) = &mut self.noise {
            let amplitude = *amplitude;
            for byte in &mut data {
                *byte = byte.wrapping_add(rng.gen_range(0..=amplitude));
            }
        }

        self.produced += 1;
        Ok(Some(FrameBuffer::new(self.width, self.height, data)))
    }
}

/// Frames read back-to-back from a raw interleaved capture stream
///
/// Each frame is `4 * width * height` bytes. A stream ending in the middle
/// of a frame is reported as an acquisition failure.
pub struct RawFileSource<R: Read> {
    reader: R,
    width: u32,
    height: u32,
    limit: Option<u64>,
    produced: u64,
}

impl RawFileSource<BufReader<File>> {
    pub fn open(path: &Path, width: u32, height: u32) -> Result<Self> {
        let file = File::open(path).map_err(RecordError::Acquisition)?;
        Ok(Self::new(BufReader::new(file), width, height))
    }
}

impl<R: Read> RawFileSource<R> {
    pub fn new(reader: R, width: u32, height: u32) -> Self {
        Self {
            reader,
            width,
            height,
            limit: None,
            produced: 0,
        }
    }

    /// Stop after `count` frames even if more data follows
    pub fn with_limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * UNIT_STRIDE
    }
}

impl<R: Read> FrameSource for RawFileSource<R> {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        if self.limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(None);
        }

        let size = self.frame_size();
        let mut data = vec![0u8; size];
        let mut filled = 0;

        while filled < size {
            match self.reader.read(&mut data[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RecordError::Acquisition(e)),
            }
        }

        if filled == 0 {
            return Ok(None);
        }

        if filled < size {
            return Err(RecordError::Acquisition(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "frame {} truncated: {} of {} bytes",
                    self.produced, filled, size
                ),
            )));
        }

        self.produced += 1;
        Ok(Some(FrameBuffer::new(self.width, self.height, data)))
    }
}
