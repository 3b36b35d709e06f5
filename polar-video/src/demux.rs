//! Split interleaved polarization frames into per-angle planes
//!
//! Source layout is `A0 A45 A90 A135 A0 A45 ...`, one byte per sample. Each
//! output plane receives the samples of one angle in pixel order.
//!
//! Uses an SSSE3 byte shuffle when available, 4 pixels (16 source bytes) per
//! iteration, with a scalar fallback that produces identical output.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::error::{RecordError, Result};
use crate::frame::{ChannelPlane, FrameBuffer};
use crate::pool::BufferPool;
use crate::types::{AngleMap, PolarAngle, ANGLE_COUNT};
use std::sync::Arc;

/// Bytes in one interleaved unit
pub const UNIT_STRIDE: usize = ANGLE_COUNT;

/// Demultiplexer for the `0°/45°/90°/135°` Mono8 interleaved layout
pub struct ChannelDemultiplexer {
    pool: Arc<BufferPool>,
}

impl ChannelDemultiplexer {
    pub fn new(pool: Arc<BufferPool>) -> Self {
        Self { pool }
    }

    /// Split `frame` into four planes of `width * height` pixels
    ///
    /// Only complete interleaved units inside `size_filled()` are read. A
    /// trailing partial unit is ignored. Planes never receive more than
    /// `width * height` pixels.
    pub fn demultiplex(&self, frame: &FrameBuffer) -> Result<AngleMap<ChannelPlane>> {
        validate_frame(frame)?;

        let filled = frame.size_filled();
        let plane_len = frame.pixel_count();
        let units = (filled / UNIT_STRIDE).min(plane_len);

        let mut planes = AngleMap::from_fn(|angle| {
            ChannelPlane::from_buffer(
                angle,
                frame.width(),
                frame.height(),
                self.pool.acquire(plane_len),
            )
        });

        {
            let [p0, p45, p90, p135] = planes.values_mut() else {
                unreachable!("angle map always holds four planes")
            };
            deinterleave(
                &frame.data()[..units * UNIT_STRIDE],
                &mut p0.data[..units],
                &mut p45.data[..units],
                &mut p90.data[..units],
                &mut p135.data[..units],
            );
        }

        for (_, plane) in planes.iter_mut() {
            plane.populated = units;
        }

        log::trace!(
            "demultiplexed {}x{} frame: {} of {} bytes, {} units",
            frame.width(),
            frame.height(),
            filled,
            frame.data().len(),
            units
        );

        Ok(planes)
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Return a plane's storage to the shared pool
    pub fn recycle(&self, plane: ChannelPlane) {
        self.pool.release(plane.data);
    }
}

impl Default for ChannelDemultiplexer {
    fn default() -> Self {
        Self::new(Arc::new(BufferPool::default()))
    }
}

/// Check that `frame` holds at least one complete interleaved unit
pub fn validate_frame(frame: &FrameBuffer) -> Result<()> {
    let filled = frame.size_filled();
    if filled < UNIT_STRIDE || filled > frame.data().len() {
        return Err(RecordError::MalformedFrame {
            bytes_filled: filled,
            capacity: frame.data().len(),
            min: UNIT_STRIDE,
        });
    }
    Ok(())
}

/// Deinterleave `input` into four equally sized planes
///
/// `input.len()` must equal `4 * out0.len()` and all planes the same length.
pub fn deinterleave(
    input: &[u8],
    out0: &mut [u8],
    out45: &mut [u8],
    out90: &mut [u8],
    out135: &mut [u8],
) {
    let pixels = out0.len();
    assert_eq!(input.len(), pixels * UNIT_STRIDE, "input must hold whole units");
    assert!(
        out45.len() == pixels && out90.len() == pixels && out135.len() == pixels,
        "planes must be the same length"
    );

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("ssse3") {
            unsafe {
                deinterleave_ssse3(input, out0, out45, out90, out135);
            }
            return;
        }
    }

    deinterleave_scalar(input, out0, out45, out90, out135);
}

/// Deinterleave using SSSE3 `pshufb`
///
/// # Safety
/// Requires SSSE3 CPU support. Slice lengths must satisfy the contract of
/// [`deinterleave`].
#[target_feature(enable = "ssse3")]
#[cfg(target_arch = "x86_64")]
pub unsafe fn deinterleave_ssse3(
    input: &[u8],
    out0: &mut [u8],
    out45: &mut [u8],
    out90: &mut [u8],
    out135: &mut [u8],
) {
    // Gather byte k of each 4-byte unit into lane group k:
    // A0 B0 C0 D0 | A1 B1 C1 D1 | ... -> A0 A1 A2 A3 | B0 B1 B2 B3 | ...
    let gather = _mm_setr_epi8(0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15);

    let pixels = out0.len();
    let blocks = pixels / 4;
    let mut lanes = [0u8; 16];

    for block in 0..blocks {
        let src = _mm_loadu_si128(input.as_ptr().add(block * 16) as *const __m128i);
        let shuffled = _mm_shuffle_epi8(src, gather);
        _mm_storeu_si128(lanes.as_mut_ptr() as *mut __m128i, shuffled);

        let dst = block * 4;
        out0[dst..dst + 4].copy_from_slice(&lanes[0..4]);
        out45[dst..dst + 4].copy_from_slice(&lanes[4..8]);
        out90[dst..dst + 4].copy_from_slice(&lanes[8..12]);
        out135[dst..dst + 4].copy_from_slice(&lanes[12..16]);
    }

    let done = blocks * 4;
    deinterleave_scalar(
        &input[done * UNIT_STRIDE..],
        &mut out0[done..],
        &mut out45[done..],
        &mut out90[done..],
        &mut out135[done..],
    );
}

/// Scalar fallback implementation (portable, slower)
fn deinterleave_scalar(
    input: &[u8],
    out0: &mut [u8],
    out45: &mut [u8],
    out90: &mut [u8],
    out135: &mut [u8],
) {
    for (i, unit) in input.chunks_exact(UNIT_STRIDE).enumerate() {
        out0[i] = unit[PolarAngle::Deg0.offset()];
        out45[i] = unit[PolarAngle::Deg45.offset()];
        out90[i] = unit[PolarAngle::Deg90.offset()];
        out135[i] = unit[PolarAngle::Deg135.offset()];
    }
}
