//! Polarization camera recording pipeline
//!
//! Splits 4-way interleaved polarization frames into one plane per angle and
//! feeds each plane to its own video stream.
//!
//! Key pieces:
//! - SSSE3 deinterleave with a scalar fallback
//! - Pooled plane and image buffers to avoid per-frame allocation
//! - Session state machine guarding every encoder sink
//! - Optional parallel dispatch of the four appends

pub mod config;
pub mod convert;
pub mod demux;
pub mod error;
pub mod events;
pub mod frame;
pub mod pipeline;
pub mod pool;
pub mod session;
pub mod source;
pub mod types;

pub use config::*;
pub use convert::*;
pub use demux::*;
pub use error::*;
pub use events::*;
pub use frame::*;
pub use pipeline::*;
pub use pool::*;
pub use session::*;
pub use source::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_offsets() {
        assert_eq!(PolarAngle::Deg0.offset(), 0);
        assert_eq!(PolarAngle::Deg135.offset(), 3);
        assert_eq!(UNIT_STRIDE, 4);
    }
}
