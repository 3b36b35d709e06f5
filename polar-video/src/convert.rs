//! Plane to encoder pixel format conversion

use crate::error::{RecordError, Result};
use crate::frame::{ChannelPlane, EncoderImage};
use crate::pool::BufferPool;
use crate::types::PixelFormat;
use bytemuck::{Pod, Zeroable};
use std::sync::Arc;

/// Packed RGB pixel
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Packed BGR pixel
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Bgr8 {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl From<u8> for Rgb8 {
    fn from(v: u8) -> Self {
        Rgb8 { r: v, g: v, b: v }
    }
}

impl From<u8> for Bgr8 {
    fn from(v: u8) -> Self {
        Bgr8 { b: v, g: v, r: v }
    }
}

/// Converts a single-channel plane into an encoder input image
pub trait PixelConverter: Send + Sync {
    fn to_encoder_format(&self, plane: &ChannelPlane, format: PixelFormat) -> Result<EncoderImage>;

    /// Give an image's storage back once the encoder is done with it
    fn recycle(&self, _image: EncoderImage) {}
}

/// Grayscale to 3-channel expansion, replicating intensity into every channel
pub struct GrayToColor {
    pool: Arc<BufferPool>,
}

impl GrayToColor {
    pub fn new(pool: Arc<BufferPool>) -> Self {
        Self { pool }
    }
}

impl Default for GrayToColor {
    fn default() -> Self {
        Self::new(Arc::new(BufferPool::default()))
    }
}

impl PixelConverter for GrayToColor {
    fn to_encoder_format(&self, plane: &ChannelPlane, format: PixelFormat) -> Result<EncoderImage> {
        if plane.is_empty() {
            return Err(RecordError::EmptyPlane { angle: plane.angle });
        }

        let size = format.frame_size(plane.width, plane.height);
        let mut data = self.pool.acquire(size);
        data.resize(size, 0);

        match format {
            PixelFormat::Rgb8 => expand::<Rgb8>(&plane.data, &mut data),
            PixelFormat::Bgr8 => expand::<Bgr8>(&plane.data, &mut data),
            PixelFormat::Mono8 => {
                self.pool.release(data);
                return Err(RecordError::UnsupportedPixelFormat { format });
            }
        }

        Ok(EncoderImage {
            angle: plane.angle,
            width: plane.width,
            height: plane.height,
            format,
            data,
        })
    }

    fn recycle(&self, image: EncoderImage) {
        self.pool.release(image.data);
    }
}

fn expand<P: Pod + From<u8>>(src: &[u8], dst: &mut [u8]) {
    let pixels: &mut [P] = bytemuck::cast_slice_mut(dst);
    for (px, &v) in pixels.iter_mut().zip(src) {
        *px = P::from(v);
    }
}

/// Reduce a plane by an integer factor, keeping the top-left sample of each block
///
/// The output is drawn from `pool` and the source buffer returned to it. A
/// factor of 0 or 1 returns the plane unchanged.
pub fn downscale_plane(plane: ChannelPlane, factor: u32, pool: &BufferPool) -> ChannelPlane {
    if factor <= 1 {
        return plane;
    }

    let width = plane.width as usize;
    let factor_usize = factor as usize;
    let new_w = plane.width / factor;
    let new_h = plane.height / factor;
    let len = new_w as usize * new_h as usize;

    let mut output = pool.acquire(len);
    output.resize(len, 0);

    for y in 0..new_h as usize {
        let row = &plane.data[(y * factor_usize) * width..];
        for (x, out) in output[y * new_w as usize..(y + 1) * new_w as usize]
            .iter_mut()
            .enumerate()
        {
            *out = row[x * factor_usize];
        }
    }

    let populated = plane.populated.min(len);
    let angle = plane.angle;
    pool.release(plane.data);

    ChannelPlane {
        angle,
        width: new_w,
        height: new_h,
        populated,
        data: output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PolarAngle;

    fn plane(width: u32, height: u32) -> ChannelPlane {
        let mut plane = ChannelPlane::new(PolarAngle::Deg45, width, height);
        for (i, byte) in plane.data.iter_mut().enumerate() {
            *byte = (i * 13 % 256) as u8;
        }
        plane.populated = plane.len();
        plane
    }

    #[test]
    fn test_gray_to_rgb_replicates() {
        let converter = GrayToColor::default();
        let src = plane(4, 3);

        let image = converter.to_encoder_format(&src, PixelFormat::Rgb8).unwrap();
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.data.len(), 4 * 3 * 3);
        assert_eq!(image.angle, PolarAngle::Deg45);

        for (i, px) in image.data.chunks_exact(3).enumerate() {
            assert_eq!(px, &[src.data[i]; 3][..]);
        }
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let converter = GrayToColor::default();
        let src = plane(8, 8);

        let a = converter.to_encoder_format(&src, PixelFormat::Bgr8).unwrap();
        converter.recycle(a.clone());
        let b = converter.to_encoder_format(&src, PixelFormat::Bgr8).unwrap();

        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_empty_plane_rejected() {
        let converter = GrayToColor::default();
        let empty = ChannelPlane::new(PolarAngle::Deg0, 0, 0);

        assert!(matches!(
            converter.to_encoder_format(&empty, PixelFormat::Rgb8),
            Err(RecordError::EmptyPlane {
                angle: PolarAngle::Deg0
            })
        ));
    }

    #[test]
    fn test_mono_target_rejected() {
        let converter = GrayToColor::default();

        assert!(matches!(
            converter.to_encoder_format(&plane(2, 2), PixelFormat::Mono8),
            Err(RecordError::UnsupportedPixelFormat { .. })
        ));
    }

    #[test]
    fn test_downscale_plane() {
        let pool = BufferPool::default();
        let src = plane(4, 4);
        let small = downscale_plane(src.clone(), 2, &pool);

        assert_eq!((small.width, small.height), (2, 2));
        assert_eq!(small.data, vec![src.data[0], src.data[2], src.data[8], src.data[10]]);
        assert_eq!(small.angle, PolarAngle::Deg45);

        let same = downscale_plane(src.clone(), 1, &pool);
        assert_eq!(same, src);
    }

    #[test]
    fn test_downscale_recycles_buffers() {
        let pool = BufferPool::new(4);

        let first = downscale_plane(plane(8, 8), 2, &pool);
        assert_eq!(pool.stats().allocations, 1);
        assert_eq!(pool.stats().idle, 1);

        pool.release(first.data);
        for _ in 0..3 {
            let small = downscale_plane(plane(8, 8), 2, &pool);
            pool.release(small.data);
        }

        let stats = pool.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.reuses, 3);
    }
}
