//! Polarization and video data types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::path::Path;

/// Number of samples packed into one interleaved polarization unit
pub const ANGLE_COUNT: usize = 4;

/// Polarization angle of one demultiplexed channel
///
/// The discriminant is the byte offset of the angle's sample inside an
/// interleaved unit.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolarAngle {
    Deg0 = 0,
    Deg45 = 1,
    Deg90 = 2,
    Deg135 = 3,
}

impl PolarAngle {
    pub const ALL: [PolarAngle; ANGLE_COUNT] = [
        PolarAngle::Deg0,
        PolarAngle::Deg45,
        PolarAngle::Deg90,
        PolarAngle::Deg135,
    ];

    /// Byte offset of this angle within an interleaved unit
    pub fn offset(self) -> usize {
        self as usize
    }

    pub fn from_offset(offset: usize) -> Option<Self> {
        Self::ALL.get(offset).copied()
    }

    pub fn degrees(self) -> u32 {
        self as u32 * 45
    }
}

impl fmt::Display for PolarAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Fixed four-slot collection keyed by polarization angle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AngleMap<T>([T; ANGLE_COUNT]);

impl<T> AngleMap<T> {
    pub fn new(slots: [T; ANGLE_COUNT]) -> Self {
        Self(slots)
    }

    /// Build a map by evaluating `f` once per angle, in offset order
    pub fn from_fn(mut f: impl FnMut(PolarAngle) -> T) -> Self {
        Self(PolarAngle::ALL.map(&mut f))
    }

    /// Build a map from a fallible constructor, stopping at the first error
    pub fn try_from_fn<E>(mut f: impl FnMut(PolarAngle) -> Result<T, E>) -> Result<Self, E> {
        let [a, b, c, d] = PolarAngle::ALL;
        Ok(Self([f(a)?, f(b)?, f(c)?, f(d)?]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PolarAngle, &T)> {
        PolarAngle::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PolarAngle, &mut T)> {
        PolarAngle::ALL.into_iter().zip(self.0.iter_mut())
    }

    pub fn values(&self) -> &[T] {
        &self.0
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.0
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> AngleMap<U> {
        AngleMap(self.0.map(f))
    }

    pub fn map_with_angle<U>(self, mut f: impl FnMut(PolarAngle, T) -> U) -> AngleMap<U> {
        let [a, b, c, d] = self.0;
        AngleMap([
            f(PolarAngle::Deg0, a),
            f(PolarAngle::Deg45, b),
            f(PolarAngle::Deg90, c),
            f(PolarAngle::Deg135, d),
        ])
    }

    pub fn into_inner(self) -> [T; ANGLE_COUNT] {
        self.0
    }
}

impl<T> Index<PolarAngle> for AngleMap<T> {
    type Output = T;

    fn index(&self, angle: PolarAngle) -> &T {
        &self.0[angle.offset()]
    }
}

impl<T> IndexMut<PolarAngle> for AngleMap<T> {
    fn index_mut(&mut self, angle: PolarAngle) -> &mut T {
        &mut self.0[angle.offset()]
    }
}

impl<T> IntoIterator for AngleMap<T> {
    type Item = (PolarAngle, T);
    type IntoIter = std::iter::Zip<std::array::IntoIter<PolarAngle, 4>, std::array::IntoIter<T, 4>>;

    fn into_iter(self) -> Self::IntoIter {
        PolarAngle::ALL.into_iter().zip(self.0)
    }
}

/// Pixel layout of a buffer handed between pipeline stages
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Mono8 = 0,
    Rgb8 = 1, // Packed RGB 24-bit
    #[default]
    Bgr8 = 2, // Packed BGR 24-bit
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Mono8 => 1,
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
        }
    }

    /// ffmpeg `-pix_fmt` name for raw input of this layout
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            PixelFormat::Mono8 => "gray",
            PixelFormat::Rgb8 => "rgb24",
            PixelFormat::Bgr8 => "bgr24",
        }
    }

    pub fn frame_size(self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }
}

/// Video codec used by an output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    H264,
    RawVideo,
}

/// Output container, normally chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Mp4,
    Mov,
    Avi,
    Raw,
}

impl Container {
    pub fn extension(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mov => "mov",
            Container::Avi => "avi",
            Container::Raw => "raw",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" => Some(Container::Mp4),
            "mov" => Some(Container::Mov),
            "avi" => Some(Container::Avi),
            "raw" => Some(Container::Raw),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Codec paired with this container when none is given explicitly
    pub fn default_codec(self) -> Codec {
        match self {
            Container::Raw => Codec::RawVideo,
            _ => Codec::H264,
        }
    }
}

/// Codec, container and input pixel format of one output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncoderSelection {
    pub codec: Codec,
    pub container: Container,
    pub pixel_format: PixelFormat,
}

impl EncoderSelection {
    /// H.264 in MPEG-4 fed with BGR8 frames
    pub fn h264_mp4_bgr8() -> Self {
        Self::default()
    }

    pub fn raw(pixel_format: PixelFormat) -> Self {
        Self {
            codec: Codec::RawVideo,
            container: Container::Raw,
            pixel_format,
        }
    }

    pub fn for_container(container: Container, pixel_format: PixelFormat) -> Self {
        Self {
            codec: container.default_codec(),
            container,
            pixel_format,
        }
    }

    /// Check whether the codec can be muxed into the container
    pub fn is_supported(&self) -> bool {
        let container_ok = matches!(
            (self.codec, self.container),
            (Codec::H264, Container::Mp4 | Container::Mov | Container::Avi)
                | (Codec::RawVideo, Container::Avi | Container::Raw)
        );

        container_ok && self.pixel_format.bytes_per_pixel() == 3
    }
}

impl fmt::Display for EncoderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{}/{:?}",
            self.codec,
            self.container.extension(),
            self.pixel_format
        )
    }
}

/// Resolution and rate of an output stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoParams {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

impl VideoParams {
    pub fn new(width: u32, height: u32, frame_rate: f64) -> Self {
        Self {
            width,
            height,
            frame_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_offsets() {
        for (k, angle) in PolarAngle::ALL.iter().enumerate() {
            assert_eq!(angle.offset(), k);
            assert_eq!(angle.degrees(), k as u32 * 45);
            assert_eq!(PolarAngle::from_offset(k), Some(*angle));
        }
        assert_eq!(PolarAngle::from_offset(4), None);
    }

    #[test]
    fn test_angle_map_indexing() {
        let mut map = AngleMap::from_fn(|angle| angle.degrees());
        assert_eq!(map[PolarAngle::Deg90], 90);

        map[PolarAngle::Deg135] = 7;
        let collected: Vec<_> = map.into_iter().collect();
        assert_eq!(collected[3], (PolarAngle::Deg135, 7));
    }

    #[test]
    fn test_container_from_path() {
        assert_eq!(
            Container::from_path(Path::new("out/video_0.MP4")),
            Some(Container::Mp4)
        );
        assert_eq!(Container::from_path(Path::new("video_45.raw")), Some(Container::Raw));
        assert_eq!(Container::from_path(Path::new("video")), None);
    }

    #[test]
    fn test_selection_support() {
        assert!(EncoderSelection::h264_mp4_bgr8().is_supported());
        assert!(EncoderSelection::raw(PixelFormat::Rgb8).is_supported());

        let bad = EncoderSelection {
            codec: Codec::H264,
            container: Container::Raw,
            pixel_format: PixelFormat::Bgr8,
        };
        assert!(!bad.is_supported());

        let mono = EncoderSelection::raw(PixelFormat::Mono8);
        assert!(!mono.is_supported());
    }
}
