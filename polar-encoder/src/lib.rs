//! Encoding collaborators for polarization recordings
//!
//! - [`FfmpegSink`]: pipes packed frames into an `ffmpeg` child process
//! - [`RawVideoSink`]: writes uncompressed frames straight to disk
//! - [`open_sinks`]: one sink per angle for a [`RecordingConfig`]

pub mod commands;
pub mod ffmpeg;
pub mod raw;

pub use commands::*;
pub use ffmpeg::*;
pub use raw::*;

use polar_video::{AngleMap, Container, EncoderSink, RecordingConfig};

/// Build the four unopened sinks a configuration asks for
///
/// The raw container is written directly; everything else goes through ffmpeg.
pub fn open_sinks(config: &RecordingConfig) -> AngleMap<Box<dyn EncoderSink>> {
    AngleMap::from_fn(|angle| {
        let output = config.output_path(angle);
        let sink: Box<dyn EncoderSink> = match config.output.container {
            Container::Raw => Box::new(RawVideoSink::new(output)),
            _ => Box::new(FfmpegSink::new(
                output,
                FfmpegOptions {
                    program: config.encoder.ffmpeg_path.clone(),
                    preset: config.encoder.preset.clone(),
                    crf: config.encoder.crf,
                },
            )),
        };
        sink
    })
}
