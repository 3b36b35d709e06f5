//! Encoder sink backed by an external `ffmpeg` process
//!
//! Packed frames are written to the child's stdin. Closing the sink closes
//! stdin, waits for the muxer to finish and checks the exit status.

use crate::commands::FfmpegCommandBuilder;
use polar_video::{EncoderImage, EncoderSelection, EncoderSink, SinkError, VideoParams};
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

/// Tuning passed through to the ffmpeg command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegOptions {
    pub program: String,
    pub preset: Option<String>,
    pub crf: Option<u8>,
}

impl Default for FfmpegOptions {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            preset: None,
            crf: None,
        }
    }
}

struct Running {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
}

pub struct FfmpegSink {
    output: PathBuf,
    options: FfmpegOptions,
    running: Option<Running>,
}

impl FfmpegSink {
    pub fn new(output: PathBuf, options: FfmpegOptions) -> Self {
        Self {
            output,
            options,
            running: None,
        }
    }

    /// Arguments the sink would launch ffmpeg with
    pub fn command_args(&self, params: &VideoParams, selection: &EncoderSelection) -> Vec<String> {
        FfmpegCommandBuilder::for_stream(
            self.output.to_string_lossy().into_owned(),
            params,
            selection,
        )
        .with_preset(self.options.preset.clone())
        .with_crf(self.options.crf)
        .build()
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.output.clone(),
            source,
        }
    }
}

impl EncoderSink for FfmpegSink {
    fn open(&mut self, params: &VideoParams, selection: &EncoderSelection) -> Result<(), SinkError> {
        if self.running.is_some() {
            return Err(SinkError::Unsupported("ffmpeg sink is already open".into()));
        }

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let args = self.command_args(params, selection);
        log::debug!("{} {}", self.options.program, args.join(" "));

        let mut child = Command::new(&self.options.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SinkError::Spawn)?;

        let stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SinkError::Unsupported("ffmpeg stdin unavailable".into()));
            }
        };

        // Drain stderr so a chatty encoder never blocks on a full pipe
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        self.running = Some(Running {
            child,
            stdin: BufWriter::new(stdin),
            stderr,
        });
        Ok(())
    }

    fn append_image(&mut self, image: &EncoderImage) -> Result<(), SinkError> {
        let running = self.running.as_mut().ok_or(SinkError::NotOpen)?;
        match running.stdin.write_all(&image.data) {
            Ok(()) => Ok(()),
            Err(e) => Err(SinkError::Io {
                path: self.output.clone(),
                source: e,
            }),
        }
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Running {
            mut child,
            mut stdin,
            stderr,
        } = self.running.take().ok_or(SinkError::NotOpen)?;

        let flushed = stdin.flush();
        drop(stdin);

        let status = child.wait().map_err(|e| self.io_error(e))?;
        let stderr = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(SinkError::ProcessExit {
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        flushed.map_err(|e| self.io_error(e))?;
        log::debug!("ffmpeg finished {}", self.output.display());
        Ok(())
    }

    fn output(&self) -> &Path {
        &self.output
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if let Some(mut running) = self.running.take() {
            log::warn!("ffmpeg for {} dropped while running", self.output.display());
            let _ = running.child.kill();
            let _ = running.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polar_video::{Container, PixelFormat, PolarAngle};

    fn image() -> EncoderImage {
        EncoderImage {
            angle: PolarAngle::Deg0,
            width: 2,
            height: 2,
            format: PixelFormat::Bgr8,
            data: vec![0; 12],
        }
    }

    #[test]
    fn test_command_args_carry_tuning() {
        let options = FfmpegOptions {
            preset: Some("fast".to_string()),
            crf: Some(23),
            ..FfmpegOptions::default()
        };
        let sink = FfmpegSink::new(PathBuf::from("out/video_0.mov"), options);
        let selection = EncoderSelection::for_container(Container::Mov, PixelFormat::Bgr8);

        let args = sink.command_args(&VideoParams::new(64, 64, 10.0), &selection);

        assert!(args.windows(2).any(|w| w[0] == "-preset" && w[1] == "fast"));
        assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "23"));
        assert!(args.last().unwrap().ends_with("video_0.mov"));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let options = FfmpegOptions {
            program: "polar-ffmpeg-that-does-not-exist".to_string(),
            ..FfmpegOptions::default()
        };
        let dir = std::env::temp_dir().join(format!("polar-ffmpeg-{}", std::process::id()));
        let mut sink = FfmpegSink::new(dir.join("video_0.mp4"), options);

        let err = sink
            .open(&VideoParams::new(64, 64, 10.0), &EncoderSelection::h264_mp4_bgr8())
            .unwrap_err();
        assert!(matches!(err, SinkError::Spawn(_)));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unopened_sink_rejects_frames() {
        let mut sink = FfmpegSink::new(PathBuf::from("video_0.mp4"), FfmpegOptions::default());

        assert!(matches!(sink.append_image(&image()), Err(SinkError::NotOpen)));
        assert!(matches!(sink.close(), Err(SinkError::NotOpen)));
    }
}
