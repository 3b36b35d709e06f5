//! Uncompressed sink writing packed frames back-to-back

use polar_video::{Codec, Container, EncoderImage, EncoderSelection, EncoderSink, SinkError, VideoParams};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct RawVideoSink {
    output: PathBuf,
    writer: Option<BufWriter<File>>,
    frame_size: usize,
}

impl RawVideoSink {
    pub fn new(output: PathBuf) -> Self {
        Self {
            output,
            writer: None,
            frame_size: 0,
        }
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.output.clone(),
            source,
        }
    }
}

impl EncoderSink for RawVideoSink {
    fn open(&mut self, params: &VideoParams, selection: &EncoderSelection) -> Result<(), SinkError> {
        if selection.codec != Codec::RawVideo || selection.container != Container::Raw {
            return Err(SinkError::Unsupported(format!(
                "raw sink cannot write {}",
                selection
            )));
        }

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let file = File::create(&self.output).map_err(|e| self.io_error(e))?;
        self.writer = Some(BufWriter::new(file));
        self.frame_size = selection.pixel_format.frame_size(params.width, params.height);
        Ok(())
    }

    fn append_image(&mut self, image: &EncoderImage) -> Result<(), SinkError> {
        if image.data.len() != self.frame_size {
            return Err(SinkError::Unsupported(format!(
                "frame of {} bytes, expected {}",
                image.data.len(),
                self.frame_size
            )));
        }

        let writer = self.writer.as_mut().ok_or(SinkError::NotOpen)?;
        writer.write_all(&image.data).map_err(|e| SinkError::Io {
            path: self.output.clone(),
            source: e,
        })
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let mut writer = self.writer.take().ok_or(SinkError::NotOpen)?;
        writer.flush().map_err(|e| self.io_error(e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| self.io_error(e))
    }

    fn output(&self) -> &Path {
        &self.output
    }
}
