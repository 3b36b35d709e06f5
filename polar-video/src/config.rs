//! Recording configuration, persisted as TOML

use crate::error::{RecordError, Result};
use crate::pipeline::{DispatchMode, PipelineOptions};
use crate::types::{Codec, Container, EncoderSelection, PixelFormat, PolarAngle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecordingConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_num_images")]
    pub num_images: u64,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_file_stem")]
    pub file_stem: String,
    #[serde(default)]
    pub container: Container,
    /// Falls back to the container's usual codec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<Codec>,
    #[serde(default)]
    pub pixel_format: PixelFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crf: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_downscale")]
    pub downscale: u32,
    #[serde(default)]
    pub dispatch: DispatchMode,
}

fn default_width() -> u32 {
    2448
}

fn default_height() -> u32 {
    2048
}

fn default_num_images() -> u64 {
    50
}

fn default_frame_rate() -> f64 {
    10.0
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_stem() -> String {
    "video".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_downscale() -> u32 {
    1
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            num_images: default_num_images(),
            frame_rate: default_frame_rate(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            file_stem: default_file_stem(),
            container: Container::default(),
            codec: None,
            pixel_format: PixelFormat::default(),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            preset: None,
            crf: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            downscale: default_downscale(),
            dispatch: DispatchMode::default(),
        }
    }
}

impl RecordingConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| RecordError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| RecordError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RecordError::Config(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RecordError::Config(e.to_string()))?;
        }

        fs::write(path, content).map_err(|e| RecordError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let capture = &self.capture;
        if capture.width == 0 || capture.height == 0 {
            return Err(RecordError::Config(format!(
                "invalid width or height {}x{}",
                capture.width, capture.height
            )));
        }
        if capture.num_images == 0 {
            return Err(RecordError::Config("num_images should be greater than 0".into()));
        }
        if !(capture.frame_rate > 0.0) {
            return Err(RecordError::Config("frame rate must be greater than 0".into()));
        }
        if self.pipeline.downscale == 0 {
            return Err(RecordError::Config("downscale factor must be at least 1".into()));
        }
        if !self.selection().is_supported() {
            return Err(RecordError::Config(format!(
                "unsupported encoder selection {}",
                self.selection()
            )));
        }
        Ok(())
    }

    pub fn selection(&self) -> EncoderSelection {
        let output = &self.output;
        EncoderSelection {
            codec: output.codec.unwrap_or(output.container.default_codec()),
            container: output.container,
            pixel_format: output.pixel_format,
        }
    }

    /// `<directory>/<stem>_<degrees>.<ext>`
    pub fn output_path(&self, angle: PolarAngle) -> PathBuf {
        self.output.directory.join(format!(
            "{}_{}.{}",
            self.output.file_stem,
            angle.degrees(),
            self.output.container.extension()
        ))
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            frame_rate: self.capture.frame_rate,
            selection: self.selection(),
            downscale: self.pipeline.downscale,
            dispatch: self.pipeline.dispatch,
        }
    }
}
