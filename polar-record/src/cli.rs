//! Command-line recording front end

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use polar_encoder::open_sinks;
use polar_video::{
    Container, DispatchMode, FrameSource, RawFileSource, RecordingConfig, RecordingEvent,
    RecordingPipeline, RecordingReport, SyntheticSource,
};
use std::fs;
use std::path::PathBuf;
use std::thread;

/// Log a progress line every this many frames
const PROGRESS_INTERVAL: u64 = 10;

#[derive(Parser, Debug)]
#[command(name = "polar-record")]
#[command(about = "Record one video per polarization angle from an interleaved camera stream")]
#[command(version)]
#[command(disable_help_flag = true)]
pub struct Args {
    /// Frame width in pixels [default: 2448]
    #[arg(short = 'w', long)]
    pub width: Option<u32>,

    /// Frame height in pixels [default: 2048]
    #[arg(short = 'h', long)]
    pub height: Option<u32>,

    /// Number of frames to record [default: 50]
    #[arg(short = 'n', long = "num-images")]
    pub num_images: Option<u64>,

    /// Output frame rate [default: 10]
    #[arg(long, allow_negative_numbers = true)]
    pub fps: Option<f64>,

    /// TOML configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Raw interleaved capture to read instead of the synthetic pattern
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Directory for the four output files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Output container: mp4, mov, avi or raw
    #[arg(long, value_parser = parse_container)]
    pub container: Option<Container>,

    /// Write uncompressed frames without ffmpeg (same as --container raw)
    #[arg(long)]
    pub raw_sink: bool,

    /// Integer decimation factor applied to every plane
    #[arg(long)]
    pub downscale: Option<u32>,

    /// Append the four planes of a frame concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Add seeded noise of this amplitude to the synthetic pattern
    #[arg(long)]
    pub noise: Option<u8>,

    /// Seed for --noise
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

fn parse_container(value: &str) -> std::result::Result<Container, String> {
    Container::from_extension(value)
        .ok_or_else(|| format!("unknown container '{}' (expected mp4, mov, avi or raw)", value))
}

impl Args {
    /// Resolve the effective configuration: file (or defaults), then flags
    pub fn to_config(&self) -> Result<RecordingConfig> {
        let mut config = match &self.config {
            Some(path) => RecordingConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => RecordingConfig::default(),
        };

        if let Some(width) = self.width {
            config.capture.width = width;
        }
        if let Some(height) = self.height {
            config.capture.height = height;
        }
        if let Some(num_images) = self.num_images {
            config.capture.num_images = num_images;
        }
        if let Some(fps) = self.fps {
            config.capture.frame_rate = fps;
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(container) = self.container {
            config.output.container = container;
            config.output.codec = None;
        }
        if self.raw_sink {
            if self.container.is_some_and(|c| c != Container::Raw) {
                bail!("--raw-sink cannot be combined with --container {}", config.output.container.extension());
            }
            config.output.container = Container::Raw;
            config.output.codec = None;
        }
        if let Some(factor) = self.downscale {
            config.pipeline.downscale = factor;
        }
        if self.parallel {
            config.pipeline.dispatch = DispatchMode::Parallel;
        }

        config.validate()?;
        Ok(config)
    }

    fn frame_source(&self, config: &RecordingConfig) -> Result<Box<dyn FrameSource>> {
        let capture = &config.capture;

        let source: Box<dyn FrameSource> = match &self.input {
            Some(path) => Box::new(
                RawFileSource::open(path, capture.width, capture.height)
                    .with_context(|| format!("opening {}", path.display()))?
                    .with_limit(capture.num_images),
            ),
            None => {
                let synthetic = SyntheticSource::new(capture.width, capture.height, capture.num_images);
                match self.noise {
                    Some(amplitude) => Box::new(synthetic.with_noise(self.seed, amplitude)),
                    None => Box::new(synthetic),
                }
            }
        };

        Ok(source)
    }
}

pub fn run(args: &Args) -> Result<()> {
    let config = args.to_config()?;
    let capture = &config.capture;

    fs::create_dir_all(&config.output.directory)
        .with_context(|| format!("creating {}", config.output.directory.display()))?;

    log::info!(
        "Recording {} frames of {}x{} at {} FPS into {}",
        capture.num_images,
        capture.width,
        capture.height,
        capture.frame_rate,
        config.output.directory.display()
    );

    let mut source = args.frame_source(&config)?;

    let mut pipeline = RecordingPipeline::new(config.pipeline_options());
    let events = pipeline.subscribe();
    let total = capture.num_images;
    let observer = thread::spawn(move || report_progress(events, total));

    let result = pipeline.record_source(open_sinks(&config), &mut source);

    // Dropping the pipeline disconnects the observer
    drop(pipeline);
    if observer.join().is_err() {
        log::warn!("progress observer panicked");
    }

    let report = result.context("recording failed")?;
    print_summary(&report);
    Ok(())
}

/// Log recording events until the channel disconnects; returns frames seen
fn report_progress(events: impl IntoIterator<Item = RecordingEvent>, total: u64) -> u64 {
    let mut recorded = 0;

    for event in events {
        match event {
            RecordingEvent::Started { outputs, .. } => {
                for output in outputs {
                    log::info!("Writing {}", output.display());
                }
            }
            RecordingEvent::FrameRecorded { index } => {
                recorded = index + 1;
                if recorded % PROGRESS_INTERVAL == 0 || recorded == total {
                    log::info!("Appended frame {}/{}", recorded, total);
                }
            }
            RecordingEvent::SessionClosed { angle, frames } => {
                log::debug!("{} stream closed after {} frames", angle, frames);
            }
            RecordingEvent::Finished { frames } => {
                log::info!("All streams finalized with {} frames", frames);
            }
            RecordingEvent::Failed { kind, message } => {
                log::error!("{:?}: {}", kind, message);
            }
        }
    }

    recorded
}

fn print_summary(report: &RecordingReport) {
    println!(
        "Recorded {} frames at {}x{} ({} FPS)",
        report.frames, report.width, report.height, report.frame_rate
    );
    for (angle, stream) in report.streams.iter() {
        println!(
            "  {:>4}: {} ({} frames)",
            angle.to_string(),
            stream.output.display(),
            stream.frames_written
        );
    }
}
