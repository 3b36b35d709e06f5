//! Four-stream recording pipeline
//!
//! Each frame is demultiplexed, its four planes converted, and the images
//! appended to the matching angle's [`StreamSession`] before the next frame
//! is read. Every exit path closes the sessions that were opened.

use crate::convert::{downscale_plane, GrayToColor, PixelConverter};
use crate::demux::{validate_frame, ChannelDemultiplexer};
use crate::error::{RecordError, Result};
use crate::events::{RecordingEvent, EVENT_QUEUE_SIZE};
use crate::frame::{EncoderImage, FrameBuffer};
use crate::pool::BufferPool;
use crate::session::{EncoderSink, SessionState, StreamSession};
use crate::source::FrameSource;
use crate::types::{AngleMap, EncoderSelection, PolarAngle, VideoParams};
use crossbeam::channel::{self, Receiver, Sender};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

/// How the four appends of one frame are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Append to each angle in turn on the calling thread
    #[default]
    Sequential,
    /// Append to all four angles concurrently, joining before the next frame
    Parallel,
}

/// Settings shared by every stream of a recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    pub frame_rate: f64,
    pub selection: EncoderSelection,
    /// Integer decimation applied to every plane; 1 keeps full resolution
    pub downscale: u32,
    pub dispatch: DispatchMode,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            frame_rate: 10.0,
            selection: EncoderSelection::h264_mp4_bgr8(),
            downscale: 1,
            dispatch: DispatchMode::Sequential,
        }
    }
}

/// Per-angle outcome of a finished recording
#[derive(Debug, Clone, PartialEq)]
pub struct StreamReport {
    pub output: PathBuf,
    pub frames_written: u64,
    pub state: SessionState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingReport {
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub streams: AngleMap<StreamReport>,
}

/// Orchestrates demultiplexing, conversion and the four stream sessions
pub struct RecordingPipeline<C: PixelConverter = GrayToColor> {
    options: PipelineOptions,
    demux: ChannelDemultiplexer,
    converter: C,
    events: Option<Sender<RecordingEvent>>,
}

impl RecordingPipeline<GrayToColor> {
    pub fn new(options: PipelineOptions) -> Self {
        let pool = Arc::new(BufferPool::default());
        Self {
            options,
            demux: ChannelDemultiplexer::new(pool.clone()),
            converter: GrayToColor::new(pool),
            events: None,
        }
    }
}

impl<C: PixelConverter> RecordingPipeline<C> {
    /// Build a pipeline around a custom plane converter
    pub fn with_converter(options: PipelineOptions, converter: C) -> Self {
        Self {
            options,
            demux: ChannelDemultiplexer::default(),
            converter,
            events: None,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Attach a progress observer, replacing any previous one
    pub fn subscribe(&mut self) -> Receiver<RecordingEvent> {
        let (tx, rx) = channel::bounded(EVENT_QUEUE_SIZE);
        self.events = Some(tx);
        rx
    }

    /// Resolution the streams are encoded at for a given source size
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        match self.options.downscale {
            0 | 1 => (width, height),
            factor => (width / factor, height / factor),
        }
    }

    /// Open all four sessions for frames of `width x height`
    ///
    /// Either every session opens or none stays open.
    pub fn begin<S: EncoderSink>(
        &self,
        sinks: AngleMap<S>,
        width: u32,
        height: u32,
    ) -> Result<Recording<&Self, S, C>> {
        Recording::start(self, sinks, width, height)
    }

    /// Record an ordered sequence of frames into the four sinks
    pub fn record<S, I>(&self, sinks: AngleMap<S>, frames: I) -> Result<RecordingReport>
    where
        S: EncoderSink,
        I: IntoIterator<Item = FrameBuffer>,
    {
        self.run(sinks, frames.into_iter().map(Ok))
    }

    /// Record every frame a source yields until it is exhausted
    pub fn record_source<S, F>(&self, sinks: AngleMap<S>, source: &mut F) -> Result<RecordingReport>
    where
        S: EncoderSink,
        F: FrameSource + ?Sized,
    {
        self.run(sinks, std::iter::from_fn(|| source.next_frame().transpose()))
    }

    fn run<S, I>(&self, sinks: AngleMap<S>, mut frames: I) -> Result<RecordingReport>
    where
        S: EncoderSink,
        I: Iterator<Item = Result<FrameBuffer>>,
    {
        let first = match frames.next() {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return Err(self.fail(e)),
            None => return Err(self.fail(RecordError::NoFrames)),
        };

        if let Err(e) = validate_frame(&first) {
            return Err(self.fail(e));
        }

        let mut recording = self.begin(sinks, first.width(), first.height())?;

        for frame in std::iter::once(Ok(first)).chain(frames) {
            let pushed = frame.and_then(|frame| recording.push(frame));
            if let Err(e) = pushed {
                return Err(recording.abort(e));
            }
        }

        recording.finish()
    }

    fn emit(&self, event: RecordingEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }

    fn fail(&self, error: RecordError) -> RecordError {
        log::error!("Recording failed: {}", error);
        self.emit(RecordingEvent::Failed {
            kind: error.kind(),
            message: error.to_string(),
        });
        error
    }

    fn convert(&self, frame: &FrameBuffer) -> Result<AngleMap<EncoderImage>> {
        let planes = self
            .demux
            .demultiplex(frame)?
            .map(|plane| downscale_plane(plane, self.options.downscale, self.demux.pool()));

        let format = self.options.selection.pixel_format;
        let images = AngleMap::try_from_fn(|angle| {
            self.converter.to_encoder_format(&planes[angle], format)
        });

        for (_, plane) in planes {
            self.demux.recycle(plane);
        }

        images
    }
}

/// An active recording with four open sessions
///
/// `P` is anything that lends the pipeline: a plain reference from
/// [`RecordingPipeline::begin`], or an `Arc` when the recording has to outlive
/// the caller's stack frame. Dropping it without calling
/// [`Recording::finish`] still finalizes every open session.
pub struct Recording<P, S, C = GrayToColor>
where
    P: Borrow<RecordingPipeline<C>>,
    S: EncoderSink,
    C: PixelConverter,
{
    pipeline: P,
    sessions: AngleMap<StreamSession<S>>,
    frames: u64,
    finalized: bool,
    _converter: PhantomData<C>,
}

impl<P, S, C> Recording<P, S, C>
where
    P: Borrow<RecordingPipeline<C>>,
    S: EncoderSink,
    C: PixelConverter,
{
    /// Open all four sessions against `pipeline`
    pub fn start(pipeline: P, sinks: AngleMap<S>, width: u32, height: u32) -> Result<Self> {
        let (params, selection) = {
            let p: &RecordingPipeline<C> = pipeline.borrow();
            let (target_w, target_h) = p.target_size(width, height);
            (
                VideoParams::new(target_w, target_h, p.options.frame_rate),
                p.options.selection,
            )
        };

        log::info!(
            "Preparing 4 streams ({}x{}, {} FPS, {})",
            params.width,
            params.height,
            params.frame_rate,
            selection
        );

        let sessions = sinks
            .map_with_angle(|angle, sink| StreamSession::new(angle, params, selection, sink));

        let mut recording = Recording {
            pipeline,
            sessions,
            frames: 0,
            finalized: false,
            _converter: PhantomData,
        };

        for angle in PolarAngle::ALL {
            if let Err(e) = recording.sessions[angle].open() {
                return Err(recording.abort(e));
            }
        }

        recording.pipeline().emit(RecordingEvent::Started {
            width: params.width,
            height: params.height,
            frame_rate: params.frame_rate,
            outputs: recording
                .sessions
                .values()
                .iter()
                .map(|s| s.output().to_path_buf())
                .collect(),
        });

        Ok(recording)
    }

    fn pipeline(&self) -> &RecordingPipeline<C> {
        Borrow::<RecordingPipeline<C>>::borrow(&self.pipeline)
    }

    pub fn sessions(&self) -> &AngleMap<StreamSession<S>> {
        &self.sessions
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Demultiplex, convert and append one frame
    ///
    /// All four planes are converted before any stream is touched, so a
    /// conversion failure leaves every stream at the same frame count.
    pub fn push(&mut self, frame: FrameBuffer) -> Result<()> {
        self.ensure_active("push to")?;
        let images = self.pipeline().convert(&frame)?;
        drop(frame);

        let result = match self.pipeline().options.dispatch {
            DispatchMode::Sequential => self
                .sessions
                .values_mut()
                .iter_mut()
                .zip(images.values())
                .try_for_each(|(session, image)| session.append_frame(image)),
            DispatchMode::Parallel => self
                .sessions
                .values_mut()
                .par_iter_mut()
                .zip(images.values().par_iter())
                .map(|(session, image)| session.append_frame(image))
                .collect::<Vec<_>>()
                .into_iter()
                .collect::<Result<()>>(),
        };

        for (_, image) in images {
            self.pipeline().converter.recycle(image);
        }

        result?;

        self.pipeline()
            .emit(RecordingEvent::FrameRecorded { index: self.frames });
        self.frames += 1;
        Ok(())
    }

    /// Close every open session and report the outcome
    ///
    /// All sessions are closed even if one fails; the first failure is returned.
    /// A recording that was already finished or aborted is rejected.
    pub fn finish(&mut self) -> Result<RecordingReport> {
        self.ensure_active("finish")?;

        match self.close_all() {
            Some(e) => Err(self.pipeline().fail(e)),
            None => {
                log::info!("Recording complete: {} frames per stream", self.frames);
                self.pipeline()
                    .emit(RecordingEvent::Finished { frames: self.frames });
                Ok(self.report())
            }
        }
    }

    /// Close every open session after `cause` and hand `cause` back
    pub fn abort(&mut self, cause: RecordError) -> RecordError {
        if let Some(close_err) = self.close_all() {
            log::warn!("Cleanup after failure also failed: {}", close_err);
        }
        self.pipeline().fail(cause)
    }

    pub fn report(&self) -> RecordingReport {
        let params = self.sessions[PolarAngle::Deg0].params();
        RecordingReport {
            frames: self.frames,
            width: params.width,
            height: params.height,
            frame_rate: params.frame_rate,
            streams: AngleMap::from_fn(|angle| {
                let session = &self.sessions[angle];
                StreamReport {
                    output: session.output().to_path_buf(),
                    frames_written: session.frames_written(),
                    state: session.state(),
                }
            }),
        }
    }

    fn ensure_active(&self, operation: &'static str) -> Result<()> {
        if self.finalized {
            return Err(RecordError::InvalidSessionState {
                angle: PolarAngle::Deg0,
                state: self.sessions[PolarAngle::Deg0].state(),
                operation,
            });
        }
        Ok(())
    }

    fn close_all(&mut self) -> Option<RecordError> {
        self.finalized = true;
        let pipeline: &RecordingPipeline<C> = self.pipeline.borrow();
        let mut first_error = None;

        for (angle, session) in self.sessions.iter_mut() {
            if !session.state().is_open() {
                continue;
            }

            match session.close() {
                Ok(()) => pipeline.emit(RecordingEvent::SessionClosed {
                    angle,
                    frames: session.frames_written(),
                }),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::frame::ChannelPlane;
    use crate::session::testing::{MemorySink, SinkLog};
    use crate::source::SyntheticSource;
    use crate::types::PixelFormat;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Logs = AngleMap<Arc<Mutex<SinkLog>>>;

    fn memory_sinks() -> (AngleMap<MemorySink>, Logs) {
        let pairs = AngleMap::from_fn(|angle| MemorySink::new(&format!("video_{}.mp4", angle.degrees())));
        let [a, b, c, d] = pairs.into_inner();
        (
            AngleMap::new([a.0, b.0, c.0, d.0]),
            AngleMap::new([a.1, b.1, c.1, d.1]),
        )
    }

    fn synthetic_frames(count: usize, width: u32, height: u32) -> Vec<FrameBuffer> {
        let mut source = SyntheticSource::new(width, height, count as u64);
        std::iter::from_fn(|| source.next_frame().unwrap()).collect()
    }

    /// Converter that fails on one frame index
    struct FaultyConverter {
        inner: GrayToColor,
        calls: AtomicUsize,
        fail_frame: usize,
    }

    impl PixelConverter for FaultyConverter {
        fn to_encoder_format(&self, plane: &ChannelPlane, format: PixelFormat) -> Result<EncoderImage> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call / 4 == self.fail_frame {
                return Err(RecordError::EmptyPlane { angle: plane.angle });
            }
            self.inner.to_encoder_format(plane, format)
        }
    }

    #[test]
    fn test_record_fifty_frames() {
        let pipeline = RecordingPipeline::new(PipelineOptions::default());
        let (sinks, logs) = memory_sinks();
        let frames = synthetic_frames(50, 64, 64);

        let report = pipeline.record(sinks, frames.clone()).unwrap();

        assert_eq!(report.frames, 50);
        assert_eq!((report.width, report.height), (64, 64));
        for (angle, stream) in report.streams.iter() {
            assert_eq!(stream.frames_written, 50);
            assert_eq!(stream.state, SessionState::Closed);

            let log = logs[angle].lock();
            assert!(log.closed);
            assert_eq!(log.opened, Some(VideoParams::new(64, 64, 10.0)));
            assert_eq!(log.frames.len(), 50);

            // Spot-check channel routing through to the encoded bytes
            let frame = &frames[7];
            let pixel = 130;
            let expected = frame.data()[4 * pixel + angle.offset()];
            assert_eq!(&log.frames[7][3 * pixel..3 * pixel + 3], &[expected; 3][..]);
        }
    }

    #[test]
    fn test_fault_at_frame_25_closes_all_sessions() {
        let converter = FaultyConverter {
            inner: GrayToColor::default(),
            calls: AtomicUsize::new(0),
            fail_frame: 24,
        };
        let pipeline = RecordingPipeline::with_converter(PipelineOptions::default(), converter);
        let (sinks, logs) = memory_sinks();

        let err = pipeline
            .record(sinks, synthetic_frames(50, 64, 64))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyPlane);

        for (_, log) in logs.iter() {
            let log = log.lock();
            assert!(log.closed);
            assert_eq!(log.close_calls, 1);
            assert_eq!(log.frames.len(), 24);
        }
    }

    #[test]
    fn test_incremental_fault_leaves_sessions_closed() {
        let converter = FaultyConverter {
            inner: GrayToColor::default(),
            calls: AtomicUsize::new(0),
            fail_frame: 24,
        };
        let pipeline = RecordingPipeline::with_converter(PipelineOptions::default(), converter);
        let (sinks, _logs) = memory_sinks();

        let mut recording = pipeline.begin(sinks, 64, 64).unwrap();
        let mut failure = None;
        for frame in synthetic_frames(50, 64, 64) {
            if let Err(e) = recording.push(frame) {
                failure = Some(recording.abort(e));
                break;
            }
        }

        assert!(failure.is_some());
        assert_eq!(recording.frames(), 24);
        for (_, session) in recording.sessions().iter() {
            assert_eq!(session.state(), SessionState::Closed);
        }
    }

    #[test]
    fn test_recording_owning_shared_pipeline() {
        let pipeline = Arc::new(RecordingPipeline::new(PipelineOptions::default()));
        let (sinks, logs) = memory_sinks();

        let mut recording =
            Recording::<_, _, GrayToColor>::start(Arc::clone(&pipeline), sinks, 8, 8).unwrap();
        for frame in synthetic_frames(5, 8, 8) {
            recording.push(frame).unwrap();
        }
        let report = recording.finish().unwrap();

        assert_eq!(report.frames, 5);
        assert!(logs.iter().all(|(_, l)| l.lock().frames.len() == 5));
    }

    #[test]
    fn test_no_frames() {
        let pipeline = RecordingPipeline::new(PipelineOptions::default());
        let (sinks, logs) = memory_sinks();

        let err = pipeline.record(sinks, Vec::new()).unwrap_err();
        assert!(matches!(err, RecordError::NoFrames));
        assert!(logs.iter().all(|(_, l)| l.lock().opened.is_none()));
    }

    #[test]
    fn test_short_single_frame_opens_nothing() {
        let pipeline = RecordingPipeline::new(PipelineOptions::default());
        let (sinks, logs) = memory_sinks();

        let frame = FrameBuffer::new(2, 2, vec![1, 2, 3]);
        let err = pipeline.record(sinks, vec![frame]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedFrame);
        for (_, log) in logs.iter() {
            let log = log.lock();
            assert!(log.opened.is_none());
            assert!(log.frames.is_empty());
            assert!(!log.closed);
        }
    }

    #[test]
    fn test_mismatched_second_frame() {
        let pipeline = RecordingPipeline::new(PipelineOptions::default());
        let (sinks, logs) = memory_sinks();

        let mut frames = synthetic_frames(1, 8, 8);
        frames.extend(synthetic_frames(1, 6, 8));
        frames.extend(synthetic_frames(1, 8, 8));
        let first = frames[0].clone();

        let err = pipeline.record(sinks, frames).unwrap_err();
        assert!(matches!(
            err,
            RecordError::DimensionMismatch {
                angle: PolarAngle::Deg0,
                expected: (8, 8),
                actual: (6, 8),
            }
        ));

        for (angle, log) in logs.iter() {
            let log = log.lock();
            assert!(log.closed);
            assert_eq!(log.frames.len(), 1);
            assert_eq!(log.frames[0][0], first.data()[angle.offset()]);
        }
    }

    #[test]
    fn test_open_failure_is_all_or_nothing() {
        let pipeline = RecordingPipeline::new(PipelineOptions::default());
        let (mut sinks, logs) = memory_sinks();
        sinks[PolarAngle::Deg90].fail_open = true;

        let err = pipeline
            .record(sinks, synthetic_frames(3, 8, 8))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionOpen);

        for (angle, log) in logs.iter() {
            let log = log.lock();
            assert!(log.frames.is_empty());
            // Streams opened before the failure are finalized again
            assert_eq!(log.closed, angle < PolarAngle::Deg90);
        }
    }

    #[test]
    fn test_append_failure_closes_all_sessions() {
        let pipeline = RecordingPipeline::new(PipelineOptions::default());
        let (mut sinks, logs) = memory_sinks();
        sinks[PolarAngle::Deg135].fail_append_at = Some(3);

        let err = pipeline
            .record(sinks, synthetic_frames(10, 8, 8))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);

        assert!(logs.iter().all(|(_, l)| l.lock().closed));
        assert_eq!(logs[PolarAngle::Deg135].lock().frames.len(), 3);
    }

    /// Yields `good` frames, then fails like a camera that stopped delivering
    struct StallingSource {
        inner: SyntheticSource,
        good: u64,
        served: u64,
    }

    impl FrameSource for StallingSource {
        fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
            if self.served == self.good {
                return Err(RecordError::Acquisition(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "no frame within timeout",
                )));
            }
            self.served += 1;
            self.inner.next_frame()
        }
    }

    #[test]
    fn test_source_failure_mid_run_closes_all_sessions() {
        let pipeline = RecordingPipeline::new(PipelineOptions::default());
        let (sinks, logs) = memory_sinks();
        let mut source = StallingSource {
            inner: SyntheticSource::new(8, 8, 10),
            good: 3,
            served: 0,
        };

        let err = pipeline.record_source(sinks, &mut source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Acquisition);

        for (_, log) in logs.iter() {
            let log = log.lock();
            assert!(log.closed);
            assert_eq!(log.close_calls, 1);
            assert_eq!(log.frames.len(), 3);
        }
    }

    #[test]
    fn test_dropped_recording_closes_sessions() {
        let pipeline = RecordingPipeline::new(PipelineOptions::default());
        let (sinks, logs) = memory_sinks();

        {
            let mut recording = pipeline.begin(sinks, 8, 8).unwrap();
            for frame in synthetic_frames(2, 8, 8) {
                recording.push(frame).unwrap();
            }
        }

        for (_, log) in logs.iter() {
            let log = log.lock();
            assert!(log.closed);
            assert_eq!(log.close_calls, 1);
            assert_eq!(log.frames.len(), 2);
        }
    }

    #[test]
    fn test_finish_after_abort_is_rejected() {
        let mut pipeline = RecordingPipeline::new(PipelineOptions::default());
        let rx = pipeline.subscribe();
        let (sinks, logs) = memory_sinks();

        let mut recording = pipeline.begin(sinks, 8, 8).unwrap();
        recording.abort(RecordError::NoFrames);

        assert!(matches!(
            recording.finish(),
            Err(RecordError::InvalidSessionState { operation: "finish", .. })
        ));
        assert!(matches!(
            recording.push(synthetic_frames(1, 8, 8).remove(0)),
            Err(RecordError::InvalidSessionState { .. })
        ));
        assert!(logs.iter().all(|(_, l)| l.lock().close_calls == 1));
        assert!(!rx
            .try_iter()
            .any(|e| matches!(e, RecordingEvent::Finished { .. })));
    }

    #[test]
    fn test_second_finish_is_rejected() {
        let pipeline = RecordingPipeline::new(PipelineOptions::default());
        let (sinks, _logs) = memory_sinks();

        let mut recording = pipeline.begin(sinks, 8, 8).unwrap();
        recording.push(synthetic_frames(1, 8, 8).remove(0)).unwrap();

        assert_eq!(recording.finish().unwrap().frames, 1);
        assert!(recording.finish().is_err());
    }

    #[test]
    fn test_parallel_dispatch_preserves_order() {
        let options = PipelineOptions {
            dispatch: DispatchMode::Parallel,
            ..PipelineOptions::default()
        };
        let pipeline = RecordingPipeline::new(options);
        let (sinks, logs) = memory_sinks();
        let frames = synthetic_frames(20, 16, 16);

        let report = pipeline.record(sinks, frames.clone()).unwrap();
        assert_eq!(report.frames, 20);

        for (angle, log) in logs.iter() {
            let log = log.lock();
            for (i, frame) in frames.iter().enumerate() {
                assert_eq!(log.frames[i][0], frame.data()[angle.offset()]);
            }
        }
    }

    #[test]
    fn test_downscaled_streams() {
        let options = PipelineOptions {
            downscale: 2,
            ..PipelineOptions::default()
        };
        let pipeline = RecordingPipeline::new(options);
        let (sinks, logs) = memory_sinks();

        let report = pipeline.record(sinks, synthetic_frames(2, 16, 8)).unwrap();
        assert_eq!((report.width, report.height), (8, 4));
        assert_eq!(logs[PolarAngle::Deg45].lock().frames[0].len(), 8 * 4 * 3);
    }

    #[test]
    fn test_events_are_reported() {
        let mut pipeline = RecordingPipeline::new(PipelineOptions::default());
        let rx = pipeline.subscribe();
        let (sinks, _logs) = memory_sinks();

        pipeline.record(sinks, synthetic_frames(3, 8, 8)).unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events.first(), Some(RecordingEvent::Started { width: 8, .. })));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, RecordingEvent::FrameRecorded { .. }))
                .count(),
            3
        );
        assert_eq!(events.last(), Some(&RecordingEvent::Finished { frames: 3 }));
    }
}
