//! Polar FFI - C Foreign Function Interface
//!
//! Push-style recorder for host applications that own the camera loop. The
//! four streams are opened lazily from the first pushed frame.

use parking_lot::Mutex;
use polar_encoder::open_sinks;
use polar_video::{
    validate_frame, Container, EncoderSink, ErrorKind, FrameBuffer, RecordError, Recording,
    RecordingConfig, RecordingPipeline,
};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;
use std::sync::Arc;

pub const POLAR_CONTAINER_MP4: u32 = 0;
pub const POLAR_CONTAINER_MOV: u32 = 1;
pub const POLAR_CONTAINER_AVI: u32 = 2;
pub const POLAR_CONTAINER_RAW: u32 = 3;

/// Opaque handle to a recorder (C-compatible)
pub struct PolarRecorder {
    _private: [u8; 0],
}

/// Result of every fallible call; non-zero codes follow the recording error kinds
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarStatus {
    Ok = 0,
    MalformedFrame = 1,
    EmptyPlane = 2,
    UnsupportedPixelFormat = 3,
    DimensionMismatch = 4,
    InvalidSessionState = 5,
    SessionOpen = 6,
    Encode = 7,
    Finalize = 8,
    NoFrames = 9,
    Acquisition = 10,
    Config = 11,
    NullPointer = 64,
}

impl From<ErrorKind> for PolarStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::MalformedFrame => PolarStatus::MalformedFrame,
            ErrorKind::EmptyPlane => PolarStatus::EmptyPlane,
            ErrorKind::UnsupportedPixelFormat => PolarStatus::UnsupportedPixelFormat,
            ErrorKind::DimensionMismatch => PolarStatus::DimensionMismatch,
            ErrorKind::InvalidSessionState => PolarStatus::InvalidSessionState,
            ErrorKind::SessionOpen => PolarStatus::SessionOpen,
            ErrorKind::Encode => PolarStatus::Encode,
            ErrorKind::Finalize => PolarStatus::Finalize,
            ErrorKind::NoFrames => PolarStatus::NoFrames,
            ErrorKind::Acquisition => PolarStatus::Acquisition,
            ErrorKind::Config => PolarStatus::Config,
        }
    }
}

impl From<&RecordError> for PolarStatus {
    fn from(error: &RecordError) -> Self {
        error.kind().into()
    }
}

type ActiveRecording = Recording<Arc<RecordingPipeline>, Box<dyn EncoderSink>>;

enum RecorderState {
    Idle,
    Active(ActiveRecording),
    Done { frames: u64 },
}

struct Recorder {
    config: RecordingConfig,
    pipeline: Arc<RecordingPipeline>,
    state: Mutex<RecorderState>,
}

impl Recorder {
    fn new(config: RecordingConfig) -> Result<Self, RecordError> {
        config.validate()?;
        Ok(Self {
            pipeline: Arc::new(RecordingPipeline::new(config.pipeline_options())),
            config,
            state: Mutex::new(RecorderState::Idle),
        })
    }

    fn push(&self, frame: FrameBuffer) -> PolarStatus {
        let mut state = self.state.lock();

        if let RecorderState::Idle = *state {
            let started = validate_frame(&frame).and_then(|()| {
                Recording::start(
                    Arc::clone(&self.pipeline),
                    open_sinks(&self.config),
                    frame.width(),
                    frame.height(),
                )
            });
            match started {
                Ok(recording) => *state = RecorderState::Active(recording),
                Err(e) => {
                    log::error!("Failed to start recording: {}", e);
                    return PolarStatus::from(&e);
                }
            }
        }

        let RecorderState::Active(recording) = &mut *state else {
            return PolarStatus::InvalidSessionState;
        };

        match recording.push(frame) {
            Ok(()) => PolarStatus::Ok,
            Err(e) => {
                let error = recording.abort(e);
                let frames = recording.frames();
                *state = RecorderState::Done { frames };
                PolarStatus::from(&error)
            }
        }
    }

    fn frames_written(&self) -> u64 {
        match &*self.state.lock() {
            RecorderState::Idle => 0,
            RecorderState::Active(recording) => recording.frames(),
            RecorderState::Done { frames } => *frames,
        }
    }

    fn finish(&self) -> PolarStatus {
        let mut state = self.state.lock();

        match std::mem::replace(&mut *state, RecorderState::Done { frames: 0 }) {
            RecorderState::Active(mut recording) => {
                let result = recording.finish();
                *state = RecorderState::Done {
                    frames: recording.frames(),
                };
                match result {
                    Ok(_) => PolarStatus::Ok,
                    Err(e) => PolarStatus::from(&e),
                }
            }
            RecorderState::Idle => PolarStatus::NoFrames,
            RecorderState::Done { frames } => {
                *state = RecorderState::Done { frames };
                PolarStatus::InvalidSessionState
            }
        }
    }
}

unsafe fn recorder<'a>(ptr: *const PolarRecorder) -> Option<&'a Recorder> {
    (ptr as *const Recorder).as_ref()
}

fn into_handle(result: Result<Recorder, RecordError>) -> *mut PolarRecorder {
    match result {
        Ok(recorder) => Box::into_raw(Box::new(recorder)) as *mut PolarRecorder,
        Err(e) => {
            log::error!("Failed to create recorder: {}", e);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// RECORDER API
// ============================================================================

/// Create a recorder writing `video_<deg>.<ext>` files into `output_dir`
///
/// `container` is one of the `POLAR_CONTAINER_*` codes. Returns null on
/// invalid arguments.
///
/// # Safety
/// `output_dir` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn polar_recorder_create(
    output_dir: *const c_char,
    frame_rate: f64,
    container: u32,
) -> *mut PolarRecorder {
    let mut config = RecordingConfig::default();

    if !output_dir.is_null() {
        match CStr::from_ptr(output_dir).to_str() {
            Ok(dir) => config.output.directory = dir.into(),
            Err(_) => return ptr::null_mut(),
        }
    }

    config.capture.frame_rate = frame_rate;
    config.output.container = match container {
        POLAR_CONTAINER_MP4 => Container::Mp4,
        POLAR_CONTAINER_MOV => Container::Mov,
        POLAR_CONTAINER_AVI => Container::Avi,
        POLAR_CONTAINER_RAW => Container::Raw,
        _ => return ptr::null_mut(),
    };

    into_handle(Recorder::new(config))
}

/// Create a recorder from a TOML configuration file
///
/// # Safety
/// `path` must be a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn polar_recorder_create_from_config(path: *const c_char) -> *mut PolarRecorder {
    if path.is_null() {
        return ptr::null_mut();
    }

    let Ok(path) = CStr::from_ptr(path).to_str() else {
        return ptr::null_mut();
    };

    into_handle(RecordingConfig::load(Path::new(path)).and_then(Recorder::new))
}

/// Record one interleaved frame of `width x height` pixels
///
/// The first frame opens the four streams. `len` is the number of valid
/// bytes at `data`; the bytes are copied before returning.
///
/// # Safety
/// `ptr` must come from a create call. `data` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn polar_recorder_push_frame(
    ptr: *mut PolarRecorder,
    data: *const u8,
    len: libc::size_t,
    width: u32,
    height: u32,
) -> PolarStatus {
    let Some(recorder) = recorder(ptr) else {
        return PolarStatus::NullPointer;
    };
    if data.is_null() {
        return PolarStatus::NullPointer;
    }

    let bytes = std::slice::from_raw_parts(data, len).to_vec();
    recorder.push(FrameBuffer::new(width, height, bytes))
}

/// Frames appended to every stream so far
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn polar_recorder_frames_written(ptr: *const PolarRecorder) -> u64 {
    recorder(ptr).map_or(0, Recorder::frames_written)
}

/// Finalize all four streams
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn polar_recorder_finish(ptr: *mut PolarRecorder) -> PolarStatus {
    match recorder(ptr) {
        Some(recorder) => recorder.finish(),
        None => PolarStatus::NullPointer,
    }
}

/// Destroy a recorder, finalizing any streams still open
///
/// # Safety
/// Caller must ensure ptr is valid and not already freed.
#[no_mangle]
pub unsafe extern "C" fn polar_recorder_destroy(ptr: *mut PolarRecorder) {
    if !ptr.is_null() {
        let _ = Box::from_raw(ptr as *mut Recorder);
    }
}

/// Get library version string
#[no_mangle]
pub extern "C" fn polar_recorder_version() -> *const c_char {
    "0.1.0\0".as_ptr() as *const c_char
}
