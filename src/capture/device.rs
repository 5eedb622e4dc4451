//! The capture device seam: what the recorder needs from a camera.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of stream a capture device records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Color,
    Depth,
}

impl StreamKind {
    /// Identifier used for this stream in session file records.
    pub fn id(self) -> u8 {
        match self {
            StreamKind::Color => 0,
            StreamKind::Depth => 1,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(StreamKind::Color),
            1 => Some(StreamKind::Depth),
            _ => None,
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Color => write!(f, "color"),
            StreamKind::Depth => write!(f, "depth"),
        }
    }
}

/// One stream to enable on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub kind: StreamKind,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl StreamConfig {
    pub fn new(kind: StreamKind, width: u32, height: u32, fps: u32) -> Self {
        Self {
            kind,
            width,
            height,
            fps,
        }
    }

    /// Reject streams the device could never deliver.
    pub fn validate(&self) -> Result<(), DeviceError> {
        if self.width == 0 || self.height == 0 {
            return Err(DeviceError::InvalidStream {
                kind: self.kind,
                reason: format!("resolution {}x{} is empty", self.width, self.height),
            });
        }
        if !(1..=120).contains(&self.fps) {
            return Err(DeviceError::InvalidStream {
                kind: self.kind,
                reason: format!("framerate must be between 1 and 120 fps, got {}", self.fps),
            });
        }
        Ok(())
    }
}

/// Non-fatal outcome of a frame acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    Ready,
    /// The frame was acquired but the device has something to say about it.
    Warning { code: i32, message: String },
}

/// Fatal device errors.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("capture backend '{0}' is not available in this build")]
    BackendUnavailable(String),

    #[error("failed to open capture device: {0}")]
    Open(String),

    #[error("cannot enable {kind} stream: {reason}")]
    InvalidStream { kind: StreamKind, reason: String },

    #[error("failed to create session file '{}': {source}", path.display())]
    SessionFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode session header: {0}")]
    Header(#[from] toml::ser::Error),

    #[error("failed to acquire frame: {0}")]
    Acquire(String),

    #[error("failed to write frame: {0}")]
    Write(#[from] std::io::Error),
}

/// A source of frames the recorder pulls from.
///
/// Acquiring a frame is what makes the device record it; the recorder never
/// looks at the data. Implementations own their session file.
pub trait CaptureDevice: Send {
    /// Block until the next frame is available and lock it.
    fn acquire_frame(&mut self) -> Result<DeviceStatus, DeviceError>;

    /// Done working with the frame.
    fn release_frame(&mut self);
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for Box<D> {
    fn acquire_frame(&mut self) -> Result<DeviceStatus, DeviceError> {
        (**self).acquire_frame()
    }

    fn release_frame(&mut self) {
        (**self).release_frame()
    }
}
