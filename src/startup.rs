//! Startup steps that can fail, and the process exit codes they map to.
//!
//! | code | step |
//! |------|------|
//! | 1 | configuration, logging, signal handler, terminal raw mode |
//! | 2 | recording directory and capture device |
//! | 3 | screen setup |
//! | 4 | reserved for a font resource (the terminal uses its own font) |
//! | 5 | text resources |
//! | 6 | the target image |

use std::io;
use std::path::{Path, PathBuf};

use crate::app::AppError;
use crate::capture::{CaptureDevice, DeviceError, SyntheticDevice};
use crate::config::{Backend, CaptureConfig, ConfigError, UiConfig};
use crate::frontend::{ResourceError, Sprite, SpriteArt, SpriteColor, SpriteSheet};
use crate::logging::LoggingError;

/// A startup step failed; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("loading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("initializing logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("installing the signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("initializing the terminal: {0}")]
    Terminal(#[source] io::Error),

    #[error("can't find a directory to record into")]
    NoRecordingDir,

    #[error("creating recording directory '{}': {source}", path.display())]
    RecordingDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("initializing the capture device: {0}")]
    Device(#[from] DeviceError),

    #[error("opening the screen: {0}")]
    Window(#[source] io::Error),

    #[error("creating text: {0}")]
    Text(#[source] ResourceError),

    #[error("loading Mr. Point: {0}")]
    Image(#[source] ResourceError),
}

impl StartupError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::Config(_)
            | StartupError::Logging(_)
            | StartupError::Signal(_)
            | StartupError::Terminal(_) => 1,
            StartupError::NoRecordingDir
            | StartupError::RecordingDir { .. }
            | StartupError::Device(_) => 2,
            StartupError::Window(_) => 3,
            StartupError::Text(_) => 5,
            StartupError::Image(_) => 6,
        }
    }
}

/// Anything that ends a recorder run early.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Runtime(#[from] AppError),
}

impl RecorderError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RecorderError::Startup(e) => e.exit_code(),
            RecorderError::Runtime(_) => 1,
        }
    }
}

/// Resolve and create the directory session files go into.
pub fn prepare_recording_dir(dir: Option<PathBuf>) -> Result<PathBuf, StartupError> {
    let dir = dir.ok_or(StartupError::NoRecordingDir)?;
    std::fs::create_dir_all(&dir).map_err(|e| StartupError::RecordingDir {
        path: dir.clone(),
        source: e,
    })?;
    Ok(dir)
}

/// Open the configured capture device, recording into `session_path`.
pub fn open_device(
    capture: &CaptureConfig,
    session_path: &Path,
) -> Result<Box<dyn CaptureDevice>, StartupError> {
    let streams = capture.streams();
    let device: Box<dyn CaptureDevice> = match capture.backend {
        Backend::Synthetic => Box::new(SyntheticDevice::open(session_path, &streams)?),
        #[cfg(feature = "camera")]
        Backend::Camera => Box::new(crate::capture::CameraDevice::open(
            capture.device_index,
            session_path,
            &streams,
        )?),
        #[cfg(not(feature = "camera"))]
        Backend::Camera => {
            return Err(DeviceError::BackendUnavailable(Backend::Camera.name().to_string()).into())
        }
    };
    Ok(device)
}

/// Create the text resources, then load Mr. Point.
pub fn load_sprites(ui: &UiConfig) -> Result<SpriteSheet, StartupError> {
    let mut sheet = SpriteSheet::new();

    for (sprite, text) in [
        (Sprite::Instruction, &ui.instruction_text),
        (Sprite::Start, &ui.start_text),
        (Sprite::QuitPrompt, &ui.quit_text),
        (Sprite::Interrupted, &ui.interrupted_text),
    ] {
        let art = SpriteArt::text(text, SpriteColor::White).map_err(StartupError::Text)?;
        sheet.insert(sprite, art);
    }

    let target =
        SpriteArt::load(&ui.target_sprite, SpriteColor::Green).map_err(StartupError::Image)?;
    sheet.insert(Sprite::Target, target);

    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::session_file::read_session;

    fn ui_with_sprite(dir: &Path) -> UiConfig {
        let sprite = dir.join("mrpoint.txt");
        std::fs::write(&sprite, " ▄█▄\n ▀█▀\n").unwrap();
        UiConfig {
            target_sprite: sprite,
            ..UiConfig::default()
        }
    }

    #[test]
    fn test_exit_codes_are_distinct_per_step() {
        let io_err = || io::Error::new(io::ErrorKind::Other, "boom");
        assert_eq!(StartupError::Terminal(io_err()).exit_code(), 1);
        assert_eq!(StartupError::NoRecordingDir.exit_code(), 2);
        assert_eq!(
            StartupError::Device(DeviceError::Open("x".to_string())).exit_code(),
            2
        );
        assert_eq!(StartupError::Window(io_err()).exit_code(), 3);
        assert_eq!(StartupError::Text(ResourceError::EmptyText).exit_code(), 5);
        assert_eq!(
            StartupError::Image(ResourceError::EmptyImage(PathBuf::from("a"))).exit_code(),
            6
        );
    }

    #[test]
    fn test_prepare_recording_dir_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Beymans").join("RealSenseRecorder");
        let created = prepare_recording_dir(Some(target.clone())).unwrap();
        assert_eq!(created, target);
        assert!(target.is_dir());

        assert!(matches!(
            prepare_recording_dir(None),
            Err(StartupError::NoRecordingDir)
        ));
    }

    #[test]
    fn test_load_sprites_builds_every_sprite() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = load_sprites(&ui_with_sprite(dir.path())).unwrap();
        for sprite in [
            Sprite::Instruction,
            Sprite::Start,
            Sprite::QuitPrompt,
            Sprite::Interrupted,
            Sprite::Target,
        ] {
            assert!(sheet.get(sprite).is_some(), "missing {:?}", sprite);
        }
        assert_eq!(sheet.get(Sprite::Target).unwrap().color(), SpriteColor::Green);
    }

    #[test]
    fn test_bad_text_fails_with_code_5() {
        let dir = tempfile::tempdir().unwrap();
        let ui = UiConfig {
            start_text: String::new(),
            ..ui_with_sprite(dir.path())
        };
        let err = load_sprites(&ui).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_missing_image_fails_with_code_6() {
        let ui = UiConfig {
            target_sprite: PathBuf::from("/definitely/not/here/mrpoint.txt"),
            ..UiConfig::default()
        };
        let err = load_sprites(&ui).unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_open_synthetic_device_creates_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.rssdk");
        let capture = CaptureConfig {
            backend: Backend::Synthetic,
            ..CaptureConfig::default()
        };
        let device = open_device(&capture, &path).unwrap();
        drop(device);

        let (header, records) = read_session(&path).unwrap();
        assert_eq!(header.streams, capture.streams());
        assert!(records.is_empty());
    }

    #[test]
    fn test_invalid_stream_fails_with_code_2() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CaptureConfig {
            backend: Backend::Synthetic,
            fps: 0,
            ..CaptureConfig::default()
        };
        match open_device(&capture, &dir.path().join("s.rssdk")) {
            Err(e) => assert_eq!(e.exit_code(), 2),
            Ok(_) => panic!("Expected a device error"),
        }
    }

    #[cfg(not(feature = "camera"))]
    #[test]
    fn test_camera_backend_needs_feature() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CaptureConfig {
            backend: Backend::Camera,
            ..CaptureConfig::default()
        };
        match open_device(&capture, &dir.path().join("s.rssdk")) {
            Err(StartupError::Device(DeviceError::BackendUnavailable(name))) => {
                assert_eq!(name, "camera")
            }
            Err(other) => panic!("Expected BackendUnavailable, got {:?}", other),
            Ok(_) => panic!("Expected an error"),
        }
    }
}
