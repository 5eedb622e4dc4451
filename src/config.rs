//! Configuration file handling for gaze-recorder.
//!
//! Loads configuration from `<config dir>/Beymans/RealSenseRecorder/config.toml`
//! or a custom path. Every key is optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::capture::{StreamConfig, StreamKind};

const VENDOR: &str = "Beymans";
const APPLICATION: &str = "RealSenseRecorder";

/// Configuration file structure for gaze-recorder.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Where session files go and what they are called.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Overrides the per-user application data directory.
    pub output_dir: Option<PathBuf>,
    pub extension: String,
    pub vendor: String,
    pub application: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            extension: "rssdk".to_string(),
            vendor: VENDOR.to_string(),
            application: APPLICATION.to_string(),
        }
    }
}

impl RecordingConfig {
    /// Directory session files are written to.
    ///
    /// Returns `None` if no per-user data directory can be found.
    pub fn directory(&self) -> Option<PathBuf> {
        match &self.output_dir {
            Some(dir) => Some(dir.clone()),
            None => dirs::data_dir().map(|d| d.join(&self.vendor).join(&self.application)),
        }
    }
}

/// Which capture device implementation records the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// A webcam, through nokhwa (needs the `camera` feature)
    Camera,
    /// Generated frames paced at the configured rate
    Synthetic,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Camera => "camera",
            Backend::Synthetic => "synthetic",
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "camera") {
            Backend::Camera
        } else {
            Backend::Synthetic
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub backend: Backend,
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            device_index: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

impl CaptureConfig {
    /// The streams to enable: color and depth at the same resolution.
    pub fn streams(&self) -> Vec<StreamConfig> {
        [StreamKind::Color, StreamKind::Depth]
            .into_iter()
            .map(|kind| StreamConfig::new(kind, self.width, self.height, self.fps))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub instruction_text: String,
    pub start_text: String,
    pub quit_text: String,
    pub interrupted_text: String,
    /// Text-art image of Mr. Point.
    pub target_sprite: PathBuf,
    pub frame_interval_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            instruction_text: "Follow the green dot with your eyes.".to_string(),
            start_text: "Press any key to start.".to_string(),
            quit_text: "Press any key to quit.".to_string(),
            interrupted_text: "The camera stopped early; the recording is incomplete.".to_string(),
            target_sprite: PathBuf::from("data/mrpoint.txt"),
            frame_interval_ms: 16,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub level: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(VENDOR).join(APPLICATION).join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".config")
                .join(VENDOR)
                .join(APPLICATION)
                .join("config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.recording.extension, "rssdk");
        assert_eq!(config.recording.vendor, "Beymans");
        assert_eq!(config.recording.application, "RealSenseRecorder");
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.capture.height, 480);
        assert_eq!(config.capture.fps, 30);
        assert_eq!(config.ui.start_text, "Press any key to start.");
        assert_eq!(config.ui.target_sprite, PathBuf::from("data/mrpoint.txt"));
        assert!(config.log.level.is_none());
    }

    #[test]
    fn test_streams_are_color_and_depth() {
        let streams = CaptureConfig::default().streams();
        assert_eq!(
            streams,
            vec![
                StreamConfig::new(StreamKind::Color, 640, 480, 30),
                StreamConfig::new(StreamKind::Depth, 640, 480, 30),
            ]
        );
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[recording]
output_dir = "/tmp/sessions"

[capture]
backend = "synthetic"
fps = 60

[ui]
quit_text = "Bye."

[log]
level = "debug"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.recording.output_dir, Some(PathBuf::from("/tmp/sessions")));
        assert_eq!(config.recording.extension, "rssdk");
        assert_eq!(config.capture.backend, Backend::Synthetic);
        assert_eq!(config.capture.fps, 60);
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.ui.quit_text, "Bye.");
        assert_eq!(config.ui.start_text, "Press any key to start.");
        assert_eq!(config.log.level.as_deref(), Some("debug"));
        assert_eq!(
            config.recording.directory(),
            Some(PathBuf::from("/tmp/sessions"))
        );
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config.capture.fps, 30);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[capture]\nfps = \"fast\"\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[capture]\nbackend = \"kinect\"\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_default_recording_dir_is_per_application() {
        if let Some(dir) = RecordingConfig::default().directory() {
            assert!(dir.ends_with("Beymans/RealSenseRecorder"));
        }
    }

    #[test]
    fn test_default_path() {
        assert!(default_path().ends_with("RealSenseRecorder/config.toml"));
    }
}
