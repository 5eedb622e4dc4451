//! Subcommand handlers for list-cameras and config actions.

use std::io;
use std::path::Path;

use super::args::ConfigAction;
use crate::config::Config;

/// Commented default configuration written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# gaze-recorder configuration

[recording]
# Directory for session files (default: per-user app data directory)
# output_dir = "/path/to/sessions"
extension = "rssdk"
# Without output_dir, sessions go to <data dir>/<vendor>/<application>
# vendor = "Beymans"
# application = "RealSenseRecorder"

[capture]
# Backend: camera (needs the `camera` feature) or synthetic
# backend = "synthetic"
device_index = 0
width = 640
height = 480
fps = 30

[ui]
instruction_text = "Follow the green dot with your eyes."
start_text = "Press any key to start."
quit_text = "Press any key to quit."
# Shown on the final screen when the camera failed during recording
# interrupted_text = "The camera stopped early; the recording is incomplete."
target_sprite = "data/mrpoint.txt"
frame_interval_ms = 16

[log]
# level = "info"
"#;

/// List available cameras and print them to stdout.
#[cfg(feature = "camera")]
pub fn list_cameras() -> Result<(), crate::capture::DeviceError> {
    let devices = crate::capture::list_cameras()?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
    } else {
        println!("Available cameras:");
        for device in devices {
            println!("  {}", device);
        }
        println!();
        println!("Set capture.device_index in the config file to select a camera.");
    }
    Ok(())
}

/// List available cameras and print them to stdout.
#[cfg(not(feature = "camera"))]
pub fn list_cameras() -> Result<(), crate::capture::DeviceError> {
    println!("This build has no camera support; rebuild with `--features camera`.");
    Ok(())
}

/// Handle config subcommand actions against the config file at `path`.
pub fn handle_config_action(action: ConfigAction, path: &Path) -> io::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load(Some(path))
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
            println!("Current configuration:");
            match config.recording.directory() {
                Some(dir) => println!("  Recording directory: {}", dir.display()),
                None => println!("  Recording directory: (none found)"),
            }
            println!("  Extension: {}", config.recording.extension);
            println!("  Backend: {}", config.capture.backend.name());
            println!(
                "  Streams: color + depth, {}x{} @ {} fps",
                config.capture.width, config.capture.height, config.capture.fps
            );
            println!("  Target sprite: {}", config.ui.target_sprite.display());
            println!();

            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            if path.exists() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("config file already exists: {}", path.display()),
                ));
            }

            // Create parent directories if needed
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, DEFAULT_CONFIG)?;

            println!("Created config file: {}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_defaults() {
        let parsed: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.recording.extension, defaults.recording.extension);
        assert_eq!(parsed.capture.width, defaults.capture.width);
        assert_eq!(parsed.capture.fps, defaults.capture.fps);
        assert_eq!(parsed.capture.backend, defaults.capture.backend);
        assert_eq!(parsed.ui.quit_text, defaults.ui.quit_text);
        assert_eq!(parsed.ui.target_sprite, defaults.ui.target_sprite);
    }

    #[test]
    fn test_default_config_documents_every_key() {
        for key in [
            "output_dir",
            "extension",
            "vendor",
            "application",
            "backend",
            "device_index",
            "width",
            "height",
            "fps",
            "instruction_text",
            "start_text",
            "quit_text",
            "interrupted_text",
            "target_sprite",
            "frame_interval_ms",
            "level",
        ] {
            assert!(
                DEFAULT_CONFIG.contains(&format!("{} = ", key)),
                "config init template is missing `{}`",
                key
            );
        }

        // Uncommenting the optional keys gives the built-in defaults.
        let uncommented: String = DEFAULT_CONFIG
            .lines()
            .map(|line| match line.strip_prefix("# ") {
                Some(rest) if rest.starts_with("vendor")
                    || rest.starts_with("application")
                    || rest.starts_with("interrupted_text") => rest,
                _ => line,
            })
            .collect::<Vec<_>>()
            .join("\n");
        let parsed: Config = toml::from_str(&uncommented).unwrap();
        let defaults = Config::default();
        assert_eq!(parsed.recording.vendor, defaults.recording.vendor);
        assert_eq!(parsed.recording.application, defaults.recording.application);
        assert_eq!(parsed.ui.interrupted_text, defaults.ui.interrupted_text);
    }

    #[test]
    fn test_config_init_creates_then_refuses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        handle_config_action(ConfigAction::Init, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);

        let err = handle_config_action(ConfigAction::Init, &path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_config_show_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[capture\n").unwrap();
        let err = handle_config_action(ConfigAction::Show, &path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
