//! Log setup for the binary.
//!
//! The terminal belongs to the calibration screen while the recorder runs,
//! so log records go to a file next to the session files.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const DEFAULT_FILTER: &str = "info";

/// Name of the log file inside the recording directory.
pub const LOG_FILE: &str = "gaze-recorder.log";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("logger already initialized: {0}")]
    AlreadyInitialized(#[from] log::SetLoggerError),
}

/// Pick the log filter: command line first, then config, then `RUST_LOG`.
pub fn resolve_filter(cli: Option<&str>, config: Option<&str>, env: Option<String>) -> String {
    cli.or(config)
        .map(str::to_string)
        .or(env)
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Send log records matching `filter` to `path`, appending.
pub fn init(filter: &str, path: &Path) -> Result<(), LoggingError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggingError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

    env_logger::Builder::new()
        .parse_filters(filter)
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        assert_eq!(
            resolve_filter(Some("trace"), Some("warn"), Some("debug".to_string())),
            "trace"
        );
        assert_eq!(
            resolve_filter(None, Some("warn"), Some("debug".to_string())),
            "warn"
        );
        assert_eq!(resolve_filter(None, None, Some("debug".to_string())), "debug");
        assert_eq!(resolve_filter(None, None, None), "info");
    }

    #[test]
    fn test_init_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join(LOG_FILE);
        assert!(matches!(
            init("info", &path),
            Err(LoggingError::Open { .. })
        ));
    }
}
