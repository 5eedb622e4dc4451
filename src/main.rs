use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use gaze_recorder::app::{self, RunSummary};
use gaze_recorder::capture::session_file::session_path;
use gaze_recorder::cli::{handle_config_action, list_cameras, Args, Command};
use gaze_recorder::clock::SystemClock;
use gaze_recorder::config::{default_path, Config};
use gaze_recorder::frontend::{ScreenGuard, TerminalFrontend};
use gaze_recorder::logging;
use gaze_recorder::session::Session;
use gaze_recorder::signal;
use gaze_recorder::startup::{self, RecorderError, StartupError};

fn main() {
    let args = Args::parse();

    if let Some(command) = &args.command {
        let result = match command {
            Command::ListCameras => list_cameras().map_err(|e| e.to_string()),
            Command::Config { action } => {
                let path = args.config.clone().unwrap_or_else(default_path);
                handle_config_action(action.clone(), &path).map_err(|e| e.to_string())
            }
        };
        if let Err(e) = result {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // The session file is named after the moment the program started.
    let started = Local::now();

    let code = match record(&args, started) {
        Ok((path, summary)) => {
            report(&path, &summary);
            0
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

/// Run one calibration session. Every resource acquired here is released on
/// return, in reverse order, whether the run succeeded or not.
fn record(
    args: &Args,
    started: chrono::DateTime<Local>,
) -> Result<(PathBuf, RunSummary), RecorderError> {
    let mut config = Config::load(args.config.as_deref()).map_err(StartupError::from)?;
    args.apply(&mut config);

    let dir = startup::prepare_recording_dir(config.recording.directory())?;

    let filter = logging::resolve_filter(
        args.log_level.as_deref(),
        config.log.level.as_deref(),
        std::env::var("RUST_LOG").ok(),
    );
    logging::init(&filter, &dir.join(logging::LOG_FILE)).map_err(StartupError::from)?;
    signal::setup_quit_handler().map_err(StartupError::from)?;

    let path = session_path(&dir, &started, &config.recording.extension);
    log::info!("Recording to {}", path.display());

    let guard = ScreenGuard::enter_raw_mode().map_err(StartupError::Terminal)?;
    let device = startup::open_device(&config.capture, &path)?;
    let mut frontend = TerminalFrontend::open(
        guard,
        Duration::from_millis(config.ui.frame_interval_ms),
    )
    .map_err(StartupError::Window)?;
    frontend.set_sprites(startup::load_sprites(&config.ui)?);

    let clock = SystemClock::new();
    let mut session = Session::new(device);
    let summary = app::run(&mut frontend, &clock, &mut session)?;

    // Close the device (and its file) before giving the terminal back.
    drop(session.close());
    if let Err(e) = frontend.close() {
        log::warn!("Failed to restore the terminal: {}", e);
    }

    Ok((path, summary))
}

fn report(path: &std::path::Path, summary: &RunSummary) {
    if !summary.recorded {
        println!("Nothing was recorded.");
        return;
    }
    println!("Recording saved to {}", path.display());
    if summary.capture_failed {
        eprintln!(
            "Warning: the camera stopped early ({} frame(s) captured); the recording is incomplete.",
            summary.frames_captured.unwrap_or(0)
        );
    }
}
