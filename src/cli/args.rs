//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Backend, Config};

/// Eye-tracking calibration recorder: follow the dot while the camera records
#[derive(Parser, Debug)]
#[command(name = "gaze-recorder")]
#[command(version, about = "Eye-tracking calibration recorder", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Directory to write the session file into
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,

    /// Capture backend
    #[arg(long, short, value_enum)]
    pub device: Option<Backend>,

    /// Log filter, e.g. "debug" or "gaze_recorder=trace"
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available cameras
    ListCameras,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

impl Args {
    /// Let command-line flags override the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.recording.output_dir = Some(dir.clone());
        }
        if let Some(backend) = self.device {
            config.capture.backend = backend;
        }
    }
}
