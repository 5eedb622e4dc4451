//! Command-line interface definitions and helpers.

mod args;
mod commands;

pub use args::{Args, Command, ConfigAction};
pub use commands::{handle_config_action, list_cameras};
