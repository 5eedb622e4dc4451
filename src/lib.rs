//! gaze-recorder library crate.
//!
//! An eye-tracking calibration recorder: a target ("Mr. Point") moves around
//! the screen on a fixed ten second path while a background thread pulls
//! frames from a capture device, which records them to a session file.

pub mod app;
pub mod capture;
pub mod choreography;
pub mod cli;
pub mod clock;
pub mod config;
pub mod frontend;
pub mod logging;
pub mod session;
pub mod signal;
pub mod startup;
