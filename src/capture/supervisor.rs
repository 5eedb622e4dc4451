//! Ownership of the single capture thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::session::{SessionState, SharedState};

use super::capture_loop::{run_capture_loop, CaptureFailure, LoopReport};
use super::device::CaptureDevice;

/// Errors starting a capture thread.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("capture thread is already running")]
    AlreadyRunning,

    #[error("capture device is no longer available")]
    DeviceUnavailable,

    #[error("failed to spawn capture thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Runs at most one capture thread over a device it owns.
///
/// While no worker is running the supervisor holds the device. Spawning moves
/// the device into the capture thread and joining hands it back, so the main
/// thread can never touch the device while a capture is in progress.
pub struct CaptureSupervisor<D> {
    shared: Arc<SharedState>,
    device: Option<D>,
    worker: Option<JoinHandle<(D, LoopReport)>>,
    spawned: u32,
}

impl<D> std::fmt::Debug for CaptureSupervisor<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSupervisor")
            .field("is_active", &self.is_active())
            .field("spawned", &self.spawned)
            .finish_non_exhaustive()
    }
}

impl<D: CaptureDevice + 'static> CaptureSupervisor<D> {
    pub fn new(device: D, shared: Arc<SharedState>) -> Self {
        Self {
            shared,
            device: Some(device),
            worker: None,
            spawned: 0,
        }
    }

    /// Start the capture thread.
    ///
    /// The session must already be in the recording state so the thread's
    /// first check sees it.
    pub fn spawn(&mut self) -> Result<(), SupervisorError> {
        if self.worker.is_some() {
            return Err(SupervisorError::AlreadyRunning);
        }
        let mut device = self.device.take().ok_or(SupervisorError::DeviceUnavailable)?;
        let shared = Arc::clone(&self.shared);

        let handle = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                let report = run_capture_loop(&mut device, &shared);
                (device, report)
            })
            .map_err(SupervisorError::Spawn)?;

        self.worker = Some(handle);
        self.spawned += 1;
        log::info!("Capture thread started");
        Ok(())
    }

    /// Wait for the capture thread to finish.
    ///
    /// The caller must have moved the session out of the recording state
    /// first, otherwise this blocks until the device fails. Returns `None`
    /// if no thread was running.
    pub fn join(&mut self) -> Option<LoopReport> {
        let handle = self.worker.take()?;
        let report = match handle.join() {
            Ok((device, report)) => {
                self.device = Some(device);
                report
            }
            Err(_) => {
                log::error!("Capture thread panicked; the device is lost");
                self.shared.mark_capture_failed();
                LoopReport {
                    failure: Some(CaptureFailure::Panicked),
                    ..LoopReport::default()
                }
            }
        };
        log::info!(
            "Capture thread joined: {} frame(s), {} warning(s){}",
            report.frames,
            report.warnings,
            if report.failed() { ", failed" } else { "" }
        );
        Some(report)
    }

    /// Take the device back, e.g. to close it explicitly.
    ///
    /// Returns `None` while a capture thread is running.
    pub fn take_device(&mut self) -> Option<D> {
        if self.worker.is_some() {
            return None;
        }
        self.device.take()
    }
}

impl<D> CaptureSupervisor<D> {
    /// Whether a capture thread is currently alive.
    pub fn is_active(&self) -> bool {
        self.worker.is_some()
    }

    /// How many capture threads were started over the supervisor's life.
    pub fn spawned(&self) -> u32 {
        self.spawned
    }
}

impl<D> Drop for CaptureSupervisor<D> {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.take() {
            // Leaving early (error or panic on the main thread): make the
            // thread see a non-recording state, then wait for it.
            if self.shared.load() == SessionState::Recording {
                self.shared.store(SessionState::Quit);
            }
            let _ = handle.join();
        }
    }
}
