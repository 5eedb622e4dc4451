//! The calibration session: a tiny state machine with the states
//! idle -> recording -> done (-> quit).
//!
//! The session runs on the main thread. Its state is also read by the capture
//! thread, which keeps pulling frames for as long as it sees
//! [`SessionState::Recording`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::capture::{CaptureDevice, CaptureSupervisor, LoopReport, SupervisorError};
use crate::choreography::{self, Position, RESTING_POSITION};
use crate::frontend::InputEvent;

/// Where the session is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    /// Waiting for the user to press a key.
    Idle = 0,
    /// The target is moving and the camera is recording.
    Recording = 1,
    /// Recording finished, waiting for a key to quit.
    Done = 2,
    Quit = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Idle,
            1 => SessionState::Recording,
            2 => SessionState::Done,
            _ => SessionState::Quit,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::Done => "done",
            SessionState::Quit => "quit",
        };
        write!(f, "{}", name)
    }
}

/// State shared between the main thread and the capture thread.
///
/// Only the main thread writes the session state; the capture thread only
/// raises the failure flag.
#[derive(Debug)]
pub struct SharedState {
    state: AtomicU8,
    capture_failed: AtomicBool,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Idle as u8),
            capture_failed: AtomicBool::new(false),
        }
    }

    pub fn load(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn store(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub fn mark_capture_failed(&self) {
        self.capture_failed.store(true, Ordering::SeqCst);
    }

    pub fn capture_failed(&self) -> bool {
        self.capture_failed.load(Ordering::SeqCst)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Position of the target for a session in `state`, `elapsed_secs` after
/// recording started.
///
/// Outside of recording the target rests in the top-left corner. Returns
/// `None` once the choreography is over.
pub fn target_position(state: SessionState, elapsed_secs: f64) -> Option<Position> {
    match state {
        SessionState::Recording => choreography::position_at(elapsed_secs),
        _ => Some(RESTING_POSITION),
    }
}

/// The calibration session driven by the main loop.
pub struct Session<D> {
    shared: Arc<SharedState>,
    capture: CaptureSupervisor<D>,
    /// Tick at which recording started.
    recording_start: Option<u64>,
    /// Report of the capture thread once it has been joined.
    capture_report: Option<LoopReport>,
}

impl<D> fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.shared.load())
            .field("recording_start", &self.recording_start)
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

impl<D: CaptureDevice + 'static> Session<D> {
    /// Start an idle session recording from `device`.
    pub fn new(device: D) -> Self {
        let shared = Arc::new(SharedState::new());
        Self {
            capture: CaptureSupervisor::new(device, Arc::clone(&shared)),
            shared,
            recording_start: None,
            capture_report: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.load()
    }

    /// Whether the capture thread stopped on a device error.
    pub fn capture_failed(&self) -> bool {
        self.shared.capture_failed()
    }

    /// Whether a capture thread is alive right now.
    pub fn is_capturing(&self) -> bool {
        self.capture.is_active()
    }

    /// Capture threads started so far.
    pub fn captures_spawned(&self) -> u32 {
        self.capture.spawned()
    }

    /// The capture thread's report, once it has been joined.
    pub fn capture_report(&self) -> Option<&LoopReport> {
        self.capture_report.as_ref()
    }

    /// React to one input event observed at tick `now`.
    pub fn handle_event(&mut self, event: InputEvent, now: u64) -> Result<(), SupervisorError> {
        match (event, self.state()) {
            (InputEvent::Quit, state) if state != SessionState::Quit => self.quit(),
            // Start recording when the user presses a key!
            (InputEvent::KeyUp, SessionState::Idle) => self.start_recording(now),
            // When done recording, quit upon a keypress.
            (InputEvent::KeyUp, SessionState::Done) => self.quit(),
            // Ignore all other kinds of events.
            _ => Ok(()),
        }
    }

    /// Advance the session to tick `now` and return where the target is.
    ///
    /// Ends the recording once the choreography is over, waiting for the
    /// capture thread before returning.
    pub fn update(&mut self, now: u64) -> Position {
        let state = self.state();
        match target_position(state, self.elapsed_secs(now)) {
            Some(position) => position,
            None => {
                self.finish_recording();
                RESTING_POSITION
            }
        }
    }

    /// Seconds since recording started, or zero if it never did.
    pub fn elapsed_secs(&self, now: u64) -> f64 {
        match self.recording_start {
            Some(start) => now.saturating_sub(start) as f64 / 1000.0,
            None => 0.0,
        }
    }

    /// Join any running capture thread and hand back the device.
    ///
    /// Returns `None` if the device was lost to a panicking capture thread.
    pub fn close(mut self) -> Option<D> {
        if self.capture.is_active() {
            self.shared.store(SessionState::Quit);
            self.join_capture();
        }
        self.capture.take_device()
    }

    fn start_recording(&mut self, now: u64) -> Result<(), SupervisorError> {
        self.recording_start = Some(now);
        // The state must read as recording before the thread's first check.
        self.transition(SessionState::Recording);
        self.capture.spawn()
    }

    fn finish_recording(&mut self) {
        self.transition(SessionState::Done);
        self.join_capture();
        if self.capture_failed() {
            log::warn!("Recording finished, but the capture stopped early; the session file is truncated");
        }
    }

    fn quit(&mut self) -> Result<(), SupervisorError> {
        self.transition(SessionState::Quit);
        self.join_capture();
        Ok(())
    }

    fn join_capture(&mut self) {
        if let Some(report) = self.capture.join() {
            self.capture_report = Some(report);
        }
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.shared.load();
        log::info!("Session {} -> {}", from, to);
        self.shared.store(to);
    }
}
