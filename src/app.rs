//! The main loop: one iteration per rendered frame.

use crate::capture::{CaptureDevice, SupervisorError};
use crate::clock::Clock;
use crate::frontend::{Frontend, FrontendError, Scene};
use crate::session::{Session, SessionState};

/// Errors that end the main loop.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),

    #[error("failed to start recording: {0}")]
    Capture(#[from] SupervisorError),
}

/// How a run went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub final_state: SessionState,
    /// Whether the session ever got to record.
    pub recorded: bool,
    /// Frames rendered by the frontend.
    pub frames_rendered: u64,
    /// Frames the capture thread pulled, if it ran and was joined.
    pub frames_captured: Option<u64>,
    pub capture_failed: bool,
}

/// Drive `session` until it quits.
///
/// Each frame drains every pending input event before the session advances,
/// then renders. The capture thread is joined before the first frame of the
/// done state is drawn. On error the session is left as is; dropping it stops
/// and joins any capture thread.
pub fn run<F, C, D>(
    frontend: &mut F,
    clock: &C,
    session: &mut Session<D>,
) -> Result<RunSummary, AppError>
where
    F: Frontend + ?Sized,
    C: Clock + ?Sized,
    D: CaptureDevice + 'static,
{
    let mut frames_rendered = 0;

    while session.state() != SessionState::Quit {
        // Handle all events before moving to the next frame!
        while let Some(event) = frontend.poll_event()? {
            session.handle_event(event, clock.ticks())?;
            if session.state() == SessionState::Quit {
                break;
            }
        }
        if session.state() == SessionState::Quit {
            break;
        }

        let target = session.update(clock.ticks());
        let scene = Scene::compose(session.state(), target, session.capture_failed());
        frontend.render(&scene)?;
        frames_rendered += 1;
    }

    let summary = RunSummary {
        final_state: session.state(),
        recorded: session.captures_spawned() > 0,
        frames_rendered,
        frames_captured: session.capture_report().map(|r| r.frames),
        capture_failed: session.capture_failed(),
    };
    log::info!(
        "Session ended after {} rendered frame(s), {} captured{}",
        summary.frames_rendered,
        summary.frames_captured.unwrap_or(0),
        if summary.capture_failed { " (capture failed)" } else { "" }
    );
    Ok(summary)
}
