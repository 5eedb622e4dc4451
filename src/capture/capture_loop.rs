//! Background capture thread body.

use crate::session::{SessionState, SharedState};

use super::device::{CaptureDevice, DeviceError, DeviceStatus};

/// Why a capture loop stopped early.
#[derive(Debug, thiserror::Error)]
pub enum CaptureFailure {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("capture thread panicked")]
    Panicked,
}

/// What a capture loop did before it exited.
#[derive(Debug, Default)]
pub struct LoopReport {
    /// Frames acquired and released.
    pub frames: u64,
    /// Acquisitions that came with a device warning.
    pub warnings: u64,
    pub failure: Option<CaptureFailure>,
}

impl LoopReport {
    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Pull frames from `device` for as long as the session is recording.
///
/// The state is checked before every acquisition; since acquiring blocks for
/// up to a frame interval, one more frame may be pulled after recording ends.
/// A device error stops the loop for good and raises the session's failure
/// flag.
pub fn run_capture_loop<D: CaptureDevice + ?Sized>(
    device: &mut D,
    shared: &SharedState,
) -> LoopReport {
    let mut report = LoopReport::default();

    // Only record when we should be recording.
    while shared.load() == SessionState::Recording {
        // Waits until a new frame is available and locks it.
        match device.acquire_frame() {
            Ok(DeviceStatus::Ready) => {}
            Ok(DeviceStatus::Warning { code, message }) => {
                report.warnings += 1;
                log::warn!("Capture device warning #{}: {}", code, message);
            }
            Err(e) => {
                log::error!("Capture device error, stopping capture: {}", e);
                shared.mark_capture_failed();
                report.failure = Some(CaptureFailure::Device(e));
                break;
            }
        }

        device.release_frame();
        report.frames += 1;
    }

    log::debug!(
        "Capture loop exited after {} frame(s), {} warning(s)",
        report.frames,
        report.warnings
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays scripted acquisition results, then stops the session.
    struct ScriptedDevice<'a> {
        script: VecDeque<Result<DeviceStatus, DeviceError>>,
        shared: &'a SharedState,
        acquired: u32,
        released: u32,
    }

    impl<'a> ScriptedDevice<'a> {
        fn new(shared: &'a SharedState, script: Vec<Result<DeviceStatus, DeviceError>>) -> Self {
            Self {
                script: script.into(),
                shared,
                acquired: 0,
                released: 0,
            }
        }
    }

    // SharedState is Sync, so the borrowed device is still Send.
    impl CaptureDevice for ScriptedDevice<'_> {
        fn acquire_frame(&mut self) -> Result<DeviceStatus, DeviceError> {
            self.acquired += 1;
            let next = self.script.pop_front().unwrap_or(Ok(DeviceStatus::Ready));
            if self.script.is_empty() {
                self.shared.store(SessionState::Done);
            }
            next
        }

        fn release_frame(&mut self) {
            self.released += 1;
        }
    }

    #[test]
    fn test_loop_does_not_run_outside_recording() {
        let shared = SharedState::new();
        let mut device = ScriptedDevice::new(&shared, vec![Ok(DeviceStatus::Ready)]);
        let report = run_capture_loop(&mut device, &shared);
        assert_eq!(device.acquired, 0);
        assert_eq!(report.frames, 0);
        assert!(!report.failed());
    }

    #[test]
    fn test_loop_releases_every_frame() {
        let shared = SharedState::new();
        shared.store(SessionState::Recording);
        let mut device = ScriptedDevice::new(
            &shared,
            vec![
                Ok(DeviceStatus::Ready),
                Ok(DeviceStatus::Ready),
                Ok(DeviceStatus::Ready),
            ],
        );
        let report = run_capture_loop(&mut device, &shared);
        assert_eq!(device.acquired, 3);
        assert_eq!(device.released, 3);
        assert_eq!(report.frames, 3);
        assert!(!shared.capture_failed());
    }

    #[test]
    fn test_warnings_do_not_stop_the_loop() {
        let shared = SharedState::new();
        shared.store(SessionState::Recording);
        let mut device = ScriptedDevice::new(
            &shared,
            vec![
                Ok(DeviceStatus::Warning {
                    code: 5,
                    message: "stream config changed".to_string(),
                }),
                Ok(DeviceStatus::Ready),
            ],
        );
        let report = run_capture_loop(&mut device, &shared);
        assert_eq!(report.frames, 2);
        assert_eq!(report.warnings, 1);
        assert!(!report.failed());
    }

    #[test]
    fn test_error_stops_without_release() {
        let shared = SharedState::new();
        shared.store(SessionState::Recording);
        let mut device = ScriptedDevice::new(
            &shared,
            vec![
                Err(DeviceError::Acquire("unplugged".to_string())),
                Ok(DeviceStatus::Ready),
            ],
        );
        let report = run_capture_loop(&mut device, &shared);
        assert_eq!(device.acquired, 1);
        assert_eq!(device.released, 0);
        assert_eq!(report.frames, 0);
        assert!(matches!(
            report.failure,
            Some(CaptureFailure::Device(DeviceError::Acquire(_)))
        ));
        assert!(shared.capture_failed());
        // The loop never writes the session state itself.
        assert_eq!(shared.load(), SessionState::Recording);
    }
}
