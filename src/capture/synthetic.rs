//! A capture device that needs no hardware.
//!
//! Frames are produced at the configured frame rate and recorded as small
//! descriptors (frame index and resolution) instead of pixel data, which
//! keeps the session file layout and timing of a real recording.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use super::device::{CaptureDevice, DeviceError, DeviceStatus, StreamConfig};
use super::session_file::SessionWriter;

/// Paced, file-backed stand-in for a depth/color camera.
#[derive(Debug)]
pub struct SyntheticDevice {
    writer: SessionWriter,
    streams: Vec<StreamConfig>,
    interval: Duration,
    next_due: Option<Instant>,
    frame_index: u64,
    locked: bool,
}

impl SyntheticDevice {
    /// Create the session file and get ready to produce frames.
    ///
    /// The slowest stream sets the pace.
    pub fn open(path: &Path, streams: &[StreamConfig]) -> Result<Self, DeviceError> {
        let fps = streams
            .iter()
            .map(|s| s.fps)
            .min()
            .ok_or_else(|| DeviceError::Open("no streams enabled".to_string()))?;

        let writer = SessionWriter::create(path, streams)?;
        log::info!(
            "Synthetic device recording {} stream(s) at {} fps into {:?}",
            streams.len(),
            fps,
            path
        );

        Ok(Self {
            writer,
            streams: streams.to_vec(),
            interval: Duration::from_secs(1) / fps.max(1),
            next_due: None,
            frame_index: 0,
            locked: false,
        })
    }

    /// Frames produced so far.
    pub fn frames(&self) -> u64 {
        self.frame_index
    }

    fn wait_for_next_frame(&mut self) {
        let now = Instant::now();
        let due = *self.next_due.get_or_insert(now);
        if due > now {
            thread::sleep(due - now);
        }
        // Never try to catch up on more than one missed frame.
        let after = Instant::now();
        let next = due + self.interval;
        self.next_due = Some(if next < after { after + self.interval } else { next });
    }

    fn descriptor(&self, stream: &StreamConfig) -> Vec<u8> {
        let mut payload = Vec::with_capacity(16);
        payload.extend_from_slice(&self.frame_index.to_le_bytes());
        payload.extend_from_slice(&stream.width.to_le_bytes());
        payload.extend_from_slice(&stream.height.to_le_bytes());
        payload
    }
}

impl CaptureDevice for SyntheticDevice {
    fn acquire_frame(&mut self) -> Result<DeviceStatus, DeviceError> {
        let status = if self.locked {
            self.locked = false;
            DeviceStatus::Warning {
                code: 1,
                message: "previous frame was never released".to_string(),
            }
        } else {
            DeviceStatus::Ready
        };

        self.wait_for_next_frame();

        for stream in self.streams.clone() {
            let payload = self.descriptor(&stream);
            self.writer.write_frame(stream.kind, &payload)?;
        }
        self.frame_index += 1;
        self.locked = true;

        Ok(status)
    }

    fn release_frame(&mut self) {
        self.locked = false;
    }
}

impl Drop for SyntheticDevice {
    fn drop(&mut self) {
        log::info!(
            "Synthetic device closed after {} frame(s) ({} record(s) in {:?})",
            self.frame_index,
            self.writer.frames(),
            self.writer.path()
        );
    }
}
