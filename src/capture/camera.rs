//! Webcam capture backend built on nokhwa.
//!
//! nokhwa cameras are not guaranteed to be `Send`, so the camera lives on a
//! grabber thread of its own and the device talks to it over channels. Each
//! acquisition asks the grabber for exactly one frame and blocks until it
//! arrives.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::{query, Camera};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::device::{CaptureDevice, DeviceError, DeviceStatus, StreamConfig, StreamKind};
use super::session_file::SessionWriter;

/// Commands sent to the grabber thread.
enum GrabCommand {
    Grab,
    Stop,
}

/// A grabbed frame: raw bytes plus the resolution the camera delivered.
type Grabbed = Result<(Vec<u8>, u32, u32), String>;

/// Webcam that records its color stream into a session file.
pub struct CameraDevice {
    writer: SessionWriter,
    color: StreamConfig,
    commands: Sender<GrabCommand>,
    frames: Receiver<Grabbed>,
    grabber: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraDevice")
            .field("color", &self.color)
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}

/// Describe the cameras on the system, one line each.
pub fn list_cameras() -> Result<Vec<String>, DeviceError> {
    let devices = query(ApiBackend::Auto).map_err(|e| DeviceError::Open(e.to_string()))?;
    Ok(devices
        .into_iter()
        .map(|d| {
            format!(
                "[{}] {} ({})",
                d.index().as_index().unwrap_or(0),
                d.human_name(),
                d.description()
            )
        })
        .collect())
}

impl CameraDevice {
    /// Open webcam `index` and create the session file.
    ///
    /// Webcams have no depth sensor, so only the color stream is recorded.
    pub fn open(index: u32, path: &Path, streams: &[StreamConfig]) -> Result<Self, DeviceError> {
        let color = streams
            .iter()
            .find(|s| s.kind == StreamKind::Color)
            .copied()
            .ok_or_else(|| DeviceError::Open("the camera backend needs a color stream".to_string()))?;
        color.validate()?;
        if streams.iter().any(|s| s.kind == StreamKind::Depth) {
            log::warn!("Depth stream requested but webcams have no depth sensor; recording color only");
        }

        let devices = query(ApiBackend::Auto).map_err(|e| DeviceError::Open(e.to_string()))?;
        if !devices
            .iter()
            .any(|d| d.index().as_index().map(|i| i == index).unwrap_or(false))
        {
            return Err(DeviceError::Open(format!("camera {} not found", index)));
        }

        let (command_tx, command_rx) = mpsc::channel();
        let (frame_tx, frame_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let grabber = thread::Builder::new()
            .name("camera-grabber".to_string())
            .spawn(move || run_grabber(index, color, command_rx, frame_tx, ready_tx))
            .map_err(|e| DeviceError::Open(e.to_string()))?;

        // Wait for the grabber to report whether the stream opened.
        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = grabber.join();
                return Err(DeviceError::Open(e));
            }
            Err(_) => {
                let _ = grabber.join();
                return Err(DeviceError::Open(
                    "camera thread terminated unexpectedly".to_string(),
                ));
            }
        }

        let writer = SessionWriter::create(path, &[color])?;
        log::info!("Camera {} recording {}x{}@{} into {:?}", index, color.width, color.height, color.fps, path);

        Ok(Self {
            writer,
            color,
            commands: command_tx,
            frames: frame_rx,
            grabber: Some(grabber),
        })
    }
}

impl CaptureDevice for CameraDevice {
    fn acquire_frame(&mut self) -> Result<DeviceStatus, DeviceError> {
        self.commands
            .send(GrabCommand::Grab)
            .map_err(|_| DeviceError::Acquire("camera thread has stopped".to_string()))?;

        let (data, width, height) = self
            .frames
            .recv()
            .map_err(|_| DeviceError::Acquire("camera thread has stopped".to_string()))?
            .map_err(DeviceError::Acquire)?;

        self.writer.write_frame(StreamKind::Color, &data)?;

        if (width, height) != (self.color.width, self.color.height) {
            return Ok(DeviceStatus::Warning {
                code: 2,
                message: format!(
                    "camera delivered {}x{} instead of {}x{}",
                    width, height, self.color.width, self.color.height
                ),
            });
        }
        Ok(DeviceStatus::Ready)
    }

    fn release_frame(&mut self) {
        // The grabbed buffer was copied out; nothing is held by the camera.
    }
}

impl Drop for CameraDevice {
    fn drop(&mut self) {
        let _ = self.commands.send(GrabCommand::Stop);
        if let Some(handle) = self.grabber.take() {
            let _ = handle.join();
        }
    }
}

fn run_grabber(
    index: u32,
    color: StreamConfig,
    commands: Receiver<GrabCommand>,
    frames: Sender<Grabbed>,
    ready: Sender<Result<(), String>>,
) {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
        CameraFormat::new(
            Resolution::new(color.width, color.height),
            FrameFormat::MJPEG,
            color.fps,
        ),
    ));

    let mut camera = match Camera::new(CameraIndex::Index(index), requested) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };
    if let Err(e) = camera.open_stream() {
        let _ = ready.send(Err(e.to_string()));
        return;
    }
    let _ = ready.send(Ok(()));

    // Exits on Stop or when the device side hangs up.
    while let Ok(GrabCommand::Grab) = commands.recv() {
        let grabbed = camera
            .frame()
            .map(|buffer| {
                let res = buffer.resolution();
                (buffer.buffer().to_vec(), res.width(), res.height())
            })
            .map_err(|e| e.to_string());
        if frames.send(grabbed).is_err() {
            break;
        }
    }

    let _ = camera.stop_stream();
}
