//! Capture device access and the background capture thread.
//!
//! - [`CaptureDevice`]: the seam to the camera (acquire/release one frame)
//! - [`SyntheticDevice`] and, with the `camera` feature, `CameraDevice`
//! - [`CaptureSupervisor`]: spawns and joins the single capture thread
//! - [`session_file`]: session file naming and layout

#[cfg(feature = "camera")]
mod camera;
mod capture_loop;
mod device;
pub mod session_file;
mod supervisor;
mod synthetic;

#[cfg(feature = "camera")]
pub use camera::{list_cameras, CameraDevice};
pub use capture_loop::{run_capture_loop, CaptureFailure, LoopReport};
pub use device::{CaptureDevice, DeviceError, DeviceStatus, StreamConfig, StreamKind};
pub use supervisor::{CaptureSupervisor, SupervisorError};
pub use synthetic::SyntheticDevice;
