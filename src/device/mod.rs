pub mod actor;
pub mod frame;
pub mod stub;

pub use actor::{DeviceActor, DeviceHandle};
pub use frame::{Frame, FrameMetadata, PixelFormat};
pub use stub::StubDevice;

use std::path::Path;

use crate::error::DeviceError;

/// Capability interface over the camera hardware stack.
///
/// Implementations are driven exclusively by the device actor, one call
/// at a time, so they may assume no concurrent access. The real driver
/// (sensor configuration, autofocus, H.264 encoding) lives outside this
/// crate; [`StubDevice`] stands in for it in tests and hardware-less
/// runs.
pub trait CaptureDevice: Send + 'static {
    /// Grab the next low-resolution preview frame.
    fn capture_lores(&mut self) -> Result<Frame, DeviceError>;

    /// Grab a full-resolution still frame.
    fn capture_main(&mut self) -> Result<Frame, DeviceError>;

    /// Start encoding video to `path`.
    fn start_recording(&mut self, path: &Path) -> Result<(), DeviceError>;

    /// Stop an in-progress recording.
    fn stop_recording(&mut self) -> Result<(), DeviceError>;

    /// Move the lens. The value arrives pre-clamped to `[0, max_focus]`.
    fn set_focus(&mut self, value: f64) -> Result<(), DeviceError>;

    /// Upper bound of the lens position range.
    fn max_focus(&self) -> f64;
}
