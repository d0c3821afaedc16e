//! On-demand lens focus adjustment.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::device::DeviceHandle;
use crate::pipeline::CommandChannel;

/// Forwards clamped focus requests to the device. Out-of-range input is
/// silently clamped into `[0, max_focus]`, never an error.
pub struct FocusController {
    device: DeviceHandle,
    trigger: Arc<CommandChannel>,
    /// Last externally requested position, read when the command drains.
    requested: Mutex<f64>,
    /// Last position actually sent to the device, post-clamp.
    applied: Mutex<f64>,
}

impl FocusController {
    pub fn new(device: DeviceHandle, trigger: Arc<CommandChannel>) -> Arc<Self> {
        Arc::new(Self {
            device,
            trigger,
            requested: Mutex::new(0.0),
            applied: Mutex::new(0.0),
        })
    }

    /// Record the desired position and mark the command pending.
    /// Requests that pile up before the drain coalesce; the latest
    /// value wins.
    pub fn request(&self, value: f64) {
        // A non-finite request can never reach the lens.
        let value = if value.is_finite() { value } else { 0.0 };
        *self.requested.lock().unwrap() = value;
        self.trigger.set();
    }

    /// Last clamped position forwarded to the device.
    pub fn current(&self) -> f64 {
        *self.applied.lock().unwrap()
    }

    /// Handle consumed focus commands.
    pub async fn run(self: Arc<Self>) {
        loop {
            self.trigger.recv().await;

            let requested = *self.requested.lock().unwrap();
            let clamped = requested.clamp(0.0, self.device.max_focus());
            if clamped != requested {
                debug!(requested, clamped, "Focus request clamped");
            }

            match self.device.set_focus(clamped).await {
                Ok(()) => {
                    *self.applied.lock().unwrap() = clamped;
                    debug!(position = clamped, "Focus applied");
                }
                Err(e) => warn!(error = %e, "Focus adjustment failed"),
            }
        }
    }
}
