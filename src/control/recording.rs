//! Recording state machine with autonomous duration cutoff.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::time::interval;
use tracing::{info, warn};

use crate::control::capture_filename;
use crate::device::DeviceHandle;
use crate::pipeline::CommandChannel;

/// Exclusive recording state. Transitions happen only inside the
/// controller, either from a consumed toggle command or from the cutoff
/// timer.
#[derive(Debug, Clone)]
pub enum RecordingState {
    Idle,
    Recording { started_at: Instant, path: PathBuf },
}

pub struct RecordingController {
    device: DeviceHandle,
    toggle: Arc<CommandChannel>,
    state: Mutex<RecordingState>,
    /// Makes whole transitions mutually exclusive between the toggle
    /// handler and the cutoff timer; `state` alone only guards the
    /// snapshot.
    transition: tokio::sync::Mutex<()>,
    captures_dir: PathBuf,
    max_duration: Duration,
    cutoff_check: Duration,
}

impl RecordingController {
    pub fn new(
        device: DeviceHandle,
        toggle: Arc<CommandChannel>,
        captures_dir: PathBuf,
        max_duration: Duration,
        cutoff_check: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            device,
            toggle,
            state: Mutex::new(RecordingState::Idle),
            transition: tokio::sync::Mutex::new(()),
            captures_dir,
            max_duration,
            cutoff_check,
        })
    }

    pub fn is_recording(&self) -> bool {
        matches!(*self.state.lock().unwrap(), RecordingState::Recording { .. })
    }

    /// Handle consumed toggle commands. Triggers that pile up while a
    /// toggle is pending coalesce into one transition.
    pub async fn run_toggle_loop(self: Arc<Self>) {
        loop {
            self.toggle.recv().await;
            self.toggle_recording().await;
        }
    }

    /// Periodically stop recordings that exceeded the maximum duration.
    /// The check is a no-op while idle; this is the only self-triggered
    /// transition.
    pub async fn run_cutoff_timer(self: Arc<Self>) {
        let mut ticker = interval(self.cutoff_check);
        loop {
            ticker.tick().await;

            let _guard = self.transition.lock().await;
            let expired = match *self.state.lock().unwrap() {
                RecordingState::Recording { started_at, .. } => {
                    started_at.elapsed() >= self.max_duration
                }
                RecordingState::Idle => false,
            };
            if expired {
                info!(
                    max_secs = self.max_duration.as_secs(),
                    "Recording reached maximum duration"
                );
                self.stop().await;
            }
        }
    }

    async fn toggle_recording(&self) {
        let _guard = self.transition.lock().await;
        if self.is_recording() {
            self.stop().await;
        } else {
            self.start().await;
        }
    }

    /// Caller must hold the transition guard.
    async fn start(&self) {
        let path = self.captures_dir.join(capture_filename("unnamed", "mp4"));
        match self.device.start_recording(path.clone()).await {
            Ok(()) => {
                info!(path = %path.display(), "Recording started");
                *self.state.lock().unwrap() = RecordingState::Recording {
                    started_at: Instant::now(),
                    path,
                };
            }
            Err(e) => warn!(error = %e, "Failed to start recording"),
        }
    }

    /// Caller must hold the transition guard. The state returns to Idle
    /// even if the device refuses the stop; the encoder's fate is the
    /// driver's problem.
    async fn stop(&self) {
        if let Err(e) = self.device.stop_recording().await {
            warn!(error = %e, "Failed to stop recording cleanly");
        }
        *self.state.lock().unwrap() = RecordingState::Idle;
        info!("Recording stopped");
    }
}
