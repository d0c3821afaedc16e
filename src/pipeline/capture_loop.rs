//! Producer task driving the device at its native cadence.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::device::DeviceHandle;
use crate::error::Error;
use crate::pipeline::FrameBuffer;

/// Degraded-health signal for the monitoring layer: raised after a run
/// of consecutive capture failures, cleared by the next success.
#[derive(Default)]
pub struct CaptureHealth {
    degraded: AtomicBool,
    consecutive_failures: AtomicU32,
}

impl CaptureHealth {
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    fn record_failure(&self, threshold: u32) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= threshold {
            self.degraded.store(true, Ordering::Relaxed);
        }
    }

    fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.degraded.store(false, Ordering::Relaxed);
    }
}

/// Sole writer of the [`FrameBuffer`].
pub struct CaptureLoop {
    device: DeviceHandle,
    buffer: Arc<FrameBuffer>,
    health: Arc<CaptureHealth>,
    cadence: Duration,
    failure_threshold: u32,
}

impl CaptureLoop {
    pub fn new(
        device: DeviceHandle,
        buffer: Arc<FrameBuffer>,
        health: Arc<CaptureHealth>,
        fps: u32,
        failure_threshold: u32,
    ) -> Self {
        Self {
            device,
            buffer,
            health,
            cadence: Duration::from_secs(1) / fps.max(1),
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// Run at the capture cadence for the process lifetime.
    ///
    /// A tick where the previous publish is still untaken skips the
    /// capture entirely instead of blocking or queueing. Recency over
    /// completeness.
    pub async fn run(self) {
        let mut ticker = interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if self.buffer.pending() {
                metrics::counter!("capture_skipped").increment(1);
                continue;
            }

            match self.device.capture_lores().await {
                Ok(frame) => {
                    self.health.record_success();
                    metrics::counter!("frames_captured").increment(1);
                    self.buffer.publish(frame);
                }
                Err(Error::ActorGone) => {
                    debug!("Device actor gone, capture loop exiting");
                    break;
                }
                Err(e) => {
                    self.health.record_failure(self.failure_threshold);
                    metrics::counter!("capture_errors").increment(1);
                    warn!(error = %e, "Preview capture failed");
                }
            }
        }
    }
}
