//! Construction and wiring of the monitoring pipeline.

use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::info;

use crate::control::{FocusController, RecordingController, StillCaptureController};
use crate::device::{CaptureDevice, DeviceActor};
use crate::error::{Error, Result};
use crate::motion::{MotionSampler, MotionSink};
use crate::pipeline::{CaptureHealth, CaptureLoop, CommandChannel, FrameBuffer};
use crate::stream::StreamDistributor;
use crate::NodeConfig;

/// The assembled monitoring node: owns every long-lived task and
/// exposes the command surface consumed by the HTTP layer.
///
/// All shared state is constructed here and injected into the
/// components; there are no module-level globals. Dropping the node
/// aborts its tasks.
pub struct MonitorNode {
    stream: StreamDistributor,
    toggle_recording: Arc<CommandChannel>,
    capture_still: Arc<CommandChannel>,
    recording: Arc<RecordingController>,
    focus: Arc<FocusController>,
    health: Arc<CaptureHealth>,
    tasks: Vec<JoinHandle<()>>,
}

impl MonitorNode {
    /// Build every component, spawn the long-lived tasks, and apply the
    /// configured default focus through the regular command path.
    pub async fn start<D: CaptureDevice>(device: D, config: NodeConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.recording.captures_dir)
            .await
            .map_err(|source| Error::Persistence {
                path: config.recording.captures_dir.clone(),
                source,
            })?;

        let (actor, device_handle) = DeviceActor::new(device);
        let buffer = FrameBuffer::new();
        let health = Arc::new(CaptureHealth::default());

        let stream = StreamDistributor::new(buffer.tap(), config.stream.jpeg_quality);

        let sink = MotionSink::new(config.motion.sink_url.clone(), config.motion.sink_timeout())?;
        let sampler = MotionSampler::new(buffer.tap(), sink, &config.motion);

        let capture_loop = CaptureLoop::new(
            device_handle.clone(),
            Arc::clone(&buffer),
            Arc::clone(&health),
            config.capture.fps,
            config.capture.failure_threshold,
        );

        let toggle_recording = Arc::new(CommandChannel::new());
        let capture_still = Arc::new(CommandChannel::new());
        let adjust_focus = Arc::new(CommandChannel::new());

        let recording = RecordingController::new(
            device_handle.clone(),
            Arc::clone(&toggle_recording),
            config.recording.captures_dir.clone(),
            config.recording.max_duration(),
            config.recording.cutoff_check(),
        );
        let still = StillCaptureController::new(
            device_handle.clone(),
            Arc::clone(&capture_still),
            config.recording.captures_dir.clone(),
        );
        let focus = FocusController::new(device_handle, Arc::clone(&adjust_focus));

        let tasks = vec![
            tokio::spawn(actor.run()),
            tokio::spawn(capture_loop.run()),
            tokio::spawn(sampler.run()),
            tokio::spawn(Arc::clone(&recording).run_toggle_loop()),
            tokio::spawn(Arc::clone(&recording).run_cutoff_timer()),
            tokio::spawn(still.run()),
            tokio::spawn(Arc::clone(&focus).run()),
        ];

        focus.request(config.capture.default_focus);

        info!(
            fps = config.capture.fps,
            captures_dir = %config.recording.captures_dir.display(),
            "Monitor node started"
        );

        Ok(Self {
            stream,
            toggle_recording,
            capture_still,
            recording,
            focus,
            health,
            tasks,
        })
    }

    /// Edge-triggered: repeated triggers before the controller drains
    /// coalesce into one capture.
    pub fn trigger_capture_still(&self) {
        self.capture_still.set();
    }

    /// Edge-triggered: repeated triggers before the controller drains
    /// coalesce into one transition.
    pub fn trigger_toggle_recording(&self) {
        self.toggle_recording.set();
    }

    /// Edge-triggered; out-of-range values are silently clamped.
    pub fn trigger_adjust_focus(&self, value: f64) {
        self.focus.request(value);
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_recording()
    }

    pub fn current_focus(&self) -> f64 {
        self.focus.current()
    }

    /// True while the capture loop is failing persistently.
    pub fn is_degraded(&self) -> bool {
        self.health.is_degraded()
    }

    /// Next encoded preview frame for a stream client.
    pub async fn next_stream_frame(&self) -> Result<Bytes> {
        self.stream.next_stream_frame().await
    }

    /// Abort every task. Steady-state deployments run for the process
    /// lifetime; tests use this for a defined teardown.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for MonitorNode {
    fn drop(&mut self) {
        self.shutdown();
    }
}
