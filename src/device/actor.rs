//! Single-owner actor serializing all hardware access.
//!
//! The camera is one logical resource: a still capture must never
//! interleave with an in-progress preview capture, and recording
//! start/stop must not race focus moves. Every operation flows through
//! this actor's channel and executes one at a time.

use std::path::PathBuf;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::device::{CaptureDevice, Frame};
use crate::error::{DeviceError, Error, Result};

enum Request {
    CaptureLores {
        reply: oneshot::Sender<Result<Frame, DeviceError>>,
    },
    CaptureMain {
        reply: oneshot::Sender<Result<Frame, DeviceError>>,
    },
    StartRecording {
        path: PathBuf,
        reply: oneshot::Sender<Result<(), DeviceError>>,
    },
    StopRecording {
        reply: oneshot::Sender<Result<(), DeviceError>>,
    },
    SetFocus {
        value: f64,
        reply: oneshot::Sender<Result<(), DeviceError>>,
    },
}

/// Cloneable handle submitting requests to the device actor.
#[derive(Clone)]
pub struct DeviceHandle {
    tx: flume::Sender<Request>,
    max_focus: f64,
}

/// Owns the [`CaptureDevice`] and executes requests in arrival order.
pub struct DeviceActor<D: CaptureDevice> {
    device: D,
    rx: flume::Receiver<Request>,
}

impl<D: CaptureDevice> DeviceActor<D> {
    /// Wrap `device` and hand out the request channel.
    pub fn new(device: D) -> (Self, DeviceHandle) {
        let (tx, rx) = flume::bounded(16);
        let max_focus = device.max_focus();
        (Self { device, rx }, DeviceHandle { tx, max_focus })
    }

    /// Run until every handle is dropped.
    pub async fn run(mut self) {
        info!("Device actor started");
        while let Ok(req) = self.rx.recv_async().await {
            self.execute(req);
        }
        info!("Device actor stopped");
    }

    fn execute(&mut self, req: Request) {
        match req {
            Request::CaptureLores { reply } => {
                let _ = reply.send(self.device.capture_lores());
            }
            Request::CaptureMain { reply } => {
                let _ = reply.send(self.device.capture_main());
            }
            Request::StartRecording { path, reply } => {
                debug!(path = %path.display(), "Device recording start");
                let _ = reply.send(self.device.start_recording(&path));
            }
            Request::StopRecording { reply } => {
                debug!("Device recording stop");
                let _ = reply.send(self.device.stop_recording());
            }
            Request::SetFocus { value, reply } => {
                debug!(value, "Device focus move");
                let _ = reply.send(self.device.set_focus(value));
            }
        }
    }
}

impl DeviceHandle {
    pub async fn capture_lores(&self) -> Result<Frame> {
        self.request(|reply| Request::CaptureLores { reply }).await
    }

    pub async fn capture_main(&self) -> Result<Frame> {
        self.request(|reply| Request::CaptureMain { reply }).await
    }

    pub async fn start_recording(&self, path: PathBuf) -> Result<()> {
        self.request(|reply| Request::StartRecording { path, reply })
            .await
    }

    pub async fn stop_recording(&self) -> Result<()> {
        self.request(|reply| Request::StopRecording { reply }).await
    }

    pub async fn set_focus(&self, value: f64) -> Result<()> {
        self.request(|reply| Request::SetFocus { value, reply }).await
    }

    /// Upper bound of the device's lens range, cached at construction.
    pub fn max_focus(&self) -> f64 {
        self.max_focus
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, DeviceError>>) -> Request,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send_async(make(reply_tx))
            .await
            .map_err(|_| Error::ActorGone)?;
        reply_rx
            .await
            .map_err(|_| Error::ActorGone)?
            .map_err(Error::from)
    }
}
