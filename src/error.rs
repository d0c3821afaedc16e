//! Error kinds for the monitoring core.
//!
//! Every component owns its failure boundary: device errors stay in the
//! capture path, sink errors stay in the motion sampler, persistence
//! errors stay in the still/recording controllers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Hardware-layer failure reported by the capture device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("recording control failed: {0}")]
    Recording(String),
    #[error("focus control failed: {0}")]
    Focus(String),
}

/// Motion-sink delivery failure, classified for logging.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink request timed out")]
    Timeout,
    #[error("sink connection failed: {0}")]
    Connect(String),
    #[error("sink rejected sample: HTTP {0}")]
    Status(u16),
}

/// Top-level error type for the node.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("failed to persist capture to {path}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("frame encode failed")]
    Encode(#[from] image::ImageError),

    /// The device actor's channel closed. Only happens during shutdown.
    #[error("device actor is gone")]
    ActorGone,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
