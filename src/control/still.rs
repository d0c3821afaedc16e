//! On-demand full-resolution still capture.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::control::capture_filename;
use crate::device::DeviceHandle;
use crate::error::{Error, Result};
use crate::pipeline::CommandChannel;
use crate::stream::encode_jpeg;

/// JPEG quality for written stills, distinct from the bandwidth-tuned
/// stream quality.
const STILL_JPEG_QUALITY: u8 = 95;

pub struct StillCaptureController {
    device: DeviceHandle,
    trigger: Arc<CommandChannel>,
    captures_dir: PathBuf,
}

impl StillCaptureController {
    pub fn new(device: DeviceHandle, trigger: Arc<CommandChannel>, captures_dir: PathBuf) -> Self {
        Self {
            device,
            trigger,
            captures_dir,
        }
    }

    /// Handle consumed capture commands. The trigger surface is
    /// fire-and-forget, so failures surface here as logged capture
    /// failures, never as a crash.
    pub async fn run(self) {
        loop {
            self.trigger.recv().await;
            match self.capture_once().await {
                Ok(path) => info!(path = %path.display(), "Still captured"),
                Err(e) => warn!(error = %e, "Still capture failed"),
            }
        }
    }

    /// Capture one full-resolution frame and write it to the captures
    /// directory. Returns the written path.
    pub async fn capture_once(&self) -> Result<PathBuf> {
        let frame = self.device.capture_main().await?;
        let encoded = encode_jpeg(&frame, STILL_JPEG_QUALITY)?;

        let path = self.captures_dir.join(capture_filename("img", "jpg"));
        tokio::fs::write(&path, &encoded)
            .await
            .map_err(|source| Error::Persistence {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
