//! Live-view frame distribution.

pub mod encoder;

pub use encoder::encode_jpeg;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::trace;

use crate::error::Result;
use crate::pipeline::FrameTap;

/// Converts fresh preview frames into JPEG bytes for stream clients.
///
/// Concurrency policy: all callers serialize onto one frame cursor, so
/// simultaneous viewers share the same draw order and can never race a
/// take. Every call yields a distinct frame, in publish order. The JPEG
/// quality is fixed at construction, tuned for bandwidth rather than
/// caller preference.
pub struct StreamDistributor {
    tap: Mutex<FrameTap>,
    quality: u8,
}

impl StreamDistributor {
    pub fn new(tap: FrameTap, quality: u8) -> Self {
        Self {
            tap: Mutex::new(tap),
            quality,
        }
    }

    /// Suspend until a frame nobody has streamed yet is published, take
    /// it, and encode it. Encode failures go to the caller, never back
    /// into the capture path.
    pub async fn next_stream_frame(&self) -> Result<Bytes> {
        let frame = {
            let mut tap = self.tap.lock().await;
            tap.next().await
        };

        // Encode outside the tap lock so a slow encode for one client
        // does not hold up the take of the next.
        let encoded = encode_jpeg(&frame, self.quality)?;
        trace!(bytes = encoded.len(), "Encoded stream frame");
        Ok(encoded)
    }
}
