//! Command-driven device controllers.
//!
//! Each controller owns one [`CommandChannel`](crate::pipeline::CommandChannel)
//! and the exclusive right to issue its kind of device command; the
//! device actor serializes them against each other and against the
//! capture loop.

pub mod focus;
pub mod recording;
pub mod still;

pub use focus::FocusController;
pub use recording::{RecordingController, RecordingState};
pub use still::StillCaptureController;

use std::time::{SystemTime, UNIX_EPOCH};

/// `{description}_{unix_ts}.{ext}` - the captures naming convention.
/// The description is a placeholder the UI layer renames later.
pub(crate) fn capture_filename(description: &str, ext: &str) -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{description}_{ts}.{ext}")
}
