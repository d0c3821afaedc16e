//! Argus camera monitoring core: one capture source fanned out to
//! independently paced consumers, plus edge-triggered device control.

pub mod control;
pub mod device;
pub mod error;
pub mod motion;
pub mod node;
pub mod pipeline;
pub mod stream;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use node::MonitorNode;

/// Node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub capture: CaptureConfig,
    pub stream: StreamConfig,
    pub motion: MotionConfig,
    pub recording: RecordingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub lores_width: u32,
    pub lores_height: u32,
    pub main_width: u32,
    pub main_height: u32,
    pub fps: u32,
    /// Lens position applied at startup.
    pub default_focus: f64,
    /// Consecutive capture failures before the degraded flag raises.
    pub failure_threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Fixed lossy quality for the live stream, tuned for bandwidth.
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Minimum delay between motion samples.
    pub interval_ms: u64,
    /// Integer downsampling factor applied before scoring.
    pub downsample: u32,
    /// Gaussian blur strength applied before scoring.
    pub blur_sigma: f32,
    /// Bounded history length of the background model.
    pub history: u32,
    /// Ingestion endpoint receiving each score as a decimal string.
    pub sink_url: String,
    pub sink_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory receiving still and video captures.
    pub captures_dir: PathBuf,
    pub max_duration_secs: u64,
    pub cutoff_check_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            lores_width: 768,
            lores_height: 432,
            main_width: 1920,
            main_height: 1080,
            fps: 30,
            default_focus: 2.0,
            failure_threshold: 10,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { jpeg_quality: 50 }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            downsample: 2,
            blur_sigma: 3.5,
            history: 3,
            sink_url: "http://127.0.0.1:5000/motion".to_string(),
            sink_timeout_secs: 4,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            captures_dir: PathBuf::from("static/captures"),
            max_duration_secs: 600,
            cutoff_check_secs: 5,
        }
    }
}

impl MotionConfig {
    pub fn sink_timeout(&self) -> Duration {
        Duration::from_secs(self.sink_timeout_secs)
    }
}

impl RecordingConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn cutoff_check(&self) -> Duration {
        Duration::from_secs(self.cutoff_check_secs.max(1))
    }
}
