//! Motion scoring over the preview stream.

pub mod backsub;
pub mod sink;

pub use backsub::BackgroundModel;
pub use sink::MotionSink;

use std::time::Duration;

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use tracing::{debug, warn};

use crate::device::{Frame, PixelFormat};
use crate::pipeline::FrameTap;
use crate::MotionConfig;

/// Throttled consumer scoring frames for motion and reporting each
/// sample to the external sink.
///
/// The reported score is the raw foreground ratio in `[0,1]` - no
/// post-scaling is applied; dynamic-range compression belongs to the
/// ingesting side.
pub struct MotionSampler {
    tap: FrameTap,
    model: BackgroundModel,
    sink: MotionSink,
    throttle: Duration,
    downsample: u32,
    blur_sigma: f32,
}

impl MotionSampler {
    pub fn new(tap: FrameTap, sink: MotionSink, config: &MotionConfig) -> Self {
        Self {
            tap,
            model: BackgroundModel::new(config.history),
            sink,
            throttle: Duration::from_millis(config.interval_ms),
            downsample: config.downsample.max(1),
            blur_sigma: config.blur_sigma,
        }
    }

    /// Run the sampling loop for the process lifetime. Sink failures
    /// are logged and dropped; they never slow the capture side.
    pub async fn run(mut self) {
        loop {
            let frame = self.tap.next().await;

            let Some(score) = self.score_frame(&frame) else {
                continue;
            };
            metrics::histogram!("motion_score").record(score);
            debug!(score, "Motion sample");

            if let Err(e) = self.sink.report(score).await {
                metrics::counter!("motion_sink_errors").increment(1);
                warn!(error = %e, "Motion sample delivery failed");
            }

            tokio::time::sleep(self.throttle).await;
        }
    }

    /// Downsample, blur, and feed the frame to the background model.
    /// Returns `None` for a frame whose buffer does not match its
    /// declared dimensions.
    fn score_frame(&mut self, frame: &Frame) -> Option<f64> {
        let Some(luma) = luma_image(frame) else {
            warn!(
                sequence = frame.meta.sequence,
                "Skipping malformed frame in motion scoring"
            );
            return None;
        };

        let small = imageops::resize(
            &luma,
            (frame.meta.width / self.downsample).max(1),
            (frame.meta.height / self.downsample).max(1),
            FilterType::Nearest,
        );
        let blurred = imageops::blur(&small, self.blur_sigma);

        let mask = self
            .model
            .apply(blurred.as_raw(), blurred.width(), blurred.height());
        let foreground: u64 = mask.iter().map(|&p| p as u64).sum();
        Some(foreground as f64 / (255.0 * mask.len() as f64))
    }
}

fn luma_image(frame: &Frame) -> Option<GrayImage> {
    let (w, h) = (frame.meta.width, frame.meta.height);
    match frame.meta.format {
        PixelFormat::Gray8 => GrayImage::from_raw(w, h, frame.data.to_vec()),
        PixelFormat::Rgb24 => {
            let rgb = RgbImage::from_raw(w, h, frame.data.to_vec())?;
            Some(imageops::grayscale(&rgb))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::FrameMetadata;
    use bytes::Bytes;
    use std::sync::Arc;
    use std::time::Instant;

    fn rgb_frame(sequence: u64, fill: u8, width: u32, height: u32) -> Frame {
        Frame {
            data: Bytes::from(vec![fill; (width * height * 3) as usize]),
            meta: Arc::new(FrameMetadata {
                sequence,
                width,
                height,
                format: PixelFormat::Rgb24,
            }),
            timestamp: Instant::now(),
        }
    }

    fn test_sampler(buffer: &Arc<crate::pipeline::FrameBuffer>) -> MotionSampler {
        let config = MotionConfig::default();
        let sink = MotionSink::new(
            "http://127.0.0.1:9/motion".to_string(),
            Duration::from_millis(100),
        )
        .unwrap();
        MotionSampler::new(buffer.tap(), sink, &config)
    }

    #[tokio::test]
    async fn constant_frames_score_zero_in_steady_state() {
        let buffer = crate::pipeline::FrameBuffer::new();
        let mut sampler = test_sampler(&buffer);

        let mut last = 1.0;
        for seq in 1..=10 {
            last = sampler
                .score_frame(&rgb_frame(seq, 90, 32, 16))
                .expect("well-formed frame");
            assert!((0.0..=1.0).contains(&last));
        }
        assert_eq!(last, 0.0);
    }

    #[tokio::test]
    async fn malformed_frame_is_skipped() {
        let buffer = crate::pipeline::FrameBuffer::new();
        let mut sampler = test_sampler(&buffer);

        let bad = Frame {
            data: Bytes::from_static(&[1, 2, 3]),
            meta: Arc::new(FrameMetadata {
                sequence: 1,
                width: 32,
                height: 16,
                format: PixelFormat::Rgb24,
            }),
            timestamp: Instant::now(),
        };
        assert!(sampler.score_frame(&bad).is_none());
    }
}
