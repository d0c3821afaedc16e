//! Adaptive per-pixel background model (mixture of Gaussians).

/// Modes tracked per pixel.
const MODES_PER_PIXEL: usize = 3;
/// Variance assigned to a newly created mode.
const INITIAL_VARIANCE: f32 = 225.0;
/// Floor/ceiling keeping mode variance out of degenerate territory.
const MIN_VARIANCE: f32 = 4.0;
const MAX_VARIANCE: f32 = 5.0 * INITIAL_VARIANCE;
/// Squared-distance match threshold, in units of mode variance.
const MATCH_THRESHOLD: f32 = 16.0;
/// Cumulative weight of the modes considered background.
const BACKGROUND_RATIO: f32 = 0.9;

#[derive(Clone, Copy, Default)]
struct Mode {
    weight: f32,
    mean: f32,
    variance: f32,
}

/// Bounded-history mixture-of-Gaussians background subtractor over
/// luma frames. No shadow detection.
///
/// Each pixel keeps up to [`MODES_PER_PIXEL`] weighted Gaussian modes,
/// sorted by weight. A sample within `sqrt(MATCH_THRESHOLD * var)` of a
/// mode updates that mode; otherwise the weakest mode is replaced. The
/// learning rate is `1 / min(frames_seen, history)`, so the model's
/// memory is bounded by the configured history length.
pub struct BackgroundModel {
    history: u32,
    frames_seen: u32,
    width: u32,
    height: u32,
    modes: Vec<[Mode; MODES_PER_PIXEL]>,
}

impl BackgroundModel {
    pub fn new(history: u32) -> Self {
        Self {
            history: history.max(1),
            frames_seen: 0,
            width: 0,
            height: 0,
            modes: Vec::new(),
        }
    }

    /// Feed one luma frame and return its foreground mask (0 or 255 per
    /// pixel). A dimension change resets the model.
    pub fn apply(&mut self, luma: &[u8], width: u32, height: u32) -> Vec<u8> {
        if (width, height) != (self.width, self.height) {
            self.reset(width, height);
        }
        debug_assert_eq!(luma.len(), (width * height) as usize);

        self.frames_seen = self.frames_seen.saturating_add(1);
        let alpha = 1.0 / self.frames_seen.min(self.history) as f32;

        luma.iter()
            .zip(self.modes.iter_mut())
            .map(|(&px, modes)| {
                if Self::apply_pixel(modes, px as f32, alpha) {
                    255
                } else {
                    0
                }
            })
            .collect()
    }

    fn reset(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.frames_seen = 0;
        self.modes.clear();
        self.modes
            .resize((width * height) as usize, [Mode::default(); MODES_PER_PIXEL]);
    }

    /// Update one pixel's mixture. Returns true when the sample is
    /// foreground.
    fn apply_pixel(modes: &mut [Mode; MODES_PER_PIXEL], value: f32, alpha: f32) -> bool {
        // Match against modes in descending weight order; a mode counts
        // as background while the cumulative weight ahead of it stays
        // under the background ratio.
        let mut matched = None;
        let mut background = false;
        let mut cumulative = 0.0f32;
        for (i, mode) in modes.iter().enumerate() {
            if mode.weight <= f32::EPSILON {
                break;
            }
            let in_background = cumulative < BACKGROUND_RATIO;
            cumulative += mode.weight;

            let d = value - mode.mean;
            if d * d < MATCH_THRESHOLD * mode.variance {
                matched = Some(i);
                background = in_background;
                break;
            }
        }

        match matched {
            Some(i) => {
                for (j, mode) in modes.iter_mut().enumerate() {
                    let target = if j == i { 1.0 } else { 0.0 };
                    mode.weight += alpha * (target - mode.weight);
                }
                let mode = &mut modes[i];
                let d = value - mode.mean;
                mode.mean += alpha * d;
                mode.variance =
                    (mode.variance + alpha * (d * d - mode.variance)).clamp(MIN_VARIANCE, MAX_VARIANCE);
            }
            None => {
                // Replace the weakest mode with a wide one centered on
                // the sample.
                modes[MODES_PER_PIXEL - 1] = Mode {
                    weight: alpha,
                    mean: value,
                    variance: INITIAL_VARIANCE,
                };
            }
        }

        let total: f32 = modes.iter().map(|m| m.weight).sum();
        if total > 0.0 {
            for mode in modes.iter_mut() {
                mode.weight /= total;
            }
        }
        modes.sort_unstable_by(|a, b| b.weight.total_cmp(&a.weight));

        matched.is_none() || !background
    }
}
