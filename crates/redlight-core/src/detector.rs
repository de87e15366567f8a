use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::frame::{CHANNELS, Frame};

/// Sample every Nth pixel on both axes.
pub const DEFAULT_SAMPLE_STRIDE: u32 = 4;
/// Per-channel difference (0-255) above which a sample counts as changed.
pub const DEFAULT_COLOR_TOLERANCE: u8 = 40;

/// Fraction of changed samples above which a zone counts as moved.
///
/// Sensitivity 100 gives the strictest threshold (0.01), sensitivity 1 the most
/// lenient (0.1585). Values outside 1..=100 are clamped.
pub fn threshold(sensitivity: u8) -> f64 {
    let s = f64::from(sensitivity.clamp(1, 100));
    ((100.0 - s) / 100.0) * 0.15 + 0.01
}

/// Coarse frame-differencing motion check over strided RGB samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionDetector {
    pub sample_stride: u32,
    pub color_tolerance: u8,
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            color_tolerance: DEFAULT_COLOR_TOLERANCE,
        }
    }
}

impl MotionDetector {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_stride == 0 {
            return Err(ConfigError::ZeroSampleStride);
        }
        Ok(())
    }

    /// Share of sampled pixels whose R, G or B moved by more than the
    /// tolerance. `None` when the frames differ in size or there is nothing
    /// to sample.
    pub fn change_ratio(&self, current: &Frame, reference: &Frame) -> Option<f64> {
        if !current.same_dimensions(reference) || current.is_empty() {
            return None;
        }
        let stride = self.sample_stride.max(1) as usize;
        let width = current.width() as usize;
        let (cur, refr) = (current.data(), reference.data());

        let mut changed = 0u64;
        let mut total = 0u64;
        for py in (0..current.height() as usize).step_by(stride) {
            for px in (0..width).step_by(stride) {
                let i = (py * width + px) * CHANNELS;
                let moved = (0..3).any(|c| cur[i + c].abs_diff(refr[i + c]) > self.color_tolerance);
                if moved {
                    changed += 1;
                }
                total += 1;
            }
        }
        (total > 0).then(|| changed as f64 / total as f64)
    }

    /// Whether the occupant of a zone moved since `reference` was captured.
    pub fn has_moved(&self, current: &Frame, reference: &Frame, sensitivity: u8) -> bool {
        self.change_ratio(current, reference)
            .is_some_and(|ratio| ratio > threshold(sensitivity))
    }
}

/// [`MotionDetector::has_moved`] with the default stride and tolerance.
pub fn has_moved(current: &Frame, reference: &Frame, sensitivity: u8) -> bool {
    MotionDetector::default().has_moved(current, reference, sensitivity)
}
