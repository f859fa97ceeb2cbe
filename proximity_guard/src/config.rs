// THEORY:
// Every tunable constant of the monitor lives in `PipelineConfig`. Nothing in the
// core modules hard-codes a threshold; each analyzer copies what it needs out of
// the config when the pipeline is built. This keeps the per-frame path free of
// validation and lets tests drive the pipeline with tiny calibration windows or
// shifted boundaries.
//
// The config is plain serde data. Missing keys in a YAML file fall back to the
// defaults below, so a deployment file only has to name what it changes.

use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for the `ProximityPipeline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Width every frame is processed at, in pixels. Larger or smaller frames are resized.
    pub frame_width: u32,
    /// Height every frame is processed at, in pixels.
    pub frame_height: u32,
    /// Number of leading frames averaged into the background reference.
    pub calibration_frames: u32,
    /// Side of the square Gaussian kernel applied before differencing.
    /// Must be odd; 1 disables blurring.
    pub blur_kernel_size: u32,
    /// Minimum absolute intensity difference for a pixel to count as foreground (strictly greater).
    pub difference_threshold: u8,
    /// Diameter of the elliptical structuring element used to clean the mask. Must be odd.
    pub morph_kernel_size: u8,
    /// Erode/dilate passes of the opening that removes speckle.
    pub open_iterations: u32,
    /// Extra dilation passes applied after the opening to regrow surviving blobs.
    pub dilate_iterations: u32,
    /// A region must enclose strictly more than this many square pixels to be tracked.
    pub min_region_area: f64,
    /// Horizontal position of the virtual boundary line, in pixels.
    pub boundary_x: i32,
    /// At or below this horizontal distance from the boundary the zone is DANGER.
    pub danger_distance: u32,
    /// At or below this horizontal distance (and above `danger_distance`) the zone is WARNING.
    pub warning_distance: u32,
    /// Weight of the newest centroid measurement in the exponential moving average.
    pub smoothing_alpha: f64,
    /// Consecutive identical classifications needed before the displayed zone changes.
    pub stability_frames: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_width: 640,
            frame_height: 480,
            calibration_frames: 60,
            blur_kernel_size: 5,
            difference_threshold: 35,
            morph_kernel_size: 7,
            open_iterations: 1,
            dilate_iterations: 2,
            min_region_area: 1200.0,
            boundary_x: 300,
            danger_distance: 50,
            warning_distance: 120,
            smoothing_alpha: 0.6,
            stability_frames: 3,
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Checks every value once so the per-frame path never has to.
    pub fn validate(&self) -> Result<()> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(invalid(format!(
                "frame resolution must be non-zero, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        if self.calibration_frames == 0 {
            return Err(invalid("calibration_frames must be at least 1".into()));
        }
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(invalid(format!(
                "blur_kernel_size must be odd, got {}",
                self.blur_kernel_size
            )));
        }
        if self.morph_kernel_size % 2 == 0 {
            return Err(invalid(format!(
                "morph_kernel_size must be odd, got {}",
                self.morph_kernel_size
            )));
        }
        if self.difference_threshold == u8::MAX {
            return Err(invalid(
                "difference_threshold of 255 can never mark a pixel as foreground".into(),
            ));
        }
        if !self.min_region_area.is_finite() || self.min_region_area < 0.0 {
            return Err(invalid(format!(
                "min_region_area must be a non-negative number, got {}",
                self.min_region_area
            )));
        }
        if self.boundary_x < 0 || self.boundary_x >= self.frame_width as i32 {
            return Err(invalid(format!(
                "boundary_x {} lies outside a frame {} pixels wide",
                self.boundary_x, self.frame_width
            )));
        }
        if self.danger_distance >= self.warning_distance {
            return Err(invalid(format!(
                "danger_distance ({}) must be smaller than warning_distance ({})",
                self.danger_distance, self.warning_distance
            )));
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(invalid(format!(
                "smoothing_alpha must be in (0, 1], got {}",
                self.smoothing_alpha
            )));
        }
        if self.stability_frames == 0 {
            return Err(invalid("stability_frames must be at least 1".into()));
        }
        Ok(())
    }

    /// Gaussian sigma for `blur_kernel_size`, derived the way OpenCV does when sigma is
    /// left at zero.
    /// `None` when the kernel is a single pixel and blurring is a no-op.
    pub fn blur_sigma(&self) -> Option<f32> {
        if self.blur_kernel_size <= 1 {
            return None;
        }
        let k = self.blur_kernel_size as f32;
        Some(0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8)
    }
}

fn invalid(message: String) -> GuardError {
    GuardError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default()
            .validate()
            .expect("defaults must validate");
    }

    #[test]
    fn blur_sigma_matches_five_by_five_kernel() {
        let sigma = PipelineConfig::default().blur_sigma().unwrap();
        assert!((sigma - 1.1).abs() < 1e-6);

        let no_blur = PipelineConfig {
            blur_kernel_size: 1,
            ..PipelineConfig::default()
        };
        assert_eq!(no_blur.blur_sigma(), None);
    }

    #[test]
    fn rejects_inverted_distance_thresholds() {
        let config = PipelineConfig {
            danger_distance: 120,
            warning_distance: 50,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GuardError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_even_kernels() {
        let blur = PipelineConfig {
            blur_kernel_size: 4,
            ..PipelineConfig::default()
        };
        let morph = PipelineConfig {
            morph_kernel_size: 6,
            ..PipelineConfig::default()
        };
        assert!(blur.validate().is_err());
        assert!(morph.validate().is_err());
    }
}
