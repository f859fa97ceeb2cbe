// THEORY:
// The `BackgroundModel` is the memory of what the empty scene looks like. During
// the calibration window it folds each incoming grayscale frame into a running
// mean; once the window has elapsed it freezes and never changes again.
//
// Key architectural principles:
// 1.  **Running Mean**: Frame `n` is blended in with weight `1/n`, so after `K`
//     frames the accumulator is exactly the arithmetic mean of those `K` frames,
//     without ever storing them.
// 2.  **Freeze Once**: The 8-bit reference used for differencing is derived a
//     single time, at the moment the model freezes. Every later frame compares
//     against the same immutable image.
// 3.  **Typed Misuse**: Feeding a frozen model or a frame of the wrong size is an
//     error, not a silent mutation.

use crate::error::{GuardError, Result};
use image::{GrayImage, Luma};
use tracing::debug;

/// How far through the calibration window the model is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationProgress {
    pub frames_seen: u32,
    pub window: u32,
}

impl CalibrationProgress {
    pub fn is_complete(&self) -> bool {
        self.frames_seen >= self.window
    }

    /// Completed share of the window in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.window == 0 {
            return 1.0;
        }
        (self.frames_seen as f64 / self.window as f64).min(1.0)
    }
}

/// Running-average model of the static background.
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    width: u32,
    height: u32,
    /// Number of frames that make up the calibration window.
    window: u32,
    /// Per-pixel running mean, row-major. Empty until the first frame arrives.
    accumulator: Vec<f64>,
    frames_seen: u32,
    /// Clamped and rounded accumulator, present once the model is frozen.
    reference: Option<GrayImage>,
}

impl BackgroundModel {
    pub fn new(width: u32, height: u32, window: u32) -> Self {
        Self {
            width,
            height,
            window,
            accumulator: Vec::with_capacity((width * height) as usize),
            frames_seen: 0,
            reference: None,
        }
    }

    /// Folds one grayscale frame into the running mean.
    ///
    /// The first frame seeds the accumulator; frame `n` afterwards is blended with
    /// weight `1/n`. When the window is full the model freezes.
    pub fn calibrate(&mut self, frame: &GrayImage) -> Result<CalibrationProgress> {
        if self.is_frozen() {
            return Err(GuardError::CalibrationFinished);
        }
        let (actual_width, actual_height) = frame.dimensions();
        if actual_width != self.width || actual_height != self.height {
            return Err(GuardError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width,
                actual_height,
            });
        }

        let frame_index = self.frames_seen + 1;
        if frame_index == 1 {
            self.accumulator = frame.as_raw().iter().map(|&p| f64::from(p)).collect();
        } else {
            let weight = 1.0 / f64::from(frame_index);
            for (acc, &pixel) in self.accumulator.iter_mut().zip(frame.as_raw()) {
                *acc = *acc * (1.0 - weight) + f64::from(pixel) * weight;
            }
        }
        self.frames_seen = frame_index;

        if self.frames_seen >= self.window {
            self.freeze();
        }
        Ok(self.progress())
    }

    fn freeze(&mut self) {
        let width = self.width as usize;
        let accumulator = &self.accumulator;
        let reference = GrayImage::from_fn(self.width, self.height, |x, y| {
            let mean = accumulator[y as usize * width + x as usize];
            Luma([mean.round().clamp(0.0, 255.0) as u8])
        });
        debug!(
            frames = self.frames_seen,
            width = self.width,
            height = self.height,
            "background reference frozen"
        );
        self.reference = Some(reference);
    }

    pub fn is_frozen(&self) -> bool {
        self.reference.is_some()
    }

    /// The 8-bit reference image. `None` until calibration has finished.
    pub fn reference(&self) -> Option<&GrayImage> {
        self.reference.as_ref()
    }

    /// The raw floating-point running mean, row-major.
    pub fn accumulator(&self) -> &[f64] {
        &self.accumulator
    }

    pub fn progress(&self) -> CalibrationProgress {
        CalibrationProgress {
            frames_seen: self.frames_seen,
            window: self.window,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
