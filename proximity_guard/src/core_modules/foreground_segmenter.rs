// THEORY:
// The `ForegroundSegmenter` turns "how different is this frame from the empty
// scene" into a clean binary occupancy mask. It is a stateless utility: it owns
// only its tuning and produces a fresh mask for every frame.
//
// Algorithm steps:
// 1.  **Denoise**: Both the frame and the reference are Gaussian-blurred so that
//     sensor noise does not survive the per-pixel comparison.
// 2.  **Difference & Threshold**: The absolute difference is thresholded into a
//     {0,1} mask. Anything strictly above the threshold is foreground.
// 3.  **Opening**: Erosion followed by dilation with an elliptical structuring
//     element removes isolated speckle before it can be enlarged.
// 4.  **Regrow**: A final dilation restores the area the opening shaved off the
//     surviving blobs and slightly grows them, closing small gaps in a hand.
//
// The pixel primitives (blur, erosion, dilation) come from `imageproc`; this
// module only decides their order and parameters.

use crate::config::PipelineConfig;
use crate::error::{GuardError, Result};
use image::{GrayImage, Luma};
use imageproc::filter::separable_filter_equal;
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};

/// Binary occupancy grid. Every sample is either 0 (background) or 1 (foreground).
#[derive(Debug, Clone, PartialEq)]
pub struct ForegroundMask {
    image: GrayImage,
}

impl ForegroundMask {
    pub const BACKGROUND: u8 = 0;
    pub const FOREGROUND: u8 = 1;

    /// Builds a mask from any grayscale image: non-zero samples become foreground.
    pub fn from_gray(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let binary = GrayImage::from_fn(width, height, |x, y| {
            Luma([u8::from(image.get_pixel(x, y)[0] != 0)])
        });
        Self { image: binary }
    }

    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] == Self::FOREGROUND
    }

    pub fn foreground_count(&self) -> usize {
        self.image
            .as_raw()
            .iter()
            .filter(|&&v| v == Self::FOREGROUND)
            .count()
    }

    /// The underlying {0,1} image.
    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    /// A copy scaled to {0,255} for display or saving.
    pub fn to_visual(&self) -> GrayImage {
        let (width, height) = self.image.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            Luma([self.image.get_pixel(x, y)[0] * u8::MAX])
        })
    }
}

/// Background-subtraction stage of the pipeline.
#[derive(Debug, Clone)]
pub struct ForegroundSegmenter {
    /// Normalised 1-D Gaussian taps, applied along both axes. `None` disables blurring.
    blur_kernel: Option<Vec<f32>>,
    difference_threshold: u8,
    /// Radius of the disk structuring element (kernel size / 2).
    kernel_radius: u8,
    open_iterations: u32,
    dilate_iterations: u32,
}

impl ForegroundSegmenter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            blur_kernel: config
                .blur_sigma()
                .map(|sigma| gaussian_kernel(config.blur_kernel_size, sigma)),
            difference_threshold: config.difference_threshold,
            kernel_radius: config.morph_kernel_size / 2,
            open_iterations: config.open_iterations,
            dilate_iterations: config.dilate_iterations,
        }
    }

    /// Computes the cleaned foreground mask of `frame` against `reference`.
    pub fn segment(&self, frame: &GrayImage, reference: &GrayImage) -> Result<ForegroundMask> {
        if frame.dimensions() != reference.dimensions() {
            let (expected_width, expected_height) = reference.dimensions();
            let (actual_width, actual_height) = frame.dimensions();
            return Err(GuardError::DimensionMismatch {
                expected_width,
                expected_height,
                actual_width,
                actual_height,
            });
        }

        let frame = self.blur(frame);
        let reference = self.blur(reference);
        let mut mask = self.threshold(&frame, &reference);

        let element = Mask::disk(self.kernel_radius);
        for _ in 0..self.open_iterations {
            mask = grayscale_erode(&mask, &element);
        }
        for _ in 0..self.open_iterations + self.dilate_iterations {
            mask = grayscale_dilate(&mask, &element);
        }

        Ok(ForegroundMask { image: mask })
    }

    fn blur(&self, image: &GrayImage) -> GrayImage {
        match &self.blur_kernel {
            Some(kernel) => separable_filter_equal(image, kernel.as_slice()),
            None => image.clone(),
        }
    }

    fn threshold(&self, frame: &GrayImage, reference: &GrayImage) -> GrayImage {
        let (width, height) = frame.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            let delta = frame.get_pixel(x, y)[0].abs_diff(reference.get_pixel(x, y)[0]);
            Luma([u8::from(delta > self.difference_threshold)])
        })
    }
}

/// `size` Gaussian taps centred on the middle one, summing to 1.
fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let radius = (size / 2) as f32;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let offset = i as f32 - radius;
            (-(offset * offset) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}
