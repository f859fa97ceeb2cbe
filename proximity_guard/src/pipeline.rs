// THEORY:
// The `pipeline` module is the top-level API of the safety monitor. It owns every
// piece of state that lives across frames (the background model, the tracker's
// smoothed centroid, the debouncer's streak) as plain fields of one struct, so a
// pipeline can be built, fed synthetic frames and inspected without a camera.
//
// Each call to `process_frame` runs one frame through the full stack:
// resize -> grayscale -> (calibrate | segment -> track -> classify -> debounce)
// and returns a `FrameReport` for whatever sink is listening.

use crate::config::PipelineConfig;
use crate::core_modules::background_model::BackgroundModel;
use crate::core_modules::foreground_segmenter::ForegroundSegmenter;
use crate::core_modules::frame_rate::FrameRateMonitor;
use crate::core_modules::object_tracker::ObjectTracker;
use crate::core_modules::proximity_classifier::ProximityClassifier;
use crate::core_modules::state_debouncer::StateDebouncer;
use crate::error::Result;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use std::time::Instant;
use tracing::{debug, info};

// Re-export key data structures for the public API.
pub use crate::core_modules::background_model::CalibrationProgress;
pub use crate::core_modules::foreground_segmenter::ForegroundMask;
pub use crate::core_modules::object_tracker::{Centroid, Detection, Region};
pub use crate::core_modules::proximity_classifier::ProximityZone;

/// The result of classifying one frame after calibration.
#[derive(Debug, Clone)]
pub struct Assessment {
    /// 1-based index of the frame within the stream.
    pub frame_index: u64,
    /// The debounced zone that should be displayed.
    pub zone: ProximityZone,
    /// This frame's raw classification, before debouncing.
    pub candidate_zone: ProximityZone,
    /// Unsmoothed centroid of the tracked region.
    pub raw_centroid: Option<Centroid>,
    /// Smoothed centroid used for classification.
    pub centroid: Option<Centroid>,
    /// Enclosed area of the tracked region, in square pixels.
    pub region_area: Option<f64>,
    /// Horizontal distance from the smoothed centroid to the boundary line.
    pub boundary_distance: Option<u32>,
    pub mask: ForegroundMask,
    pub frames_per_second: f64,
}

/// The primary output of the pipeline for a single frame.
#[derive(Debug, Clone)]
pub enum FrameReport {
    /// The background is still being learned; no classification was made.
    Calibrating {
        frame_index: u64,
        progress: CalibrationProgress,
        frames_per_second: f64,
    },
    Monitoring(Assessment),
}

impl FrameReport {
    pub fn frame_index(&self) -> u64 {
        match self {
            FrameReport::Calibrating { frame_index, .. } => *frame_index,
            FrameReport::Monitoring(assessment) => assessment.frame_index,
        }
    }

    /// The displayed zone. Always SAFE while calibrating.
    pub fn zone(&self) -> ProximityZone {
        match self {
            FrameReport::Calibrating { .. } => ProximityZone::Safe,
            FrameReport::Monitoring(assessment) => assessment.zone,
        }
    }

    pub fn assessment(&self) -> Option<&Assessment> {
        match self {
            FrameReport::Calibrating { .. } => None,
            FrameReport::Monitoring(assessment) => Some(assessment),
        }
    }
}

/// The main, top-level struct for the monitor.
pub struct ProximityPipeline {
    config: PipelineConfig,
    background: BackgroundModel,
    segmenter: ForegroundSegmenter,
    tracker: ObjectTracker,
    classifier: ProximityClassifier,
    debouncer: StateDebouncer,
    frame_rate: FrameRateMonitor,
    frame_index: u64,
}

impl ProximityPipeline {
    /// Validates `config` and builds every stage from it.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            background: BackgroundModel::new(
                config.frame_width,
                config.frame_height,
                config.calibration_frames,
            ),
            segmenter: ForegroundSegmenter::new(&config),
            tracker: ObjectTracker::new(config.min_region_area, config.smoothing_alpha),
            classifier: ProximityClassifier::new(
                config.boundary_x,
                config.danger_distance,
                config.warning_distance,
            ),
            debouncer: StateDebouncer::new(config.stability_frames),
            frame_rate: FrameRateMonitor::new(Instant::now()),
            frame_index: 0,
            config,
        })
    }

    pub fn process_frame(&mut self, frame: &DynamicImage) -> Result<FrameReport> {
        self.process_frame_at(frame, Instant::now())
    }

    /// Same as `process_frame`, with the frame's wall-clock time supplied by the caller.
    pub fn process_frame_at(&mut self, frame: &DynamicImage, now: Instant) -> Result<FrameReport> {
        self.frame_index += 1;
        let frames_per_second = self.frame_rate.tick(now);
        let gray = self.prepare(frame);

        let mask = match self.background.reference() {
            Some(reference) => self.segmenter.segment(&gray, reference)?,
            None => return self.calibrate(&gray, frames_per_second),
        };
        let detection = self.tracker.update(&mask);

        let candidate_zone = self.classifier.classify(detection.smoothed.map(|c| c.x));
        let previous_zone = self.debouncer.committed();
        let zone = self.debouncer.update(candidate_zone);
        if zone != previous_zone {
            info!(
                frame = self.frame_index,
                from = %previous_zone,
                to = %zone,
                "committed zone changed"
            );
        }

        let region_area = detection.region.as_ref().map(Region::area);
        let boundary_distance = detection.smoothed.map(|c| self.classifier.distance(c.x));
        debug!(
            frame = self.frame_index,
            candidate = %candidate_zone,
            committed = %zone,
            area = ?region_area,
            centroid = ?detection.smoothed,
            distance = ?boundary_distance,
            "frame classified"
        );

        Ok(FrameReport::Monitoring(Assessment {
            frame_index: self.frame_index,
            zone,
            candidate_zone,
            raw_centroid: detection.raw,
            centroid: detection.smoothed,
            region_area,
            boundary_distance,
            mask,
            frames_per_second,
        }))
    }

    /// Feeds one frame into the background model while it is still learning.
    fn calibrate(&mut self, gray: &GrayImage, frames_per_second: f64) -> Result<FrameReport> {
        let progress = self.background.calibrate(gray)?;
        if progress.is_complete() {
            info!(
                frames = progress.frames_seen,
                "background calibration complete, monitoring started"
            );
        }
        Ok(FrameReport::Calibrating {
            frame_index: self.frame_index,
            progress,
            frames_per_second,
        })
    }

    /// Resizes to the configured resolution if needed and converts to grayscale.
    fn prepare(&self, frame: &DynamicImage) -> GrayImage {
        let (width, height) = (self.config.frame_width, self.config.frame_height);
        if frame.width() == width && frame.height() == height {
            return frame.to_luma8();
        }
        debug!(
            from_width = frame.width(),
            from_height = frame.height(),
            width,
            height,
            "resizing frame"
        );
        frame.resize_exact(width, height, FilterType::Triangle).to_luma8()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_calibrated(&self) -> bool {
        self.background.is_frozen()
    }

    pub fn calibration_progress(&self) -> CalibrationProgress {
        self.background.progress()
    }

    pub fn background(&self) -> &BackgroundModel {
        &self.background
    }

    /// The zone currently on display.
    pub fn committed_zone(&self) -> ProximityZone {
        self.debouncer.committed()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }
}
