use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use proximity_guard::pipeline::{ForegroundMask, ProximityZone};
use proximity_guard::{FrameReport, GuardError, ReportSink, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// How often calibration progress is logged, in frames.
const CALIBRATION_LOG_INTERVAL: u32 = 10;

/// Stands in for the display: logs zone changes and optionally dumps masks to disk.
pub struct LogSink {
    mask_dir: Option<PathBuf>,
    last_zone: ProximityZone,
}

impl LogSink {
    pub fn new(mask_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = &mask_dir {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            mask_dir,
            last_zone: ProximityZone::Safe,
        })
    }

    fn save_mask(&self, frame_index: u64, mask: &ForegroundMask) -> Result<()> {
        let Some(dir) = &self.mask_dir else {
            return Ok(());
        };
        let visual = mask.to_visual();
        let path = dir.join(format!("mask_{frame_index:06}.png"));
        let output = fs::File::create(&path)?;
        PngEncoder::new(output)
            .write_image(
                visual.as_raw(),
                visual.width(),
                visual.height(),
                image::ExtendedColorType::L8,
            )
            .map_err(|e| GuardError::Sink(format!("{}: {e}", path.display())))
    }
}

impl ReportSink for LogSink {
    fn publish(&mut self, report: &FrameReport) -> Result<()> {
        match report {
            FrameReport::Calibrating { progress, .. } => {
                if progress.is_complete() || progress.frames_seen % CALIBRATION_LOG_INTERVAL == 0 {
                    info!(
                        "calibrating background: {}/{}",
                        progress.frames_seen, progress.window
                    );
                }
            }
            FrameReport::Monitoring(assessment) => {
                if assessment.zone != self.last_zone {
                    match assessment.zone {
                        ProximityZone::Danger => warn!(
                            frame = assessment.frame_index,
                            centroid = ?assessment.centroid,
                            "DANGER: hand at the boundary"
                        ),
                        zone => info!(frame = assessment.frame_index, "state: {zone}"),
                    }
                    self.last_zone = assessment.zone;
                }
                debug!(
                    frame = assessment.frame_index,
                    fps = format_args!("{:.1}", assessment.frames_per_second),
                    "frame published"
                );
                self.save_mask(assessment.frame_index, &assessment.mask)?;
            }
        }
        Ok(())
    }
}
