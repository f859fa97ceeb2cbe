// THEORY:
// The `monitor` module is the seam between the pure pipeline and the outside
// world. A host application provides a `FrameSource` (camera, file, test
// fixture) and a `ReportSink` (display, alerting, logging) and `run` drives the
// strictly sequential capture -> process -> publish loop between them.
//
// The loop only ever stops between frames: at end of stream, when the stop flag
// is raised, or when the source, pipeline or sink fails. Failures are fatal and
// returned to the caller untouched; there is no retry.

use crate::error::Result;
use crate::pipeline::{FrameReport, ProximityPipeline, ProximityZone};
use image::DynamicImage;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

/// Pull-based provider of frames.
pub trait FrameSource {
    /// `Ok(Some(frame))` for the next frame, `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<DynamicImage>>;
}

/// Consumer of per-frame reports.
pub trait ReportSink {
    fn publish(&mut self, report: &FrameReport) -> Result<()>;
}

/// What a completed run looked like.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub calibration_frames: u64,
    /// Number of times the committed zone changed.
    pub zone_changes: u64,
    /// Frames on which the committed zone was DANGER.
    pub danger_frames: u64,
    pub final_zone: ProximityZone,
    /// True when the stop flag ended the run before the source was exhausted.
    pub stopped: bool,
}

/// Runs frames from `source` through `pipeline` into `sink` until the stream
/// ends, `stop` is raised, or something fails.
pub fn run<S, K>(
    pipeline: &mut ProximityPipeline,
    source: &mut S,
    sink: &mut K,
    stop: &AtomicBool,
) -> Result<RunSummary>
where
    S: FrameSource + ?Sized,
    K: ReportSink + ?Sized,
{
    let mut summary = RunSummary {
        final_zone: pipeline.committed_zone(),
        ..RunSummary::default()
    };

    loop {
        if stop.load(Ordering::SeqCst) {
            info!(frames = summary.frames_processed, "stop requested");
            summary.stopped = true;
            break;
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!(frames = summary.frames_processed, "end of stream");
                break;
            }
            Err(e) => {
                error!(frame = summary.frames_processed + 1, "frame read failed: {e}");
                return Err(e);
            }
        };

        let report = pipeline.process_frame(&frame)?;
        sink.publish(&report)?;

        summary.frames_processed += 1;
        match &report {
            FrameReport::Calibrating { .. } => summary.calibration_frames += 1,
            FrameReport::Monitoring(assessment) => {
                if assessment.zone != summary.final_zone {
                    summary.zone_changes += 1;
                }
                if assessment.zone == ProximityZone::Danger {
                    summary.danger_frames += 1;
                }
            }
        }
        summary.final_zone = report.zone();
    }

    Ok(summary)
}
