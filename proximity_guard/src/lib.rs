// THEORY:
// This file is the main entry point for the `proximity_guard` library crate.
// It exposes the `ProximityPipeline` and its associated data structures
// (`PipelineConfig`, `FrameReport`, `ProximityZone`, etc.) as the high-level
// interface of the safety monitor. The per-stage analyzers live in
// `core_modules` and can be driven individually when a caller needs finer control,
// but most consumers only ever construct a pipeline and feed it frames.
//
// Frame acquisition and presentation are not part of this crate. The `monitor`
// module defines the two seams (`FrameSource`, `ReportSink`) that a host
// application implements to connect a camera and a display.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod monitor;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{GuardError, Result};
pub use monitor::{FrameSource, ReportSink, RunSummary, run};
pub use pipeline::{Assessment, FrameReport, ProximityPipeline};
