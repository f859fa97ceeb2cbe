use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GuardError>;

#[derive(Debug, Error)]
pub enum GuardError {
    /// A configuration value is out of range. Raised once, at pipeline construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "frame is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// `calibrate` was called on a background model that is already frozen.
    #[error("background model is frozen, calibration already finished")]
    CalibrationFinished,

    #[error("frame source failed: {0}")]
    Source(String),

    #[error("report sink failed: {0}")]
    Sink(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}
