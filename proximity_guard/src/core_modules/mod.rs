pub mod background_model;
pub mod foreground_segmenter;
pub mod frame_rate;
pub mod object_tracker;
pub mod proximity_classifier;
pub mod state_debouncer;
