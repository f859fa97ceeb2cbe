use std::time::{Duration, Instant};

/// Inter-frame rate estimate. Diagnostic only; nothing downstream of
/// classification reads it.
#[derive(Debug, Clone)]
pub struct FrameRateMonitor {
    previous: Instant,
    rate: f64,
}

impl FrameRateMonitor {
    /// The first `tick` measures from `start`.
    pub fn new(start: Instant) -> Self {
        Self {
            previous: start,
            rate: 0.0,
        }
    }

    /// Records a frame at `now` and returns the frames-per-second estimate.
    /// A zero interval (clock resolution) keeps the previous estimate.
    pub fn tick(&mut self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.previous);
        if elapsed > Duration::ZERO {
            self.rate = 1.0 / elapsed.as_secs_f64();
        }
        self.previous = now;
        self.rate
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}
