// THEORY:
// The `ProximityClassifier` is a pure, stateless mapping from "where is the hand"
// to "how worried should we be." It measures only the horizontal distance to the
// boundary line; vertical position is irrelevant to the hazard.
//
// No tracked hand is SAFE. Holding the last zone through a detection gap is the
// debouncer's job, not this stage's.

use std::fmt;

/// Severity levels, ordered so that `Safe < Warning < Danger`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProximityZone {
    #[default]
    Safe,
    Warning,
    Danger,
}

impl ProximityZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProximityZone::Safe => "SAFE",
            ProximityZone::Warning => "WARNING",
            ProximityZone::Danger => "DANGER",
        }
    }
}

impl fmt::Display for ProximityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityClassifier {
    boundary_x: i32,
    danger_distance: u32,
    warning_distance: u32,
}

impl ProximityClassifier {
    pub fn new(boundary_x: i32, danger_distance: u32, warning_distance: u32) -> Self {
        Self {
            boundary_x,
            danger_distance,
            warning_distance,
        }
    }

    pub fn boundary_x(&self) -> i32 {
        self.boundary_x
    }

    /// Horizontal distance from `x` to the boundary line.
    pub fn distance(&self, x: i32) -> u32 {
        x.abs_diff(self.boundary_x)
    }

    pub fn classify(&self, centroid_x: Option<i32>) -> ProximityZone {
        let Some(x) = centroid_x else {
            return ProximityZone::Safe;
        };
        let distance = self.distance(x);
        if distance > self.warning_distance {
            ProximityZone::Safe
        } else if distance > self.danger_distance {
            ProximityZone::Warning
        } else {
            ProximityZone::Danger
        }
    }
}
