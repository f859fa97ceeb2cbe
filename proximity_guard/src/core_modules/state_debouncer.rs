// THEORY:
// The `StateDebouncer` is a hysteresis filter between the noisy per-frame zone
// and the zone the operator actually sees. A new zone is only committed after it
// has been computed for `threshold` consecutive frames; a one-frame blip never
// reaches the display.
//
// It never looks ahead and never reverts a commit on its own. The only way the
// committed zone changes is for a different candidate to win a full streak.

use crate::core_modules::proximity_classifier::ProximityZone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDebouncer {
    /// The zone currently shown downstream.
    committed: ProximityZone,
    /// The most recent raw classification.
    candidate: ProximityZone,
    /// How many consecutive frames `candidate` has been seen.
    streak: u32,
    threshold: u32,
}

impl StateDebouncer {
    pub fn new(threshold: u32) -> Self {
        Self {
            committed: ProximityZone::Safe,
            candidate: ProximityZone::Safe,
            streak: 0,
            threshold,
        }
    }

    /// Feeds one raw classification and returns the committed zone.
    pub fn update(&mut self, candidate: ProximityZone) -> ProximityZone {
        if candidate == self.candidate {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.candidate = candidate;
            self.streak = 1;
        }

        if self.streak >= self.threshold {
            self.committed = self.candidate;
        }
        self.committed
    }

    pub fn committed(&self) -> ProximityZone {
        self.committed
    }

    pub fn candidate(&self) -> ProximityZone {
        self.candidate
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.threshold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProximityZone::{Danger, Safe, Warning};

    fn trace(debouncer: &mut StateDebouncer, candidates: &[ProximityZone]) -> Vec<ProximityZone> {
        candidates.iter().map(|&c| debouncer.update(c)).collect()
    }

    #[test]
    fn commitment_lags_by_threshold_minus_one() {
        let mut debouncer = StateDebouncer::new(3);
        let committed = trace(&mut debouncer, &[Safe, Safe, Warning, Warning, Warning, Danger]);
        assert_eq!(committed, vec![Safe, Safe, Safe, Safe, Warning, Warning]);
        assert_eq!(debouncer.candidate(), Danger);
        assert_eq!(debouncer.streak(), 1);
    }

    #[test]
    fn single_frame_blip_is_suppressed() {
        let mut debouncer = StateDebouncer::new(3);
        let committed = trace(&mut debouncer, &[Safe, Safe, Safe, Danger, Safe, Safe]);
        assert!(committed.iter().all(|&z| z == Safe));
    }

    #[test]
    fn alternating_input_never_commits() {
        let mut debouncer = StateDebouncer::new(2);
        let committed = trace(&mut debouncer, &[Danger, Warning, Danger, Warning, Danger]);
        assert!(committed.iter().all(|&z| z == Safe));
    }

    #[test]
    fn commit_holds_until_a_new_streak_completes() {
        let mut debouncer = StateDebouncer::new(3);
        trace(&mut debouncer, &[Danger, Danger, Danger]);
        assert_eq!(debouncer.committed(), Danger);

        let committed = trace(&mut debouncer, &[Safe, Safe, Safe]);
        assert_eq!(committed, vec![Danger, Danger, Safe]);
    }

    #[test]
    fn threshold_of_one_follows_input() {
        let mut debouncer = StateDebouncer::new(1);
        let committed = trace(&mut debouncer, &[Warning, Danger, Safe]);
        assert_eq!(committed, vec![Warning, Danger, Safe]);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut debouncer = StateDebouncer::new(2);
        trace(&mut debouncer, &[Danger, Danger]);
        debouncer.reset();
        assert_eq!(debouncer, StateDebouncer::new(2));
    }
}
