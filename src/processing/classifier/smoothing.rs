//! Majority-vote smoothing of raw classifications

use crate::acquisition::ring_buffer::SampleWindow;
use crate::config::constants::classifier::PRIOR_VOTE_CONFIDENCE;
use crate::config::SmoothingConfig;
use crate::error::{BioError, BioResult};
use crate::types::StateLabel;
use serde::{Deserialize, Serialize};

/// Externally reported state after smoothing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedState {
    pub label: StateLabel,
    /// Mean confidence of the recent votes for `label`
    pub confidence: f32,
    /// The reported label changed on this update
    pub changed: bool,
}

/// Reports a label only once it holds `min_votes` of the last K predictions.
///
/// The vote history starts out full of Neutral votes, so the first
/// non-Neutral prediction can never flip the reported state on its own.
#[derive(Debug, Clone)]
pub struct MajorityVoteSmoother {
    votes: SampleWindow<(StateLabel, f32)>,
    min_votes: usize,
    current: StateLabel,
    transitions: u64,
}

impl MajorityVoteSmoother {
    pub fn new(config: &SmoothingConfig) -> BioResult<Self> {
        if config.vote_window == 0
            || config.min_votes <= config.vote_window / 2
            || config.min_votes > config.vote_window
        {
            return Err(BioError::configuration(
                "smoothing",
                format!(
                    "min_votes {} must be a strict majority of vote_window {}",
                    config.min_votes, config.vote_window
                ),
            ));
        }

        let votes = SampleWindow::new(config.vote_window)
            .map_err(|e| BioError::configuration("smoothing", e.to_string()))?;
        let mut smoother = Self {
            votes,
            min_votes: config.min_votes,
            current: StateLabel::Neutral,
            transitions: 0,
        };
        smoother.prefill();
        Ok(smoother)
    }

    fn prefill(&mut self) {
        self.votes.clear();
        for _ in 0..self.votes.capacity() {
            self.votes.push((StateLabel::Neutral, PRIOR_VOTE_CONFIDENCE));
        }
    }

    /// Add one raw prediction and return the reported state
    pub fn update(&mut self, label: StateLabel, confidence: f32) -> SmoothedState {
        self.votes.push((label, confidence.clamp(0.0, 1.0)));

        let mut counts = [0usize; 5];
        for (vote, _) in self.votes.iter() {
            counts[vote.index()] += 1;
        }

        // Ties go to the label currently reported
        let mut leader = self.current;
        for candidate in StateLabel::ALL {
            if counts[candidate.index()] > counts[leader.index()] {
                leader = candidate;
            }
        }

        let changed = leader != self.current && counts[leader.index()] >= self.min_votes;
        if changed {
            self.current = leader;
            self.transitions += 1;
        }

        SmoothedState {
            label: self.current,
            confidence: self.mean_confidence(self.current),
            changed,
        }
    }

    fn mean_confidence(&self, label: StateLabel) -> f32 {
        let (sum, count) = self
            .votes
            .iter()
            .filter(|(vote, _)| *vote == label)
            .fold((0.0f32, 0usize), |(sum, count), (_, c)| (sum + c, count + 1));
        if count == 0 {
            0.0
        } else {
            (sum / count as f32).clamp(0.0, 1.0)
        }
    }

    pub fn current(&self) -> StateLabel {
        self.current
    }

    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    pub fn vote_window(&self) -> usize {
        self.votes.capacity()
    }

    /// Back to Neutral with a fresh vote history
    pub fn reset(&mut self) {
        self.prefill();
        self.current = StateLabel::Neutral;
        self.transitions = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoother() -> MajorityVoteSmoother {
        MajorityVoteSmoother::new(&SmoothingConfig::default()).unwrap()
    }

    #[test]
    fn test_requires_majority_to_switch() {
        let mut smoother = smoother();
        assert_eq!(smoother.update(StateLabel::Stressed, 0.9).label, StateLabel::Neutral);
        assert_eq!(smoother.update(StateLabel::Stressed, 0.9).label, StateLabel::Neutral);
        let third = smoother.update(StateLabel::Stressed, 0.9);
        assert_eq!(third.label, StateLabel::Stressed);
        assert!(third.changed);
        assert!((third.confidence - 0.9).abs() < 1e-6);
        assert_eq!(smoother.transition_count(), 1);
    }

    #[test]
    fn test_single_outlier_does_not_flip() {
        let mut smoother = smoother();
        for _ in 0..5 {
            smoother.update(StateLabel::Relaxed, 0.8);
        }
        let outlier = smoother.update(StateLabel::Stressed, 0.95);
        assert_eq!(outlier.label, StateLabel::Relaxed);
        assert!(!outlier.changed);
        assert!((outlier.confidence - 0.8).abs() < 1e-6);

        for _ in 0..4 {
            assert_eq!(smoother.update(StateLabel::Relaxed, 0.8).label, StateLabel::Relaxed);
        }
        assert_eq!(smoother.transition_count(), 1);
    }

    #[test]
    fn test_split_votes_keep_current_state() {
        let mut smoother = smoother();
        for _ in 0..5 {
            smoother.update(StateLabel::Focused, 0.7);
        }
        smoother.update(StateLabel::Relaxed, 0.7);
        smoother.update(StateLabel::Relaxed, 0.7);
        smoother.update(StateLabel::Stressed, 0.7);
        let state = smoother.update(StateLabel::Stressed, 0.7);
        // Focused 1, Relaxed 2, Stressed 2: nobody reaches 3 votes
        assert_eq!(state.label, StateLabel::Focused);
    }

    #[test]
    fn test_reset() {
        let mut smoother = smoother();
        for _ in 0..5 {
            smoother.update(StateLabel::Fatigued, 0.7);
        }
        smoother.reset();
        assert_eq!(smoother.current(), StateLabel::Neutral);
        assert_eq!(smoother.transition_count(), 0);
        assert_eq!(smoother.update(StateLabel::Fatigued, 0.7).label, StateLabel::Neutral);
    }

    #[test]
    fn test_rejects_non_majority_config() {
        let config = SmoothingConfig {
            vote_window: 4,
            min_votes: 2,
        };
        assert!(MajorityVoteSmoother::new(&config).is_err());
    }
}
