//! Physiological state classification
//!
//! A strategy turns one feature vector into a raw `Classification`; the
//! rejection threshold maps weak winners to Neutral; a majority-vote
//! smoother decides what is reported externally.

pub mod learned;
pub mod rules;
pub mod smoothing;

use crate::acquisition::ring_buffer::SampleWindow;
use crate::config::{ClassifierConfig, StrategyKind, ThresholdTable};
use crate::error::{BioError, BioResult};
use crate::processing::features::FeatureVector;
use crate::processing::normalizer::StreamingNormalizer;
use crate::types::StateLabel;
use crate::utils::stats::least_squares_slope;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use learned::LinearModel;
pub use rules::{evaluate_rules, Bound, Condition, LimitingCondition, RuleFeature, RuleOutcome};
pub use smoothing::{MajorityVoteSmoother, SmoothedState};

/// Result of classifying one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: StateLabel,
    /// In [0, 1]
    pub confidence: f32,
    /// Per-label score indexed by `StateLabel::index`
    pub scores: [f32; 5],
    /// No candidate reached the rejection threshold
    pub rejected: bool,
    /// Weakest condition of the winning rule, or of the closest rule when
    /// rejected. Absent for the learned strategy.
    pub limiting: Option<LimitingCondition>,
}

impl Classification {
    /// Apply the reject-to-neutral policy to the best candidate
    fn decide(best: Option<(StateLabel, f32)>, scores: [f32; 5], rejection_threshold: f32) -> Self {
        match best {
            Some((label, score)) if score >= rejection_threshold => Self {
                label,
                confidence: score.clamp(0.0, 1.0),
                scores,
                rejected: false,
                limiting: None,
            },
            _ => {
                let best_score = scores.iter().copied().fold(0.0f32, f32::max);
                Self {
                    label: StateLabel::Neutral,
                    confidence: (1.0 - best_score).clamp(0.0, 1.0),
                    scores,
                    rejected: true,
                    limiting: None,
                }
            }
        }
    }

    /// Human-readable account of which threshold drove the decision
    pub fn explain(&self) -> String {
        match (self.rejected, self.limiting) {
            (false, Some(limit)) => format!("{}: {}", self.label, limit),
            (false, None) => format!("{}: score {:.2}", self.label, self.confidence),
            (true, Some(limit)) => format!("no state matched; closest {}: {}", limit.rule, limit),
            (true, None) => {
                let best = self.scores.iter().copied().fold(0.0f32, f32::max);
                format!("no state matched; best score {:.2}", best)
            }
        }
    }
}

/// Classification strategy behind the common classifier interface
#[derive(Debug, Clone)]
pub enum ClassifierStrategy {
    RuleBased(ThresholdTable),
    Learned(LinearModel),
}

impl ClassifierStrategy {
    pub fn from_config(config: &ClassifierConfig) -> BioResult<Self> {
        match config.strategy {
            StrategyKind::RuleBased => Ok(ClassifierStrategy::RuleBased(config.thresholds.clone())),
            StrategyKind::Learned => {
                let model = config.model.as_ref().ok_or_else(|| {
                    BioError::configuration("classifier", "learned strategy without a model")
                })?;
                Ok(ClassifierStrategy::Learned(LinearModel::from_config(model)?))
            }
        }
    }

    /// Classify one vector; `rms_trend` feeds the fatigue rule
    pub fn classify(
        &self,
        features: &FeatureVector,
        rms_trend: Option<f32>,
        rejection_threshold: f32,
    ) -> Classification {
        let mut scores = [0.0f32; 5];
        match self {
            ClassifierStrategy::RuleBased(table) => {
                let outcomes = evaluate_rules(table, features, rms_trend);
                for outcome in &outcomes {
                    scores[outcome.label.index()] = outcome.score;
                }
                // Precedence order: the first matching rule wins
                let winner = outcomes.iter().find(|outcome| outcome.matched());
                let mut classification = Classification::decide(
                    winner.map(|outcome| (outcome.label, outcome.score)),
                    scores,
                    rejection_threshold,
                );
                classification.limiting = if classification.rejected {
                    outcomes
                        .iter()
                        .filter(|outcome| outcome.limiting.is_some())
                        .max_by(|a, b| a.score.total_cmp(&b.score))
                        .and_then(|outcome| outcome.limiting)
                } else {
                    winner.and_then(|outcome| outcome.limiting)
                };
                classification
            }
            ClassifierStrategy::Learned(model) => {
                for (label, p) in model.labels().iter().zip(model.probabilities(features)) {
                    let slot = &mut scores[label.index()];
                    *slot = slot.max(p);
                }
                Classification::decide(Some(model.predict(features)), scores, rejection_threshold)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClassifierStrategy::RuleBased(_) => "rule_based",
            ClassifierStrategy::Learned(_) => "learned",
        }
    }
}

/// Running totals over every classification made
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateStatistics {
    pub total: u64,
    pub counts: [u64; 5],
    pub confidence_sum: f64,
    pub transitions: u64,
}

impl StateStatistics {
    pub fn record(&mut self, state: &SmoothedState) {
        self.total += 1;
        self.counts[state.label.index()] += 1;
        self.confidence_sum += state.confidence as f64;
        if state.changed {
            self.transitions += 1;
        }
    }

    /// Share of reports per label
    pub fn distribution(&self) -> Vec<(StateLabel, f32)> {
        StateLabel::ALL
            .iter()
            .map(|&label| {
                let share = if self.total == 0 {
                    0.0
                } else {
                    self.counts[label.index()] as f32 / self.total as f32
                };
                (label, share)
            })
            .collect()
    }

    pub fn average_confidence(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.confidence_sum / self.total as f64) as f32
    }

    /// Reported-state changes per report
    pub fn transition_rate(&self) -> f32 {
        self.transitions as f32 / self.total.max(1) as f32
    }

    pub fn most_common(&self) -> Option<StateLabel> {
        if self.total == 0 {
            return None;
        }
        StateLabel::ALL
            .iter()
            .copied()
            .max_by_key(|label| self.counts[label.index()])
    }
}

/// Raw and smoothed output of one classifier update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierOutput {
    pub raw: Classification,
    pub smoothed: SmoothedState,
}

/// Stateful classifier: strategy, RMS trend history, smoothing, statistics
pub struct StateClassifier {
    strategy: ClassifierStrategy,
    rejection_threshold: f32,
    rms_history: SampleWindow<f32>,
    min_trend_ticks: usize,
    smoother: MajorityVoteSmoother,
    statistics: StateStatistics,
}

impl StateClassifier {
    pub fn new(config: &ClassifierConfig) -> BioResult<Self> {
        let fatigue = &config.thresholds.fatigued;
        let rms_history = SampleWindow::new(fatigue.trend_ticks.max(2))
            .map_err(|e| BioError::configuration("classifier", e.to_string()))?;

        Ok(Self {
            strategy: ClassifierStrategy::from_config(config)?,
            rejection_threshold: config.rejection_threshold,
            rms_history,
            min_trend_ticks: fatigue.min_trend_ticks.max(2),
            smoother: MajorityVoteSmoother::new(&config.smoothing)?,
            statistics: StateStatistics::default(),
        })
    }

    /// Raw classification of one vector, recording its RMS in the trend history
    pub fn classify(&mut self, features: &FeatureVector) -> Classification {
        if features.emg_rms.is_finite() {
            self.rms_history.push(features.emg_rms);
        }
        let trend = self.rms_trend();
        self.strategy
            .classify(features, trend, self.rejection_threshold)
    }

    /// Classify and smooth; refuses to run without a calibrated normalizer
    pub fn update(
        &mut self,
        features: &FeatureVector,
        normalizer: &StreamingNormalizer,
    ) -> BioResult<ClassifierOutput> {
        if !normalizer.is_calibrated() {
            return Err(BioError::NotCalibrated);
        }

        let raw = self.classify(features);
        let smoothed = self.smoother.update(raw.label, raw.confidence);
        self.statistics.record(&smoothed);

        debug!(
            raw = %raw.label,
            raw_confidence = raw.confidence,
            rejected = raw.rejected,
            state = %smoothed.label,
            "Classified"
        );
        if smoothed.changed {
            info!(
                state = %smoothed.label,
                confidence = smoothed.confidence,
                "State transition"
            );
        }

        Ok(ClassifierOutput { raw, smoothed })
    }

    /// Slope of RMS per tick over the trailing history
    pub fn rms_trend(&self) -> Option<f32> {
        if self.rms_history.len() < self.min_trend_ticks {
            return None;
        }
        Some(least_squares_slope(self.rms_history.iter().copied()))
    }

    pub fn current_state(&self) -> StateLabel {
        self.smoother.current()
    }

    pub fn transition_count(&self) -> u64 {
        self.smoother.transition_count()
    }

    pub fn statistics(&self) -> &StateStatistics {
        &self.statistics
    }

    pub fn strategy(&self) -> &ClassifierStrategy {
        &self.strategy
    }

    pub fn reset(&mut self) {
        self.rms_history.clear();
        self.smoother.reset();
        self.statistics = StateStatistics::default();
    }
}
