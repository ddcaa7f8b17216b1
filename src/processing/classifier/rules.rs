//! Threshold rules and their confidence margins

use crate::config::constants::classifier::BOUNDARY_SCORE;
use crate::config::ThresholdTable;
use crate::processing::features::FeatureVector;
use crate::types::StateLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One threshold test on a feature value.
///
/// The margin is the signed distance from the threshold, scaled by the
/// distance from the threshold to the far end of the feature's range:
/// 1 at the extreme, 0 on the boundary, negative when the test fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    /// `value <= threshold` on a range starting at `range_low`
    AtMost {
        value: f32,
        threshold: f32,
        range_low: f32,
    },
    /// `value >= threshold` on a range ending at `range_high`
    AtLeast {
        value: f32,
        threshold: f32,
        range_high: f32,
    },
    /// `min <= value <= max`, scaled by half the band
    Within { value: f32, min: f32, max: f32 },
}

impl Condition {
    pub fn margin(&self) -> f32 {
        let margin = match *self {
            Condition::AtMost {
                value,
                threshold,
                range_low,
            } => scaled(threshold - value, threshold - range_low),
            Condition::AtLeast {
                value,
                threshold,
                range_high,
            } => scaled(value - threshold, range_high - threshold),
            Condition::Within { value, min, max } => {
                scaled((value - min).min(max - value), (max - min) / 2.0)
            }
        };
        if margin.is_nan() {
            -1.0
        } else {
            margin
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            Condition::AtMost { value, .. }
            | Condition::AtLeast { value, .. }
            | Condition::Within { value, .. } => value,
        }
    }

    pub fn bound(&self) -> Bound {
        match *self {
            Condition::AtMost { threshold, .. } => Bound::AtMost(threshold),
            Condition::AtLeast { threshold, .. } => Bound::AtLeast(threshold),
            Condition::Within { min, max, .. } => Bound::Within(min, max),
        }
    }
}

/// Feature a rule condition tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFeature {
    EmgRms,
    ZeroCrossingRate,
    GsrMean,
    /// Negated RMS trend, per tick
    RmsDecline,
}

impl RuleFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleFeature::EmgRms => "emg_rms",
            RuleFeature::ZeroCrossingRate => "zcr",
            RuleFeature::GsrMean => "gsr_mean",
            RuleFeature::RmsDecline => "rms_decline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    AtMost(f32),
    AtLeast(f32),
    Within(f32, f32),
}

/// The condition of a rule with the least headroom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitingCondition {
    pub rule: StateLabel,
    pub feature: RuleFeature,
    pub value: f32,
    pub bound: Bound,
    pub margin: f32,
}

impl fmt::Display for LimitingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.feature.as_str();
        let holds = self.margin >= 0.0;
        match (self.bound, holds) {
            (Bound::AtMost(t), true) => write!(f, "{} {:.3} <= {:.3}", name, self.value, t),
            (Bound::AtMost(t), false) => write!(f, "{} {:.3} above {:.3}", name, self.value, t),
            (Bound::AtLeast(t), true) => write!(f, "{} {:.3} >= {:.3}", name, self.value, t),
            (Bound::AtLeast(t), false) => write!(f, "{} {:.3} below {:.3}", name, self.value, t),
            (Bound::Within(lo, hi), true) => {
                write!(f, "{} {:.3} in {:.3}..{:.3}", name, self.value, lo, hi)
            }
            (Bound::Within(lo, hi), false) => {
                write!(f, "{} {:.3} outside {:.3}..{:.3}", name, self.value, lo, hi)
            }
        }
    }
}

fn scaled(distance: f32, extent: f32) -> f32 {
    if extent > 0.0 {
        distance / extent
    } else if distance >= 0.0 {
        // Threshold sits on the range edge: passing is a full-strength match
        1.0
    } else {
        -1.0
    }
}

/// Outcome of one rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleOutcome {
    pub label: StateLabel,
    /// Smallest condition margin
    pub margin: f32,
    /// `0.5 + 0.5 * margin`, clipped to [0, 1]
    pub score: f32,
    /// Condition that set `margin`; `None` when the rule could not be evaluated
    pub limiting: Option<LimitingCondition>,
}

impl RuleOutcome {
    fn from_conditions(label: StateLabel, conditions: &[(RuleFeature, Condition)]) -> Self {
        let limiting = conditions
            .iter()
            .map(|(feature, condition)| LimitingCondition {
                rule: label,
                feature: *feature,
                value: condition.value(),
                bound: condition.bound(),
                margin: condition.margin(),
            })
            .min_by(|a, b| a.margin.total_cmp(&b.margin));
        let margin = limiting.map_or(f32::INFINITY, |l| l.margin);
        Self {
            label,
            margin,
            score: (BOUNDARY_SCORE + BOUNDARY_SCORE * margin).clamp(0.0, 1.0),
            limiting,
        }
    }

    fn unavailable(label: StateLabel) -> Self {
        Self {
            label,
            margin: -1.0,
            score: 0.0,
            limiting: None,
        }
    }

    pub fn matched(&self) -> bool {
        self.margin >= 0.0
    }
}

/// Evaluate every rule in precedence order.
///
/// `rms_trend` is the least-squares slope of recent RMS values per tick, or
/// `None` while the history is too short to fit one; the fatigue rule never
/// matches without it.
pub fn evaluate_rules(
    table: &ThresholdTable,
    features: &FeatureVector,
    rms_trend: Option<f32>,
) -> [RuleOutcome; 4] {
    let rms = features.emg_rms;
    let zcr = features.emg_zero_crossing_rate;
    let gsr = features.gsr_mean;
    let rms_top = table.rms_full_scale;

    let relaxed = RuleOutcome::from_conditions(
        StateLabel::Relaxed,
        &[
            (
                RuleFeature::EmgRms,
                Condition::AtMost {
                    value: rms,
                    threshold: table.relaxed.rms_max,
                    range_low: 0.0,
                },
            ),
            (
                RuleFeature::GsrMean,
                Condition::AtMost {
                    value: gsr,
                    threshold: table.relaxed.gsr_max,
                    range_low: 0.0,
                },
            ),
        ],
    );

    let focused = RuleOutcome::from_conditions(
        StateLabel::Focused,
        &[
            (
                RuleFeature::EmgRms,
                Condition::Within {
                    value: rms,
                    min: table.focused.rms_min,
                    max: table.focused.rms_max,
                },
            ),
            (
                RuleFeature::GsrMean,
                Condition::Within {
                    value: gsr,
                    min: table.focused.gsr_min,
                    max: table.focused.gsr_max,
                },
            ),
            (
                RuleFeature::ZeroCrossingRate,
                Condition::AtLeast {
                    value: zcr,
                    threshold: table.focused.zcr_min,
                    range_high: 1.0,
                },
            ),
        ],
    );

    let stressed = RuleOutcome::from_conditions(
        StateLabel::Stressed,
        &[
            (
                RuleFeature::EmgRms,
                Condition::AtLeast {
                    value: rms,
                    threshold: table.stressed.rms_min,
                    range_high: rms_top,
                },
            ),
            (
                RuleFeature::GsrMean,
                Condition::AtLeast {
                    value: gsr,
                    threshold: table.stressed.gsr_min,
                    range_high: 1.0,
                },
            ),
            (
                RuleFeature::ZeroCrossingRate,
                Condition::AtLeast {
                    value: zcr,
                    threshold: table.stressed.zcr_min,
                    range_high: 1.0,
                },
            ),
        ],
    );

    let fatigue = &table.fatigued;
    let fatigued = match rms_trend {
        Some(slope) => RuleOutcome::from_conditions(
            StateLabel::Fatigued,
            &[
                (
                    RuleFeature::RmsDecline,
                    Condition::AtLeast {
                        value: -slope,
                        threshold: fatigue.min_decline,
                        range_high: fatigue.decline_full_scale,
                    },
                ),
                (
                    RuleFeature::ZeroCrossingRate,
                    Condition::AtMost {
                        value: zcr,
                        threshold: fatigue.zcr_max,
                        range_low: 0.0,
                    },
                ),
            ],
        ),
        None => RuleOutcome::unavailable(StateLabel::Fatigued),
    };

    [relaxed, focused, stressed, fatigued]
}
