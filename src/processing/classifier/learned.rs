//! Softmax linear model as an alternative classification strategy

use crate::config::constants::features::FEATURE_DIMENSION;
use crate::config::{validate_linear_model, LinearModelConfig};
use crate::error::{BioError, BioResult};
use crate::processing::features::FeatureVector;
use crate::types::StateLabel;

/// Linear scores per label turned into probabilities with a softmax
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    labels: Vec<StateLabel>,
    weights: Vec<[f32; FEATURE_DIMENSION]>,
    bias: Vec<f32>,
}

impl LinearModel {
    pub fn from_config(config: &LinearModelConfig) -> BioResult<Self> {
        let errors = validate_linear_model(config);
        if !errors.is_empty() {
            return Err(BioError::configuration("linear_model", errors.join("; ")));
        }

        let mut weights = Vec::with_capacity(config.weights.len());
        for row in &config.weights {
            let mut fixed = [0.0; FEATURE_DIMENSION];
            fixed.copy_from_slice(row);
            weights.push(fixed);
        }

        Ok(Self {
            labels: config.labels.clone(),
            weights,
            bias: config.bias.clone(),
        })
    }

    pub fn labels(&self) -> &[StateLabel] {
        &self.labels
    }

    /// Probability per configured label, in configuration order
    pub fn probabilities(&self, features: &FeatureVector) -> Vec<f32> {
        let x = features.as_array();
        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(&x).map(|(w, v)| w * v).sum::<f32>() + b)
            .collect();

        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if !max.is_finite() {
            return vec![0.0; logits.len()];
        }
        let exp: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exp.iter().sum();
        exp.iter()
            .map(|e| e / total)
            .map(|p| if p.is_finite() { p } else { 0.0 })
            .collect()
    }

    /// Most probable label and its probability
    pub fn predict(&self, features: &FeatureVector) -> (StateLabel, f32) {
        self.labels
            .iter()
            .copied()
            .zip(self.probabilities(features))
            .fold((StateLabel::Neutral, 0.0), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(rms: f32, gsr: f32) -> FeatureVector {
        FeatureVector {
            emg_rms: rms,
            emg_zero_crossing_rate: 0.5,
            emg_median_frequency: 0.2,
            gsr_mean: gsr,
            gsr_slope: 0.0,
            emg_samples: 256,
            gsr_samples: 250,
            low_confidence: false,
        }
    }

    fn model() -> LinearModel {
        LinearModel::from_config(&LinearModelConfig {
            labels: vec![StateLabel::Relaxed, StateLabel::Stressed],
            weights: vec![
                vec![-10.0, 0.0, 0.0, -10.0, 0.0],
                vec![10.0, 0.0, 0.0, 10.0, 0.0],
            ],
            bias: vec![5.0, -5.0],
        })
        .unwrap()
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let probs = model().probabilities(&features(0.2, 0.3));
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_predicts_by_weight_direction() {
        let model = model();
        assert_eq!(model.predict(&features(0.0, 0.0)).0, StateLabel::Relaxed);
        let (label, p) = model.predict(&features(0.5, 1.0));
        assert_eq!(label, StateLabel::Stressed);
        assert!(p > 0.99);
    }

    #[test]
    fn test_rejects_bad_shape() {
        let config = LinearModelConfig {
            labels: vec![StateLabel::Relaxed],
            weights: vec![vec![1.0; 3]],
            bias: vec![0.0],
        };
        assert!(matches!(
            LinearModel::from_config(&config),
            Err(BioError::Configuration { .. })
        ));
    }

    #[test]
    fn test_non_finite_features_give_zero_probabilities() {
        let probs = model().probabilities(&features(f32::NAN, 0.1));
        assert!(probs.iter().all(|&p| p == 0.0));
        assert_eq!(model().predict(&features(f32::NAN, 0.1)), (StateLabel::Neutral, 0.0));
    }
}
