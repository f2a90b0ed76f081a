use crate::model::{ScoredStrategy, Strategy};
use serde::Deserialize;
use std::cmp::Ordering;

/// Linear scoring weights. The defaults mirror the current placeholder rule
/// `expected_roi + 0.5 * description length`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub roi_weight: f64,
    pub description_weight: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            roi_weight: 1.0,
            description_weight: 0.5,
        }
    }
}

impl ScoringPolicy {
    pub fn roi_only() -> Self {
        Self {
            roi_weight: 1.0,
            description_weight: 0.0,
        }
    }
}

pub struct StrategyScorer {
    policy: ScoringPolicy,
}

impl StrategyScorer {
    /// Negative or non-finite weights are treated as 0 so the score never
    /// decreases as expected ROI grows.
    pub fn new(policy: ScoringPolicy) -> Self {
        let sanitize = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        Self {
            policy: ScoringPolicy {
                roi_weight: sanitize(policy.roi_weight),
                description_weight: sanitize(policy.description_weight),
            },
        }
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    pub fn score(&self, strategy: &Strategy) -> f64 {
        let roi = if strategy.expected_roi.is_finite() {
            strategy.expected_roi
        } else {
            0.0
        };
        let richness = strategy.description.trim().chars().count() as f64;
        let score = self.policy.roi_weight * roi + self.policy.description_weight * richness;
        if score.is_finite() { score.max(0.0) } else { 0.0 }
    }

    /// Highest score first; ties fall back to name for a stable order.
    pub fn rank(&self, strategies: &[Strategy]) -> Vec<ScoredStrategy> {
        let mut scored: Vec<ScoredStrategy> = strategies
            .iter()
            .map(|s| ScoredStrategy {
                strategy: s.clone(),
                score: self.score(s),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.strategy.name.cmp(&b.strategy.name))
        });
        scored
    }
}

impl Default for StrategyScorer {
    fn default() -> Self {
        Self::new(ScoringPolicy::default())
    }
}
