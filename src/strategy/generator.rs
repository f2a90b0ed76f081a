use crate::model::{AnalysisResult, Strategy};
use crate::utils::round2;

pub const DEFAULT_FLAT_BAND_PCT: f64 = 1.0;

/// Days used to express the fitted slope as a monthly change.
const HORIZON_DAYS: f64 = 30.0;
/// Trend signals beyond this many percent stop raising expected ROI.
const MAX_SIGNAL_PCT: f64 = 50.0;
/// Forecast uplift above which a premium tier is proposed.
const PREMIUM_UPLIFT_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Rising,
    Flat,
    Falling,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendOutlook {
    pub direction: TrendDirection,
    /// Fitted slope over a month, relative to the training baseline.
    pub monthly_change_pct: f64,
    /// Mean held-out prediction relative to the training baseline.
    pub forecast_uplift_pct: f64,
}

/// Turns the shape of a forecast into candidate strategies. Holds only
/// thresholds, so output depends on the analysis alone.
#[derive(Debug, Clone)]
pub struct StrategyGenerator {
    flat_band_pct: f64,
}

impl Default for StrategyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_FLAT_BAND_PCT)
    }
}

impl StrategyGenerator {
    pub fn new(flat_band_pct: f64) -> Self {
        Self {
            flat_band_pct: flat_band_pct.abs(),
        }
    }

    /// `None` when the analysis carries nothing usable: no predictions, or a
    /// baseline that cannot anchor a percentage.
    pub fn outlook(&self, analysis: &AnalysisResult) -> Option<TrendOutlook> {
        let baseline = analysis.fit.baseline_revenue;
        if analysis.predictions.is_empty() || !baseline.is_finite() || baseline <= 0.0 {
            return None;
        }

        let monthly_change_pct = analysis.fit.slope_per_day * HORIZON_DAYS / baseline * 100.0;
        let mean_prediction = analysis
            .predictions
            .iter()
            .map(|p| p.predicted_revenue)
            .sum::<f64>()
            / analysis.predictions.len() as f64;
        let forecast_uplift_pct = (mean_prediction - baseline) / baseline * 100.0;

        if !monthly_change_pct.is_finite() || !forecast_uplift_pct.is_finite() {
            return None;
        }

        let direction = if monthly_change_pct > self.flat_band_pct {
            TrendDirection::Rising
        } else if monthly_change_pct < -self.flat_band_pct {
            TrendDirection::Falling
        } else {
            TrendDirection::Flat
        };

        Some(TrendOutlook {
            direction,
            monthly_change_pct,
            forecast_uplift_pct,
        })
    }

    /// Empty output means "no recommendation", not a failure.
    pub fn generate(&self, analysis: &AnalysisResult) -> Vec<Strategy> {
        let Some(outlook) = self.outlook(analysis) else {
            return Vec::new();
        };
        let momentum = outlook.monthly_change_pct.abs().min(MAX_SIGNAL_PCT);
        let uplift = outlook.forecast_uplift_pct.abs().min(MAX_SIGNAL_PCT);

        match outlook.direction {
            TrendDirection::Rising => {
                let mut strategies = vec![
                    strategy(
                        "launch_product_line",
                        "Launch new product line to capture growing demand",
                        20.0 + 0.3 * momentum,
                    ),
                    strategy(
                        "increase_ad_spend",
                        "Increase advertising spend by 10%",
                        15.0 + 0.2 * momentum,
                    ),
                ];
                if outlook.forecast_uplift_pct > PREMIUM_UPLIFT_PCT {
                    strategies.push(strategy(
                        "premium_tier",
                        "Introduce a premium pricing tier",
                        12.0 + 0.1 * uplift,
                    ));
                }
                strategies
            }
            TrendDirection::Flat => vec![
                strategy(
                    "bundle_pricing",
                    "Bundle complementary products at a discount",
                    10.0,
                ),
                strategy(
                    "loyalty_program",
                    "Start a loyalty program for repeat customers",
                    8.0,
                ),
            ],
            TrendDirection::Falling => vec![
                strategy(
                    "retention_campaign",
                    "Run a retention discount campaign for at-risk customers",
                    10.0 + 0.2 * momentum,
                ),
                strategy(
                    "cut_acquisition_spend",
                    "Cut advertising spend by 10% until demand recovers",
                    5.0 + 0.1 * momentum,
                ),
            ],
        }
    }
}

fn strategy(name: &str, description: &str, expected_roi: f64) -> Strategy {
    Strategy {
        name: name.to_string(),
        description: description.to_string(),
        expected_roi: round2(expected_roi),
    }
}
