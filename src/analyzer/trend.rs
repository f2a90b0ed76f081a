use crate::analyzer::regression::{TrendModel, build_model};
use crate::analyzer::series::{decode_records, require_fields};
use crate::model::{
    AnalysisError, AnalysisResult, MarketDataSnapshot, ModelCapability, Prediction, TrendFit,
    TrendRecord,
};
use crate::observer::Observer;
use crate::utils::date_ordinal;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;

const COMPONENT: &str = "trend_analyzer";

pub const DEFAULT_TEST_RATIO: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

/// Index partition produced by [`train_test_split`].
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Seeded shuffle split. The held-out share is `ceil(n * test_ratio)`, so any
/// non-empty input keeps at least one point back.
pub fn train_test_split(n: usize, test_ratio: f64, seed: u64) -> Split {
    let held_out = ((n as f64) * test_ratio).ceil() as usize;
    let held_out = held_out.min(n);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(held_out);
    Split {
        train,
        test: indices,
    }
}

/// Fits revenue against date on a training subset and predicts the held-out dates.
pub struct TrendAnalyzer {
    capability: ModelCapability,
    test_ratio: f64,
    seed: u64,
    observer: Arc<dyn Observer>,
}

impl TrendAnalyzer {
    pub fn new(
        capability: ModelCapability,
        test_ratio: f64,
        seed: u64,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            capability,
            test_ratio,
            seed,
            observer,
        }
    }

    pub fn analyze(&self, snapshot: &MarketDataSnapshot) -> Result<AnalysisResult, AnalysisError> {
        let result = require_fields(snapshot)
            .and_then(|()| build_model(self.capability))
            .and_then(|mut model| self.analyze_with(snapshot, model.as_mut()));
        self.report(&result);
        result
    }

    /// Runs the analysis against a caller-supplied model instance.
    pub fn analyze_with(
        &self,
        snapshot: &MarketDataSnapshot,
        model: &mut dyn TrendModel,
    ) -> Result<AnalysisResult, AnalysisError> {
        require_fields(snapshot)?;
        let records = decode_records(snapshot)?;
        self.fit_and_predict(&records, model)
    }

    fn fit_and_predict(
        &self,
        records: &[TrendRecord],
        model: &mut dyn TrendModel,
    ) -> Result<AnalysisResult, AnalysisError> {
        let split = train_test_split(records.len(), self.test_ratio, self.seed);

        let train_x: Vec<f64> = split.train.iter().map(|&i| date_ordinal(records[i].date)).collect();
        let train_y: Vec<f64> = split.train.iter().map(|&i| records[i].revenue).collect();
        model.fit(&train_x, &train_y)?;

        let (slope, intercept) = model
            .params()
            .ok_or_else(|| AnalysisError::Fit("model reported no parameters after fit".into()))?;

        let mut held_out: Vec<&TrendRecord> = split.test.iter().map(|&i| &records[i]).collect();
        held_out.sort_by_key(|r| r.date);
        let test_x: Vec<f64> = held_out.iter().map(|r| date_ordinal(r.date)).collect();
        let predicted = model.predict(&test_x)?;

        let predictions = held_out
            .iter()
            .zip(predicted)
            .map(|(record, predicted_revenue)| Prediction {
                date: record.date,
                predicted_revenue,
            })
            .collect();

        let mut training_dates: Vec<_> = split.train.iter().map(|&i| records[i].date).collect();
        training_dates.sort();

        Ok(AnalysisResult {
            predictions,
            training_dates,
            fit: TrendFit {
                slope_per_day: slope,
                intercept,
                baseline_revenue: train_y.iter().sum::<f64>() / train_y.len() as f64,
                training_samples: train_y.len(),
            },
        })
    }

    fn report(&self, result: &Result<AnalysisResult, AnalysisError>) {
        match result {
            Ok(analysis) => self.observer.success(
                COMPONENT,
                &format!(
                    "Market trend analysis completed successfully ({} held-out predictions)",
                    analysis.predictions.len()
                ),
            ),
            Err(e) => self
                .observer
                .failure(COMPONENT, &format!("Market trend analysis failed: {}", e)),
        }
    }
}
