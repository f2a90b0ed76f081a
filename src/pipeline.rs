use crate::analyzer::TrendAnalyzer;
use crate::config::AppConfig;
use crate::model::{
    AnalysisError, AnalysisResult, CustomerSummary, ImplementationRecord, ScoredStrategy,
};
use crate::observer::Observer;
use crate::provider::{DataCollector, MarketDataSource};
use crate::storage::StateStore;
use crate::strategy::{StrategyGenerator, StrategyScorer};
use crate::tracker::{ImplementationTracker, TrackOutcome};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const COMPONENT: &str = "pipeline";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Analyze,
    Track,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Analyze => "analyze",
            Stage::Track => "track",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no market data available")]
    NoData,
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(
        "tracking {strategy_id} failed: {reason} ({} earlier strategies already recorded)",
        recorded.len()
    )]
    Tracking {
        strategy_id: String,
        reason: String,
        /// Records written earlier in the same run; they stay in the store.
        recorded: Vec<ImplementationRecord>,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::NoData => Stage::Fetch,
            PipelineError::Analysis(_) => Stage::Analyze,
            PipelineError::Tracking { .. } => Stage::Track,
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub customers: Option<CustomerSummary>,
    pub analysis: AnalysisResult,
    pub ranked: Vec<ScoredStrategy>,
    pub tracked: Vec<TrackOutcome>,
}

/// Runs fetch → analyze → generate → score → track, strictly in order.
pub struct Pipeline {
    source: Arc<dyn MarketDataSource>,
    analyzer: TrendAnalyzer,
    generator: StrategyGenerator,
    scorer: StrategyScorer,
    tracker: ImplementationTracker,
    top_n: usize,
    observer: Arc<dyn Observer>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        analyzer: TrendAnalyzer,
        generator: StrategyGenerator,
        scorer: StrategyScorer,
        tracker: ImplementationTracker,
        top_n: usize,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            source,
            analyzer,
            generator,
            scorer,
            tracker,
            top_n,
            observer,
        }
    }

    /// Wires every component against one shared store.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn StateStore>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self::new(
            Arc::new(DataCollector::new(store.clone(), observer.clone())),
            TrendAnalyzer::new(
                config.analysis.model,
                config.analysis.test_ratio,
                config.analysis.seed,
                observer.clone(),
            ),
            StrategyGenerator::new(config.generation.flat_band_pct),
            StrategyScorer::new(config.scoring),
            ImplementationTracker::new(store, observer.clone()),
            config.selection.top_n,
            observer,
        )
    }

    pub fn tracker(&self) -> &ImplementationTracker {
        &self.tracker
    }

    pub async fn run(&self, run_id: &str) -> Result<RunReport, PipelineError> {
        let result = self.run_stages(run_id).await;
        match &result {
            Ok(report) => self.observer.success(
                COMPONENT,
                &format!(
                    "Run {} finished: {} strategies ranked, {} tracked",
                    run_id,
                    report.ranked.len(),
                    report.tracked.len()
                ),
            ),
            Err(e) => self.observer.failure(
                COMPONENT,
                &format!("Run {} halted at {} stage: {}", run_id, e.stage(), e),
            ),
        }
        result
    }

    async fn run_stages(&self, run_id: &str) -> Result<RunReport, PipelineError> {
        let snapshot = self
            .source
            .fetch_market_trends()
            .await
            .ok_or(PipelineError::NoData)?;

        // Customer data only enriches the report; its absence is not fatal.
        let customers = self
            .source
            .collect_customer_data()
            .await
            .map(|records| CustomerSummary::from_records(&records));

        let analysis = self.analyzer.analyze(&snapshot)?;

        let strategies = self.generator.generate(&analysis);
        if strategies.is_empty() {
            info!(run_id, "No viable strategy derived from analysis");
        }
        let ranked = self.scorer.rank(&strategies);
        for (rank, scored) in ranked.iter().enumerate() {
            debug!(
                rank = rank + 1,
                name = %scored.strategy.name,
                expected_roi = scored.strategy.expected_roi,
                score = scored.score,
                "Ranked strategy"
            );
        }

        let mut tracked = Vec::new();
        for scored in ranked.iter().take(self.top_n) {
            let strategy_id = format!("{}_{}", scored.strategy.name, run_id);
            let outcome = self.tracker.track(&strategy_id).await;
            let reason = match outcome {
                TrackOutcome::Recorded(record) => {
                    tracked.push(TrackOutcome::Recorded(record));
                    continue;
                }
                TrackOutcome::AlreadyRecorded(existing) => {
                    format!("already recorded as {}", existing.status)
                }
                TrackOutcome::Failed { reason, .. } => reason,
            };
            return Err(PipelineError::Tracking {
                strategy_id,
                reason,
                recorded: tracked.iter().map(|o| o.record().clone()).collect(),
            });
        }

        Ok(RunReport {
            run_id: run_id.to_string(),
            customers,
            analysis,
            ranked,
            tracked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImplementationStatus, ModelCapability, StoreError};
    use crate::observer::NoopObserver;
    use crate::observer::recording::RecordingObserver;
    use crate::storage::{CUSTOMER_DATA_KEY, MARKET_DATA_KEY, MemoryStore, Namespace};
    use crate::strategy::ScoringPolicy;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DATES: &str = r#"["2024-01-01","2024-01-02","2024-01-03","2024-01-04","2024-01-05"]"#;
    const REVENUE: &str = "[100, 110, 120, 130, 140]";

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            Namespace::MarketData,
            MARKET_DATA_KEY,
            &[("date", DATES), ("revenue", REVENUE)],
        );
        store
    }

    fn pipeline(store: Arc<MemoryStore>, config: &AppConfig) -> Pipeline {
        Pipeline::from_config(config, store, Arc::new(NoopObserver))
    }

    #[tokio::test]
    async fn five_day_series_runs_end_to_end() {
        let store = seeded_store();
        store.seed(Namespace::MarketData, CUSTOMER_DATA_KEY, &[("1", "100"), ("2", "200"), ("3", "300")]);
        let pipeline = pipeline(store.clone(), &AppConfig::default());

        let report = pipeline.run("r1").await.unwrap();

        assert_eq!(report.analysis.predictions.len(), 1);
        let p = &report.analysis.predictions[0];
        let days = (p.date - chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).num_days();
        assert!((p.predicted_revenue - (100.0 + 10.0 * days as f64)).abs() < 1e-6);

        assert!(!report.ranked.is_empty());
        for pair in report.ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }

        let customers = report.customers.unwrap();
        assert_eq!(customers.customers, 3);
        assert_eq!(customers.mean_purchase, 200.0);

        assert_eq!(report.tracked.len(), 1);
        let top = &report.ranked[0].strategy.name;
        let record = pipeline
            .tracker()
            .implementation_record(&format!("{}_r1", top))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, ImplementationStatus::Implemented);
    }

    #[tokio::test]
    async fn roi_only_policy_ranks_higher_roi_first() {
        let config = AppConfig {
            scoring: ScoringPolicy::roi_only(),
            ..AppConfig::default()
        };
        let report = pipeline(seeded_store(), &config).run("r1").await.unwrap();
        for pair in report.ranked.windows(2) {
            assert!(pair[0].strategy.expected_roi >= pair[1].strategy.expected_roi);
        }
    }

    #[tokio::test]
    async fn missing_market_data_halts_at_fetch() {
        let observer = Arc::new(RecordingObserver::default());
        let store = Arc::new(MemoryStore::new());
        let pipeline = Pipeline::from_config(&AppConfig::default(), store, observer.clone());

        let err = pipeline.run("r1").await.unwrap_err();
        assert_eq!(err.stage(), Stage::Fetch);
        assert_eq!(observer.failures(COMPONENT), 1);
        assert_eq!(observer.successes("trend_analyzer"), 0);
    }

    #[tokio::test]
    async fn schema_error_halts_before_tracking() {
        let store = Arc::new(MemoryStore::new());
        store.seed(Namespace::MarketData, MARKET_DATA_KEY, &[("revenue", REVENUE)]);
        let err = pipeline(store.clone(), &AppConfig::default()).run("r1").await.unwrap_err();

        assert_eq!(err.stage(), Stage::Analyze);
        assert!(matches!(err, PipelineError::Analysis(AnalysisError::Schema(_))));
    }

    #[tokio::test]
    async fn unimplemented_model_is_an_analyze_failure() {
        let mut config = AppConfig::default();
        config.analysis.model = ModelCapability::CustomerSegmentation;
        let err = pipeline(seeded_store(), &config).run("r1").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Analysis(AnalysisError::CapabilityUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn rejected_tracking_write_halts_at_track() {
        let store = seeded_store();
        store.reject_writes(true);
        let err = pipeline(store, &AppConfig::default()).run("r1").await.unwrap_err();
        assert_eq!(err.stage(), Stage::Track);
    }

    /// Accepts the first `allowed` writes, then rejects the rest.
    struct FailingAfter {
        inner: MemoryStore,
        allowed: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl StateStore for FailingAfter {
        async fn hgetall(
            &self,
            namespace: Namespace,
            key: &str,
        ) -> Result<HashMap<String, String>, StoreError> {
            self.inner.hgetall(namespace, key).await
        }

        async fn hset(
            &self,
            namespace: Namespace,
            key: &str,
            fields: &[(&str, &str)],
        ) -> Result<(), StoreError> {
            let left = self.allowed.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StoreError::WriteRejected(key.to_string()));
            }
            self.allowed.store(left - 1, Ordering::SeqCst);
            self.inner.hset(namespace, key, fields).await
        }
    }

    #[tokio::test]
    async fn partial_tracking_failure_lists_records_already_written() {
        let inner = MemoryStore::new();
        inner.seed(
            Namespace::MarketData,
            MARKET_DATA_KEY,
            &[("date", DATES), ("revenue", REVENUE)],
        );
        let store = Arc::new(FailingAfter {
            inner,
            allowed: AtomicUsize::new(1),
        });
        let mut config = AppConfig::default();
        config.selection.top_n = 3;
        let pipeline = Pipeline::from_config(&config, store, Arc::new(NoopObserver));

        let err = pipeline.run("r1").await.unwrap_err();
        let PipelineError::Tracking { strategy_id, recorded, .. } = &err else {
            panic!("expected tracking failure, got {err:?}");
        };
        assert_eq!(recorded.len(), 1);
        assert_ne!(&recorded[0].strategy_id, strategy_id);
        assert!(err.to_string().contains("1 earlier strategies already recorded"));

        let stored = pipeline
            .tracker()
            .implementation_record(&recorded[0].strategy_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ImplementationStatus::Implemented);
        assert!(pipeline.tracker().implementation_record(strategy_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rerunning_with_same_run_id_is_rejected() {
        let pipeline = pipeline(seeded_store(), &AppConfig::default());
        pipeline.run("r1").await.unwrap();

        let err = pipeline.run("r1").await.unwrap_err();
        assert!(matches!(err, PipelineError::Tracking { .. }));
        assert!(pipeline.run("r2").await.is_ok());
    }

    #[tokio::test]
    async fn flat_zero_revenue_series_tracks_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            Namespace::MarketData,
            MARKET_DATA_KEY,
            &[("date", DATES), ("revenue", "[0, 0, 0, 0, 0]")],
        );
        let report = pipeline(store, &AppConfig::default()).run("r1").await.unwrap();
        assert!(report.ranked.is_empty());
        assert!(report.tracked.is_empty());
    }
}
